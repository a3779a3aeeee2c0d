use rustc_hash::FxHashMap;

use crate::value::{AtomId, Value};

/// Interned atom table. Each unique spelling maps to a unique AtomId, so
/// atom comparison is an id comparison. Atoms are never collected.
pub struct AtomTable {
    name_to_id: FxHashMap<String, AtomId>,
    id_to_name: Vec<String>,
}

/// Well-known atom IDs, pre-interned at startup.
/// These must match the order of interning in AtomTable::new().
pub mod sym {
    use crate::value::AtomId;

    pub const T: AtomId = AtomId(0);
    pub const CLOSURE: AtomId = AtomId(1);
    pub const QUOTE: AtomId = AtomId(2);
    pub const COND: AtomId = AtomId(3);
    pub const LAMBDA: AtomId = AtomId(4);
    pub const EQ: AtomId = AtomId(5);
    pub const CONS: AtomId = AtomId(6);
    pub const CAR: AtomId = AtomId(7);
    pub const CDR: AtomId = AtomId(8);
    pub const LET: AtomId = AtomId(9);
    /// Terminates the top-level scope chain. Never reachable by spelling.
    pub const TOP_LEVEL: AtomId = AtomId(10);
}

const NIL_NAME: &str = "nil";
const TOP_LEVEL_NAME: &str = "#<top-level>";

impl AtomTable {
    /// Create a new table with all well-known atoms pre-interned.
    /// The order MUST match the constants in the `sym` module above.
    pub fn new() -> Self {
        let names = [
            "t", "closure", "quote", "cond", "lambda", "eq", "cons", "car", "cdr", "let",
        ];

        let mut table = AtomTable {
            name_to_id: FxHashMap::default(),
            id_to_name: Vec::with_capacity(names.len()),
        };
        for name in names {
            table.intern(name);
        }
        table.id_to_name.push(TOP_LEVEL_NAME.to_string());
        table
    }

    /// Intern a spelling. `"nil"` always yields `Value::Nil`; any other
    /// spelling yields the same atom on every call.
    pub fn intern(&mut self, name: &str) -> Value {
        if name == NIL_NAME {
            return Value::Nil;
        }
        if let Some(&id) = self.name_to_id.get(name) {
            return Value::Atom(id);
        }
        let id = AtomId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        Value::Atom(id)
    }

    /// Look up an atom's spelling by its ID.
    pub fn name(&self, id: AtomId) -> &str {
        self.id_to_name
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("#<poison>")
    }

    /// Look up an atom by spelling, without interning.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if name == NIL_NAME {
            return Some(Value::Nil);
        }
        self.name_to_id.get(name).copied().map(Value::Atom)
    }

    /// Total number of interned atoms (`nil` excluded).
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_canonical() {
        let mut atoms = AtomTable::new();
        let a = atoms.intern("apple");
        let b = atoms.intern("apple");
        assert_eq!(a, b);
        assert_ne!(a, atoms.intern("pear"));
    }

    #[test]
    fn nil_spelling_maps_to_singleton() {
        let mut atoms = AtomTable::new();
        assert_eq!(atoms.intern("nil"), Value::Nil);
        atoms.intern("x");
        assert_eq!(atoms.intern("nil"), Value::Nil);
        assert_eq!(atoms.lookup("nil"), Some(Value::Nil));
    }

    #[test]
    fn well_known_atoms_match_sym_ids() {
        let mut atoms = AtomTable::new();
        assert_eq!(atoms.intern("t"), Value::Atom(sym::T));
        assert_eq!(atoms.intern("closure"), Value::Atom(sym::CLOSURE));
        assert_eq!(atoms.intern("let"), Value::Atom(sym::LET));
        assert_eq!(atoms.name(sym::QUOTE), "quote");
    }

    #[test]
    fn table_only_grows_on_first_occurrence() {
        let mut atoms = AtomTable::new();
        let before = atoms.count();
        atoms.intern("fresh");
        atoms.intern("fresh");
        atoms.intern("nil");
        assert_eq!(atoms.count(), before + 1);
        assert_eq!(atoms.lookup("missing"), None);
    }

    #[test]
    fn top_level_marker_cannot_be_spelled() {
        let mut atoms = AtomTable::new();
        assert_eq!(atoms.name(sym::TOP_LEVEL), "#<top-level>");
        assert_eq!(atoms.lookup("#<top-level>"), None);
        assert_ne!(atoms.intern("#<top-level>"), Value::Atom(sym::TOP_LEVEL));
    }
}
