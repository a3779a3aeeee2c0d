use std::fmt;

use crate::builtins::Builtin;

/// Unique identifier for an interned atom.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(pub u32);

/// Index into the cell arena. This is the GC handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub u32);

/// Written into both slots of every free cell.
pub const POISON: Value = Value::Atom(AtomId(0xCCCC_CCCC));

/// A reference to a cell. Copy semantics; pair data lives in the arena.
///
/// `Nil`, atoms and builtins are immediates: they never occupy an arena
/// slot, so the collector treats them as leaves.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Atom(AtomId),
    Pair(CellId),
    Builtin(Builtin),
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_pair(self) -> Option<CellId> {
        match self {
            Value::Pair(id) => Some(id),
            _ => None,
        }
    }

    /// True for `nil` and interned atoms.
    pub fn is_atom(self) -> bool {
        matches!(self, Value::Nil | Value::Atom(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Atom(id) => write!(f, "Atom({})", id.0),
            Value::Pair(id) => write!(f, "Pair({})", id.0),
            Value::Builtin(b) => write!(f, "Builtin({})", b.name()),
        }
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomId({})", self.0)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}
