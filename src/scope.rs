use crate::atoms::sym;
use crate::builtins::Builtin;
use crate::error::{LispResult, Malformed};
use crate::heap::Heap;
use crate::value::{AtomId, Value};

/// A lexical environment.
///
/// Bindings are a chain of in-arena links `((ident . value) . parent)`, so a
/// closure captures its scope just by holding the head link. Only a chain
/// that ends in the `TOP_LEVEL` marker continues into the builtins, which
/// live outside the arena; a chain that ends in `nil` binds nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scope(Value);

impl Scope {
    /// The top level: nothing bound but the builtins.
    pub fn top() -> Self {
        Scope(Value::Atom(sym::TOP_LEVEL))
    }

    /// Reinterpret a value taken out of a closure as a scope.
    pub fn from_value(val: Value) -> Self {
        Scope(val)
    }

    /// The head link, for pinning and closure capture.
    pub fn value(self) -> Value {
        self.0
    }

    /// Bind `ident` to `val` in front of this scope. `ident` is `nil` or an
    /// atom; a `nil` binding is kept but can never be looked up.
    ///
    /// `val` only needs to be reachable for the duration of the call; the
    /// returned scope must be pinned by the caller before further allocation.
    pub fn extend(self, ident: Value, val: Value, heap: &mut Heap) -> LispResult<Scope> {
        debug_assert!(ident.is_atom(), "binding a non-atom {:?}", ident);
        let entry = heap.cons(ident, val)?;
        let link = heap.cons(entry, self.0)?;
        Ok(Scope(link))
    }

    /// Resolve `ident`, innermost binding first. Returns None if unbound.
    pub fn lookup(self, ident: AtomId, heap: &Heap) -> LispResult<Option<Value>> {
        let mut current = self.0;
        loop {
            match current {
                Value::Pair(link) => {
                    let entry = heap.car(link).as_pair().ok_or(Malformed::Scope)?;
                    if heap.car(entry) == Value::Atom(ident) {
                        return Ok(Some(heap.cdr(entry)));
                    }
                    current = heap.cdr(link);
                }
                Value::Atom(sym::TOP_LEVEL) => {
                    return Ok(Builtin::for_atom(ident).map(Value::Builtin))
                }
                Value::Nil => return Ok(None),
                _ => return Err(Malformed::Scope.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LispError;

    #[test]
    fn inner_bindings_shadow_outer() {
        let mut heap = Heap::new(16);
        let x = AtomId(100);
        let outer = Scope::top()
            .extend(Value::Atom(x), Value::Atom(AtomId(1)), &mut heap)
            .unwrap();
        let inner = outer
            .extend(Value::Atom(x), Value::Atom(AtomId(2)), &mut heap)
            .unwrap();
        assert_eq!(inner.lookup(x, &heap).unwrap(), Some(Value::Atom(AtomId(2))));
        assert_eq!(outer.lookup(x, &heap).unwrap(), Some(Value::Atom(AtomId(1))));
    }

    #[test]
    fn builtins_resolve_at_top_level() {
        let heap = Heap::new(1);
        assert_eq!(
            Scope::top().lookup(sym::CAR, &heap).unwrap(),
            Some(Value::Builtin(Builtin::Car))
        );
        assert_eq!(Scope::top().lookup(sym::T, &heap).unwrap(), None);
    }

    #[test]
    fn user_binding_can_shadow_builtin() {
        let mut heap = Heap::new(4);
        let scope = Scope::top()
            .extend(Value::Atom(sym::CAR), Value::Nil, &mut heap)
            .unwrap();
        assert_eq!(scope.lookup(sym::CAR, &heap).unwrap(), Some(Value::Nil));
    }

    #[test]
    fn chains_ending_in_nil_see_no_builtins() {
        let mut heap = Heap::new(4);
        let x = AtomId(100);
        assert_eq!(Scope::from_value(Value::Nil).lookup(sym::CAR, &heap).unwrap(), None);

        let local = Scope::from_value(Value::Nil)
            .extend(Value::Atom(x), Value::Nil, &mut heap)
            .unwrap();
        assert_eq!(local.lookup(x, &heap).unwrap(), Some(Value::Nil));
        assert_eq!(local.lookup(sym::CAR, &heap).unwrap(), None);
    }

    #[test]
    fn nil_bindings_are_never_found() {
        let mut heap = Heap::new(4);
        let scope = Scope::top()
            .extend(Value::Nil, Value::Atom(AtomId(1)), &mut heap)
            .unwrap();
        assert_eq!(scope.lookup(sym::T, &heap).unwrap(), None);
        assert_eq!(
            scope.lookup(sym::QUOTE, &heap).unwrap(),
            Some(Value::Builtin(Builtin::Quote))
        );
    }

    #[test]
    fn malformed_links_are_errors() {
        let mut heap = Heap::new(4);
        let dotted = Scope::from_value(Value::Atom(AtomId(9)));
        assert_eq!(
            dotted.lookup(AtomId(100), &heap),
            Err(LispError::Malformed(Malformed::Scope))
        );

        let bad_entry = heap.cons(Value::Atom(AtomId(9)), Value::Nil).unwrap();
        assert_eq!(
            Scope::from_value(bad_entry).lookup(AtomId(100), &heap),
            Err(LispError::Malformed(Malformed::Scope))
        );
    }
}
