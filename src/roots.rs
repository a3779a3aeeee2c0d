use std::ops::{Deref, DerefMut};

use crate::eval::Machine;
use crate::value::Value;

/// Values that must survive the next collection, in LIFO order.
///
/// The stack is only mutated through [`RootGuard`], which pops on drop, so
/// pushes and pops stay balanced on every exit path.
pub struct RootStack {
    roots: Vec<Value>,
}

impl RootStack {
    pub fn new() -> Self {
        RootStack { roots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Value {
        self.roots[index]
    }

    fn push(&mut self, val: Value) {
        self.roots.push(val);
    }

    fn pop(&mut self) {
        self.roots.pop();
    }

    fn replace_top(&mut self, val: Value) {
        match self.roots.last_mut() {
            Some(top) => *top = val,
            None => self.roots.push(val),
        }
    }
}

impl Default for RootStack {
    fn default() -> Self {
        Self::new()
    }
}

/// A pinned value. While the guard lives, its value is a collector root.
///
/// The guard borrows the whole machine and derefs to it, so work that
/// depends on the pin is done through the guard:
///
/// ```
/// # use rlisp::eval::Machine;
/// let mut machine = Machine::new(64);
/// let list = machine.parse("(a b c)").unwrap();
/// let mut pinned = machine.pin(list);
/// pinned.eval_str("'(x y z)").unwrap();
/// drop(pinned);
/// assert_eq!(machine.root_count(), 0);
/// ```
pub struct RootGuard<'a> {
    machine: &'a mut Machine,
}

impl<'a> RootGuard<'a> {
    pub(crate) fn new(machine: &'a mut Machine, val: Value) -> Self {
        machine.heap.roots.push(val);
        RootGuard { machine }
    }

    /// Replace the pinned value. The root stack does not grow.
    pub fn repin(&mut self, val: Value) {
        self.machine.heap.roots.replace_top(val);
    }
}

impl Deref for RootGuard<'_> {
    type Target = Machine;

    fn deref(&self) -> &Machine {
        self.machine
    }
}

impl DerefMut for RootGuard<'_> {
    fn deref_mut(&mut self) -> &mut Machine {
        self.machine
    }
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        self.machine.heap.roots.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LispResult;

    #[test]
    fn guards_pop_in_lifo_order() {
        let mut machine = Machine::new(8);
        {
            let mut outer = machine.pin(Value::Nil);
            assert_eq!(outer.root_count(), 1);
            {
                let inner = outer.pin(Value::Nil);
                assert_eq!(inner.root_count(), 2);
            }
            assert_eq!(outer.root_count(), 1);
        }
        assert_eq!(machine.root_count(), 0);
    }

    #[test]
    fn repin_replaces_rather_than_stacks() {
        let mut machine = Machine::new(8);
        let a = machine.heap.cons(Value::Nil, Value::Nil).expect("alloc");
        let mut guard = machine.pin(Value::Nil);
        for _ in 0..5 {
            guard.repin(a);
        }
        assert_eq!(guard.root_count(), 1);
        assert_eq!(guard.heap.roots.get(0), a);
    }

    #[test]
    fn early_return_still_pops() {
        fn fails(machine: &mut Machine) -> LispResult<()> {
            let mut guard = machine.pin(Value::Nil);
            guard.eval_str("(car 'a)")?;
            Ok(())
        }

        let mut machine = Machine::new(16);
        assert!(fails(&mut machine).is_err());
        assert_eq!(machine.root_count(), 0);
    }

    #[test]
    fn same_value_may_be_pushed_twice() {
        let mut machine = Machine::new(8);
        let mut once = machine.pin(Value::Nil);
        let twice = once.pin(Value::Nil);
        assert_eq!(twice.root_count(), 2);
    }
}
