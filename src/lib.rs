//! # rlisp
//!
//! A minimal symbolic-expression evaluator. All list structure lives in a
//! fixed-capacity arena of pair cells; when the arena runs out it runs a
//! mark-sweep collection over an explicit root stack.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Reader → cells in Heap → Machine::eval → Value
//! ```
//!
//! 1. [`reader`] turns text into cells, interning atoms in [`atoms`].
//! 2. [`eval`] walks cells, resolving atoms through a [`scope::Scope`] and
//!    dispatching to [`builtins`] or closures.
//! 3. [`heap`] owns the cells and collects them; [`roots`] pins
//!    intermediate values across allocations.
//!
//! ```
//! use rlisp::eval::Machine;
//!
//! let mut machine = Machine::new(256);
//! let val = machine.eval_str("(cons 'a (cons 'b nil))").unwrap();
//! assert_eq!(machine.print(val), "(a b)");
//! ```

pub mod atoms;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod heap;
pub mod printer;
pub mod reader;
pub mod roots;
pub mod scope;
pub mod value;
