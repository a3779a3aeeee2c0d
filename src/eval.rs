use crate::atoms::{sym, AtomTable};
use crate::error::{LispError, LispResult, Malformed};
use crate::heap::Heap;
use crate::printer;
use crate::reader::Reader;
use crate::roots::RootGuard;
use crate::scope::Scope;
use crate::value::{CellId, Value};

/// Default arena size in cells.
pub const DEFAULT_CAPACITY: usize = 512;

/// The evaluation context.
/// All interpreter state lives here so GC can find roots.
pub struct Machine {
    pub heap: Heap,
    pub atoms: AtomTable,
}

impl Machine {
    pub fn new(heap_capacity: usize) -> Self {
        Machine {
            heap: Heap::new(heap_capacity),
            atoms: AtomTable::new(),
        }
    }

    /// Pin `val` as a collector root until the returned guard is dropped.
    pub fn pin(&mut self, val: Value) -> RootGuard<'_> {
        RootGuard::new(self, val)
    }

    /// Current depth of the root stack.
    pub fn root_count(&self) -> usize {
        self.heap.root_count()
    }

    /// Intern a spelling.
    pub fn intern(&mut self, name: &str) -> Value {
        self.atoms.intern(name)
    }

    /// Parse exactly one expression from `text`.
    pub fn parse(&mut self, text: &str) -> LispResult<Value> {
        let mut reader = Reader::new(text);
        let expr = reader
            .read(self)?
            .ok_or_else(|| LispError::Parse("empty input".into()))?;
        if !reader.at_end() {
            return Err(LispError::Parse(format!(
                "unexpected input after expression at offset {}",
                reader.position()
            )));
        }
        Ok(expr)
    }

    /// Parse and evaluate one expression.
    pub fn eval_str(&mut self, text: &str) -> LispResult<Value> {
        let expr = self.parse(text)?;
        self.eval(expr)
    }

    /// Evaluate `expr` in the top-level scope.
    pub fn eval(&mut self, expr: Value) -> LispResult<Value> {
        self.eval_in(expr, Scope::top())
    }

    /// Render a value as text.
    pub fn print(&self, val: Value) -> String {
        printer::print_val(val, &self.heap, &self.atoms)
    }

    /// Evaluate `expr` in `scope`. The caller keeps `scope` pinned; `expr`
    /// need not be.
    pub fn eval_in(&mut self, expr: Value, scope: Scope) -> LispResult<Value> {
        match expr {
            Value::Nil => Ok(expr),
            Value::Atom(id) if id == sym::T => Ok(expr),
            Value::Atom(id) => scope
                .lookup(id, &self.heap)?
                .ok_or_else(|| LispError::UnboundSymbol(self.atoms.name(id).to_string())),
            Value::Pair(form) => {
                let mut pinned = self.pin(expr);
                let head = pinned.heap.car(form);
                let args = pinned.heap.cdr(form);
                let op = pinned.eval_in(head, scope)?;
                match op {
                    Value::Builtin(builtin) => pinned.apply_builtin(builtin, args, scope),
                    Value::Pair(func) if pinned.heap.car(func) == Value::Atom(sym::CLOSURE) => {
                        pinned.apply_closure(func, args, scope)
                    }
                    _ => Err(LispError::NotCallable(pinned.print(op))),
                }
            }
            Value::Builtin(_) => Err(Malformed::Expression.into()),
        }
    }

    /// Apply `(closure scope formals body)` to the unevaluated `actuals`,
    /// each evaluated in the caller's `scope`.
    fn apply_closure(&mut self, func: CellId, actuals: Value, scope: Scope) -> LispResult<Value> {
        let rest = self.heap.cdr(func);
        let [captured, formals, body] = self
            .operands::<3>(rest, "closure")
            .map_err(|_| LispError::Malformed(Malformed::Closure))?;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "apply closure formals={} actuals={}",
                self.print(formals),
                self.print(actuals)
            );
        }

        // `rest` holds the captured scope, the formals and the body; the
        // closure itself may have been a temporary.
        let mut pinned_func = self.pin(rest);
        let mut new_scope = Scope::from_value(captured);
        let mut pinned = pinned_func.pin(new_scope.value());

        let mut formals = formals;
        let mut actuals = actuals;
        loop {
            match (formals, actuals) {
                (Value::Nil, Value::Nil) => return pinned.eval_in(body, new_scope),
                (Value::Pair(f), Value::Pair(a)) => {
                    let ident = pinned.heap.car(f);
                    if !ident.is_atom() {
                        return Err(Malformed::ParameterList.into());
                    }
                    let expr = pinned.heap.car(a);
                    let val = pinned.eval_in(expr, scope)?;
                    new_scope = new_scope.extend(ident, val, &mut pinned.heap)?;
                    pinned.repin(new_scope.value());

                    formals = pinned.heap.cdr(f);
                    actuals = pinned.heap.cdr(a);
                }
                (Value::Pair(_) | Value::Nil, Value::Pair(_) | Value::Nil) => {
                    return Err(Malformed::ArityMismatch.into())
                }
                (Value::Pair(_) | Value::Nil, _) => {
                    return Err(Malformed::Form("closure application").into())
                }
                _ => return Err(Malformed::ParameterList.into()),
            }
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
