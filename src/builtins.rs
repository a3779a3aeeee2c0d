use crate::atoms::sym;
use crate::error::{LispError, LispResult, Malformed};
use crate::eval::Machine;
use crate::scope::Scope;
use crate::value::{AtomId, CellId, Value};

/// The native special forms. Each receives its operands unevaluated and
/// decides for itself which of them to evaluate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Builtin {
    Cond,
    Lambda,
    Eq,
    Cons,
    Car,
    Cdr,
    Quote,
    Let,
}

impl Builtin {
    /// Top-level binding order, outermost first.
    pub const ALL: [Builtin; 8] = [
        Builtin::Cond,
        Builtin::Lambda,
        Builtin::Eq,
        Builtin::Cons,
        Builtin::Car,
        Builtin::Cdr,
        Builtin::Quote,
        Builtin::Let,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cond => "cond",
            Builtin::Lambda => "lambda",
            Builtin::Eq => "eq",
            Builtin::Cons => "cons",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Quote => "quote",
            Builtin::Let => "let",
        }
    }

    pub fn atom(self) -> AtomId {
        match self {
            Builtin::Cond => sym::COND,
            Builtin::Lambda => sym::LAMBDA,
            Builtin::Eq => sym::EQ,
            Builtin::Cons => sym::CONS,
            Builtin::Car => sym::CAR,
            Builtin::Cdr => sym::CDR,
            Builtin::Quote => sym::QUOTE,
            Builtin::Let => sym::LET,
        }
    }

    /// The builtin bound to `ident` at top level, innermost first.
    pub fn for_atom(ident: AtomId) -> Option<Builtin> {
        Builtin::ALL.iter().rev().copied().find(|b| b.atom() == ident)
    }
}

impl Machine {
    /// Run a special form. `args` is the unevaluated operand list; it is
    /// reachable from the pinned call expression, and `scope` is pinned.
    pub(crate) fn apply_builtin(
        &mut self,
        builtin: Builtin,
        args: Value,
        scope: Scope,
    ) -> LispResult<Value> {
        match builtin {
            Builtin::Quote => {
                let [operand] = self.operands::<1>(args, "quote")?;
                Ok(operand)
            }
            Builtin::Car => {
                let x = self.eval_pair_operand(args, "car", scope)?;
                Ok(x.map_or(Value::Nil, |id| self.heap.car(id)))
            }
            Builtin::Cdr => {
                let x = self.eval_pair_operand(args, "cdr", scope)?;
                Ok(x.map_or(Value::Nil, |id| self.heap.cdr(id)))
            }
            Builtin::Cons => {
                let (a, b) = self.eval_two(args, "cons", scope)?;
                self.heap.cons(a, b)
            }
            Builtin::Eq => {
                let (a, b) = self.eval_two(args, "eq", scope)?;
                Ok(if a == b { Value::Atom(sym::T) } else { Value::Nil })
            }
            Builtin::Lambda => self.form_lambda(args, scope),
            Builtin::Cond => self.form_cond(args, scope),
            Builtin::Let => self.form_let(args, scope),
        }
    }

    /// Destructure an exact proper list of `N` elements.
    pub(crate) fn operands<const N: usize>(
        &self,
        list: Value,
        form: &'static str,
    ) -> LispResult<[Value; N]> {
        let mut out = [Value::Nil; N];
        let mut current = list;
        for slot in out.iter_mut() {
            let id = current.as_pair().ok_or(Malformed::Form(form))?;
            *slot = self.heap.car(id);
            current = self.heap.cdr(id);
        }
        if !current.is_nil() {
            return Err(Malformed::Form(form).into());
        }
        Ok(out)
    }

    /// Shared by car and cdr: evaluate the single operand, which must be
    /// nil or a pair. Nil comes back as None.
    fn eval_pair_operand(
        &mut self,
        args: Value,
        form: &'static str,
        scope: Scope,
    ) -> LispResult<Option<CellId>> {
        let [operand] = self.operands::<1>(args, form)?;
        match self.eval_in(operand, scope)? {
            Value::Nil => Ok(None),
            Value::Pair(id) => Ok(Some(id)),
            _ => Err(Malformed::NotAPair(form).into()),
        }
    }

    /// Evaluate exactly two operands left to right, keeping the first
    /// pinned while the second is computed.
    fn eval_two(&mut self, args: Value, form: &'static str, scope: Scope) -> LispResult<(Value, Value)> {
        let [first, second] = self.operands::<2>(args, form)?;
        let a = self.eval_in(first, scope)?;
        let mut pinned = self.pin(a);
        let b = pinned.eval_in(second, scope)?;
        Ok((a, b))
    }

    /// (lambda formals body) -> (closure scope formals body)
    fn form_lambda(&mut self, args: Value, scope: Scope) -> LispResult<Value> {
        self.operands::<2>(args, "lambda")?;
        let captured = self.heap.cons(scope.value(), args)?;
        self.heap.cons(Value::Atom(sym::CLOSURE), captured)
    }

    /// (cond (test result)...) evaluates the result of the first true test.
    fn form_cond(&mut self, args: Value, scope: Scope) -> LispResult<Value> {
        let mut clauses = args;
        loop {
            let id = match clauses {
                Value::Pair(id) => id,
                Value::Nil => return Err(Malformed::NoMatchingClause.into()),
                _ => return Err(Malformed::Form("cond").into()),
            };
            let clause = self.heap.car(id);
            clauses = self.heap.cdr(id);

            let [test, result] = self.operands::<2>(clause, "cond")?;
            if !self.eval_in(test, scope)?.is_nil() {
                return self.eval_in(result, scope);
            }
        }
    }

    /// (let ((ident expr)...) body). Each expr sees the bindings before it.
    fn form_let(&mut self, args: Value, scope: Scope) -> LispResult<Value> {
        let [bindings, body] = self.operands::<2>(args, "let")?;

        let mut scope = scope;
        let mut pinned = self.pin(scope.value());
        let mut remaining = bindings;
        while let Value::Pair(id) = remaining {
            let binding = pinned.heap.car(id);
            let [ident, expr] = pinned.operands::<2>(binding, "let")?;
            if !ident.is_atom() {
                return Err(Malformed::Form("let").into());
            }

            let val = pinned.eval_in(expr, scope)?;
            scope = scope.extend(ident, val, &mut pinned.heap)?;
            pinned.repin(scope.value());
            remaining = pinned.heap.cdr(id);
        }
        if !remaining.is_nil() {
            return Err(LispError::Malformed(Malformed::Form("let")));
        }
        pinned.eval_in(body, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_builtin_is_let() {
        assert_eq!(Builtin::ALL.last(), Some(&Builtin::Let));
        assert_eq!(Builtin::for_atom(sym::QUOTE), Some(Builtin::Quote));
        assert_eq!(Builtin::for_atom(sym::T), None);
    }

    #[test]
    fn operands_requires_exact_length() {
        let mut machine = Machine::new(16);
        let two = machine.parse("(a b)").unwrap();
        assert!(machine.operands::<2>(two, "test").is_ok());
        assert!(machine.operands::<1>(two, "test").is_err());
        assert!(machine.operands::<3>(two, "test").is_err());
        let dotted = machine.parse("(a . b)").unwrap();
        assert!(machine.operands::<1>(dotted, "test").is_err());
    }
}
