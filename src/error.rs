use std::fmt;

/// Ways an expression can be shaped wrongly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// A special form received the wrong number or shape of operands.
    Form(&'static str),
    /// `car`/`cdr` of an atom other than nil.
    NotAPair(&'static str),
    /// A scope chain link or entry is not a pair.
    Scope,
    /// A closure is not `(closure scope formals body)`.
    Closure,
    /// A formal parameter list is improper or holds a non-atom.
    ParameterList,
    /// Formals and actuals differ in length.
    ArityMismatch,
    /// No `cond` clause had a true test.
    NoMatchingClause,
    /// A value that is not an expression was evaluated.
    Expression,
}

/// Errors that can end an evaluation. None of them is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LispError {
    /// Atom has no binding in the active scope chain.
    UnboundSymbol(String),

    /// Operand list or structure has the wrong arity or shape.
    Malformed(Malformed),

    /// Operator position evaluated to something that is not a builtin or closure.
    NotCallable(String),

    /// Reader error.
    Parse(String),

    /// Arena exhausted even after collection.
    OutOfMemory,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::Form(form) => write!(f, "bad operands to '{}'", form),
            Malformed::NotAPair(form) => write!(f, "'{}' of a non-nil atom", form),
            Malformed::Scope => write!(f, "malformed scope"),
            Malformed::Closure => write!(f, "malformed closure"),
            Malformed::ParameterList => write!(f, "malformed parameter list"),
            Malformed::ArityMismatch => write!(f, "wrong number of arguments"),
            Malformed::NoMatchingClause => write!(f, "no cond clause matched"),
            Malformed::Expression => write!(f, "not an expression"),
        }
    }
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LispError::UnboundSymbol(name) => write!(f, "Error: unbound symbol '{}'", name),
            LispError::Malformed(what) => write!(f, "Error: {}", what),
            LispError::NotCallable(what) => write!(f, "Error: not callable: {}", what),
            LispError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LispError::OutOfMemory => write!(f, "Error: out of memory"),
        }
    }
}

impl std::error::Error for LispError {}

impl From<Malformed> for LispError {
    fn from(m: Malformed) -> Self {
        LispError::Malformed(m)
    }
}

pub type LispResult<T> = Result<T, LispError>;
