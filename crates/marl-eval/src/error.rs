//! Runtime error types.
//!
//! Raised by the evaluator and the built-in implementations. Propagation
//! is immediate; the evaluator never catches. Every error carries the
//! span of the expression that raised it.

use std::fmt;

use marl_common::span::Span;

/// A runtime error raised during evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeError {
    /// A name with no binding in any frame.
    UndefinedVariable { name: String, span: Span },
    /// A binding read before its initializer finished evaluating.
    UninitializedBinding { name: String, span: Span },
    /// A call with the wrong number of arguments.
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    /// An operator or built-in applied to operands of the wrong shape.
    TypeMismatch { message: String, span: Span },
    /// Division by zero.
    DivisionByZero { span: Span },
    /// Member access on a value that has no fields.
    PropertyOnNonRecord { kind: &'static str, field: String, span: Span },
    /// Member access on a record that lacks the field.
    MissingField { field: String, span: Span },
    /// Array index outside `0..len` (or not an integer).
    IndexOutOfBounds { index: f64, len: usize, span: Span },
    /// Array index that is not a number.
    IndexNotNumber { kind: &'static str, span: Span },
    /// Index access on a value that is neither array nor dictionary.
    NotIndexable { kind: &'static str, span: Span },
    /// Call of a value that is not a function.
    NotCallable { kind: &'static str, span: Span },
    /// A match expression where no case matched the discriminant.
    NoMatchingCase { span: Span },
}

impl RuntimeError {
    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::UninitializedBinding { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::PropertyOnNonRecord { span, .. }
            | RuntimeError::MissingField { span, .. }
            | RuntimeError::IndexOutOfBounds { span, .. }
            | RuntimeError::IndexNotNumber { span, .. }
            | RuntimeError::NotIndexable { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::NoMatchingCase { span } => *span,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedVariable { name, .. } => {
                write!(f, "undefined variable `{}`", name)
            }
            RuntimeError::UninitializedBinding { name, .. } => {
                write!(f, "`{}` referenced before initialization", name)
            }
            RuntimeError::ArityMismatch {
                expected, found, ..
            } => {
                write!(
                    f,
                    "arity mismatch: expected {} arguments, found {}",
                    expected, found
                )
            }
            RuntimeError::TypeMismatch { message, .. } => write!(f, "{}", message),
            RuntimeError::DivisionByZero { .. } => write!(f, "division by zero"),
            RuntimeError::PropertyOnNonRecord { kind, field, .. } => {
                write!(f, "cannot access field `{}` on {}", field, kind)
            }
            RuntimeError::MissingField { field, .. } => {
                write!(f, "record has no field `{}`", field)
            }
            RuntimeError::IndexOutOfBounds { index, len, .. } => {
                write!(
                    f,
                    "index {} out of bounds for array of length {}",
                    index, len
                )
            }
            RuntimeError::IndexNotNumber { kind, .. } => {
                write!(f, "array index must be a number, found {}", kind)
            }
            RuntimeError::NotIndexable { kind, .. } => {
                write!(f, "cannot index into {}", kind)
            }
            RuntimeError::NotCallable { kind, .. } => {
                write!(f, "cannot call {}", kind)
            }
            RuntimeError::NoMatchingCase { .. } => {
                write!(f, "no pattern matched the value")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
