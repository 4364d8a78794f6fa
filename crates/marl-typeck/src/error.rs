//! Type error types.
//!
//! Every error carries a byte span pointing at the expression whose
//! constraint failed, so diagnostics can label the offending source.
//! Inference propagates errors immediately; there is no accumulation and
//! no recovery.

use std::fmt;

use marl_common::span::Span;

use crate::ty::{Ty, TyVar};

/// A type error raised by the inferencer or the constraint solver.
#[derive(Clone, Debug)]
pub enum TypeError {
    /// A variable is used but not defined in scope.
    UndefinedVariable { name: String, span: Span },
    /// Two types that should be equal are not.
    Mismatch { left: Ty, right: Ty, span: Span },
    /// A type variable appears in its own binding (infinite type).
    ///
    /// Example: `(g) => g(g)` requires `t0 = (t0) => t1`.
    InfiniteType { var: TyVar, ty: Ty, span: Span },
    /// Function used with the wrong number of arguments.
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    /// A record is required to carry fields it does not have.
    MissingFields {
        fields: Vec<String>,
        ty: Ty,
        span: Span,
    },
    /// A field access on a type that has no such field (or is not a
    /// record at all).
    NoSuchField { ty: Ty, field: String, span: Span },
    /// A type expression in an annotation that names no type.
    UnknownTypeExpr { name: String, span: Span },
}

impl TypeError {
    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            TypeError::UndefinedVariable { span, .. }
            | TypeError::Mismatch { span, .. }
            | TypeError::InfiniteType { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::MissingFields { span, .. }
            | TypeError::NoSuchField { span, .. }
            | TypeError::UnknownTypeExpr { span, .. } => *span,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UndefinedVariable { name, .. } => {
                write!(f, "undefined variable `{}`", name)
            }
            TypeError::Mismatch { left, right, .. } => {
                write!(f, "cannot unify `{}` and `{}`", left, right)
            }
            TypeError::InfiniteType { var, ty, .. } => {
                write!(f, "occurs check failed: `t{}` occurs in `{}`", var.0, ty)
            }
            TypeError::ArityMismatch {
                expected, found, ..
            } => {
                write!(
                    f,
                    "function arity mismatch: expected {} arguments, found {}",
                    expected, found
                )
            }
            TypeError::MissingFields { fields, ty, .. } => {
                write!(
                    f,
                    "missing field{} {} in `{}`",
                    if fields.len() == 1 { "" } else { "s" },
                    fields
                        .iter()
                        .map(|n| format!("`{}`", n))
                        .collect::<Vec<_>>()
                        .join(", "),
                    ty
                )
            }
            TypeError::NoSuchField { ty, field, .. } => {
                write!(f, "type `{}` has no field `{}`", ty, field)
            }
            TypeError::UnknownTypeExpr { name, .. } => {
                write!(f, "unknown type expression `{}`", name)
            }
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let span = Span::new(0, 1);
        assert_eq!(
            TypeError::UndefinedVariable {
                name: "x".into(),
                span
            }
            .to_string(),
            "undefined variable `x`"
        );
        assert_eq!(
            TypeError::Mismatch {
                left: Ty::Number,
                right: Ty::Str,
                span
            }
            .to_string(),
            "cannot unify `number` and `string`"
        );
        assert_eq!(
            TypeError::ArityMismatch {
                expected: 2,
                found: 1,
                span
            }
            .to_string(),
            "function arity mismatch: expected 2 arguments, found 1"
        );
        assert_eq!(
            TypeError::MissingFields {
                fields: vec!["x".into(), "y".into()],
                ty: Ty::record::<_, String>([]),
                span
            }
            .to_string(),
            "missing fields `x`, `y` in `{ }`"
        );
    }
}
