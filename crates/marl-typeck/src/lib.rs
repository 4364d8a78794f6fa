//! Marl type checker: Hindley-Milner inference with row-polymorphic
//! records.
//!
//! Assigns types to a parsed Marl program by generating equality and
//! deferred field-access constraints, then solving them by unification
//! with substitution composition. Extensions over plain HM:
//!
//! - row polymorphism for records (open rows with row-variable tails)
//! - directional subtyping at call sites and annotated bindings
//!   (contravariant parameters, covariant returns, record width)
//! - mutually recursive binding groups typed as a unit
//! - a deliberate occurs-check exception for record types
//!
//! # Architecture
//!
//! - [`ty`]: type representation (Ty, TyVar, RowVar, Row, Scheme)
//! - [`subst`]: substitutions, composition, free-variable queries
//! - [`env`]: scope-marked type environment
//! - [`unify`]: unification with row unification and the occurs check
//! - [`infer`]: constraint generation, the solver, and the entry points
//! - [`builtins`]: built-in scheme registration
//! - [`error`]: type errors
//! - [`diagnostics`]: ariadne rendering of errors against source text

pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod infer;
pub mod subst;
pub mod ty;
pub mod unify;

pub use env::TypeEnv;
pub use error::TypeError;
pub use infer::{infer_and_solve, infer_expression, InferCtx};
pub use ty::{Row, RowVar, Scheme, Ty, TyVar};

/// Build the base type environment containing every built-in scheme.
///
/// This is the default `Γ₀` that [`infer_and_solve`] starts from when no
/// environment is supplied; it is exposed so callers can extend it
/// before inference or query built-in types directly.
pub fn base_env() -> TypeEnv {
    let mut ctx = InferCtx::new();
    let mut env = TypeEnv::new();
    builtins::register_builtins(&mut ctx, &mut env);
    env
}
