//! Marl evaluator: a closure-based tree walker.
//!
//! Executes a parsed (and, per the API contract, type-checked) program
//! against lexically scoped environment frames. Features:
//!
//! - closures capturing their defining environment
//! - mutually recursive `let` groups via pending-slot sentinels
//! - first-match pattern matching with guards
//! - deep structural equality and a fixed truthiness rule
//! - a pure built-in catalog mirroring the type checker's schemes
//!
//! # Architecture
//!
//! - [`value`]: runtime values (numbers, strings, containers, closures)
//! - [`env`]: the frame chain with innermost-write/outward-read scoping
//! - [`interp`]: the evaluator proper
//! - [`builtins`]: native implementations of the built-in catalog
//! - [`error`]: runtime errors

pub mod builtins;
pub mod env;
pub mod error;
pub mod interp;
pub mod value;

pub use env::Env;
pub use error::RuntimeError;
pub use interp::{eval_expr, evaluate};
pub use value::{Builtin, Closure, Value};
