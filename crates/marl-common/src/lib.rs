//! Shared source-model types for the Marl interpreter.
//!
//! Everything downstream of the lexer speaks in terms of these types:
//! byte-offset [`span::Span`]s, the [`token::Token`] vocabulary, and
//! [`error::LexError`] for malformed input. Positions stay byte-based
//! through the whole pipeline; [`span::line_col`] derives a 1-based
//! (line, column) pair at the moment an error is rendered.

pub mod error;
pub mod span;
pub mod token;
