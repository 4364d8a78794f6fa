//! Parse error type for the Marl parser.

use std::fmt;

use marl_common::span::Span;

/// A parse failure: what went wrong and where, plus any secondary notes
/// pointing back at related source (the opening brace of an unclosed
/// block, for example).
///
/// Lexical errors surface through this type as well; the parser rejects
/// the lexer's error tokens before the grammar runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Source location where the error was detected.
    pub span: Span,
    /// Secondary (message, span) pairs giving context.
    pub notes: Vec<(String, Span)>,
}

impl ParseError {
    /// A parse error at one location, with no notes.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Attach a contextual note at another location.
    pub fn with_note(mut self, message: impl Into<String>, span: Span) -> Self {
        self.notes.push((message.into(), span));
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for (note, _) in &self.notes {
            write!(f, "; {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_error_has_no_notes() {
        let err = ParseError::new("expected expression", Span::new(5, 10));
        assert_eq!(err.span, Span::new(5, 10));
        assert!(err.notes.is_empty());
        assert_eq!(err.to_string(), "expected expression");
    }

    #[test]
    fn notes_accumulate_and_render() {
        let err = ParseError::new("expected `}` to close block", Span::point(20))
            .with_note("block started here", Span::new(4, 5));
        assert_eq!(err.notes.len(), 1);
        assert_eq!(err.notes[0].1, Span::new(4, 5));
        assert_eq!(
            err.to_string(),
            "expected `}` to close block; block started here"
        );
    }
}
