//! Match pattern parsing.
//!
//! Patterns are flat: a literal (number, string, boolean, null), an
//! identifier that binds the discriminant, or the `_` wildcard.

use marl_common::token::TokenKind;

use crate::ast::{Pattern, PatternKind};
use crate::error::ParseError;

use super::expressions::decode_string;
use super::Parser;

/// Parse one match pattern.
pub(crate) fn parse_pattern(p: &mut Parser) -> Result<Pattern, ParseError> {
    match p.current() {
        TokenKind::Underscore => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Wildcard,
                span: tok.span,
            })
        }
        TokenKind::Number => {
            let tok = p.advance();
            let value: f64 = tok
                .text(p.source)
                .parse()
                .map_err(|_| ParseError::new("invalid number literal", tok.span))?;
            Ok(Pattern {
                kind: PatternKind::Number(value),
                span: tok.span,
            })
        }
        TokenKind::Str => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Str(decode_string(tok.text(p.source))),
                span: tok.span,
            })
        }
        TokenKind::True => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Bool(true),
                span: tok.span,
            })
        }
        TokenKind::False => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Bool(false),
                span: tok.span,
            })
        }
        TokenKind::Null => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Null,
                span: tok.span,
            })
        }
        TokenKind::Ident => {
            let tok = p.advance();
            Ok(Pattern {
                kind: PatternKind::Ident(tok.text(p.source).to_string()),
                span: tok.span,
            })
        }
        _ => Err(p.error_here("unknown pattern")),
    }
}
