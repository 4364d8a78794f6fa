//! Type expression parsing.
//!
//! Covers the annotation grammar: primitive names, `[T]` / `Array<T>`,
//! `[K : V]` / `Dict<K, V>`, `(T1, ..., Tn) => U`, and named type
//! variables. Primitive names are contextual identifiers, not keywords
//! (except `null` and `undefined`, which arrive as keyword tokens).

use marl_common::token::TokenKind;

use crate::ast::{TypeExpr, TypeExprKind};
use crate::error::ParseError;

use super::Parser;

/// Parse one type expression.
pub(crate) fn parse_type(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    match p.current() {
        // `[T]` or `[K : V]`
        TokenKind::LBracket => {
            let open = p.advance();
            let first = parse_type(p)?;
            if p.eat(TokenKind::Colon) {
                let value = parse_type(p)?;
                let close = p.expect(TokenKind::RBracket, "`]` to close dictionary type")?;
                return Ok(TypeExpr {
                    kind: TypeExprKind::Dict(Box::new(first), Box::new(value)),
                    span: open.span.cover(close.span),
                });
            }
            let close = p.expect(TokenKind::RBracket, "`]` to close array type")?;
            Ok(TypeExpr {
                kind: TypeExprKind::Array(Box::new(first)),
                span: open.span.cover(close.span),
            })
        }

        // `(T1, ..., Tn) => U`
        TokenKind::LParen => {
            let open = p.advance();
            let mut params = Vec::new();
            if !p.at(TokenKind::RParen) {
                loop {
                    params.push(parse_type(p)?);
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            p.expect(TokenKind::RParen, "`)` to close parameter types")?;
            p.expect(TokenKind::FatArrow, "`=>` in function type")?;
            let ret = parse_type(p)?;
            let span = open.span.cover(ret.span);
            Ok(TypeExpr {
                kind: TypeExprKind::Func(params, Box::new(ret)),
                span,
            })
        }

        // `null` / `undefined` are keywords even in type position.
        TokenKind::Null => {
            let tok = p.advance();
            Ok(TypeExpr {
                kind: TypeExprKind::Null,
                span: tok.span,
            })
        }
        TokenKind::Undefined => {
            let tok = p.advance();
            Ok(TypeExpr {
                kind: TypeExprKind::Undefined,
                span: tok.span,
            })
        }

        // Primitive names, `Array<T>`, `Dict<K, V>`, or a type variable.
        TokenKind::Ident => parse_named_type(p),

        _ => Err(p.error_here("expected type")),
    }
}

fn parse_named_type(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    let tok = p.advance();
    let name = tok.text(p.source);
    let kind = match name {
        "number" => TypeExprKind::Number,
        "string" => TypeExprKind::Str,
        "boolean" => TypeExprKind::Bool,
        "unit" => TypeExprKind::Unit,
        "Array" if p.at(TokenKind::Lt) => {
            p.advance(); // <
            let elem = parse_type(p)?;
            let close = p.expect(TokenKind::Gt, "`>` to close `Array<...>`")?;
            return Ok(TypeExpr {
                kind: TypeExprKind::Array(Box::new(elem)),
                span: tok.span.cover(close.span),
            });
        }
        "Dict" if p.at(TokenKind::Lt) => {
            p.advance(); // <
            let key = parse_type(p)?;
            p.expect(TokenKind::Comma, "`,` between dictionary key and value types")?;
            let value = parse_type(p)?;
            let close = p.expect(TokenKind::Gt, "`>` to close `Dict<...>`")?;
            return Ok(TypeExpr {
                kind: TypeExprKind::Dict(Box::new(key), Box::new(value)),
                span: tok.span.cover(close.span),
            });
        }
        other => TypeExprKind::Name(other.to_string()),
    };
    Ok(TypeExpr {
        kind,
        span: tok.span,
    })
}
