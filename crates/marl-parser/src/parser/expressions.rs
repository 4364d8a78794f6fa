//! Expression parsing for Marl.
//!
//! One function per precedence level, loosest to tightest: logical-or,
//! logical-and, equality, relational, additive, multiplicative, unary,
//! postfix (call/member/index), primary. All binary levels are
//! left-associative; unary `-` and `!` are right-associative.

use std::rc::Rc;

use marl_common::token::TokenKind;

use crate::ast::{
    BinOp, Binding, Expr, ExprKind, FuncLit, LetGroup, MatchCase, Param, UnOp,
};
use crate::error::ParseError;

use super::{patterns, types, Parser};

/// Parse one expression: a `let` group or an operator expression.
pub(crate) fn parse_expr(p: &mut Parser) -> Result<Expr, ParseError> {
    if p.at(TokenKind::Let) {
        parse_let_group(p)
    } else {
        parse_logical_or(p)
    }
}

// ── Let groups ─────────────────────────────────────────────────────────

/// Parse `let binding (, binding)* (and binding (, binding)*)*`.
///
/// Every binding joined by `,` or `and` lands in the same group, so group
/// members may refer to each other (mutual recursion). A separate `let`
/// starts a separate group.
fn parse_let_group(p: &mut Parser) -> Result<Expr, ParseError> {
    let let_span = p.advance().span; // `let`
    let mut bindings = vec![parse_binding(p)?];
    while p.eat(TokenKind::Comma) || p.eat(TokenKind::And) {
        bindings.push(parse_binding(p)?);
    }
    let end = bindings.last().map(|b| b.span).unwrap_or(let_span);
    Ok(Expr::new(
        ExprKind::Let(LetGroup { bindings }),
        let_span.cover(end),
    ))
}

/// Parse `IDENT (: type)? = expr`.
fn parse_binding(p: &mut Parser) -> Result<Binding, ParseError> {
    let name_tok = p.expect(TokenKind::Ident, "an identifier after `let`")?;
    let name = name_tok.text(p.source).to_string();
    let annotation = if p.eat(TokenKind::Colon) {
        Some(types::parse_type(p)?)
    } else {
        None
    };
    p.expect(TokenKind::Eq, "`=` after binding name")?;
    let init = parse_expr(p)?;
    let span = name_tok.span.cover(init.span);
    Ok(Binding {
        name,
        annotation,
        init,
        span,
    })
}

// ── Binary operator ladder ─────────────────────────────────────────────

/// Parse one left-associative binary level: operands come from `next`,
/// operators from `ops`.
fn parse_binary_level(
    p: &mut Parser,
    ops: &[(TokenKind, BinOp)],
    next: fn(&mut Parser) -> Result<Expr, ParseError>,
) -> Result<Expr, ParseError> {
    let mut lhs = next(p)?;
    'level: loop {
        for &(kind, op) in ops {
            if p.at(kind) {
                p.advance();
                let rhs = next(p)?;
                let span = lhs.span.cover(rhs.span);
                lhs = Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                );
                continue 'level;
            }
        }
        break;
    }
    Ok(lhs)
}

fn parse_logical_or(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(p, &[(TokenKind::PipePipe, BinOp::Or)], parse_logical_and)
}

fn parse_logical_and(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(p, &[(TokenKind::AmpAmp, BinOp::And)], parse_equality)
}

fn parse_equality(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(
        p,
        &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::NotEq)],
        parse_relational,
    )
}

fn parse_relational(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(
        p,
        &[
            (TokenKind::Lt, BinOp::Lt),
            (TokenKind::LtEq, BinOp::LtEq),
            (TokenKind::Gt, BinOp::Gt),
            (TokenKind::GtEq, BinOp::GtEq),
        ],
        parse_additive,
    )
}

fn parse_additive(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(
        p,
        &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
        parse_multiplicative,
    )
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_binary_level(
        p,
        &[
            (TokenKind::Star, BinOp::Mul),
            (TokenKind::Slash, BinOp::Div),
            (TokenKind::Percent, BinOp::Rem),
        ],
        parse_unary,
    )
}

/// Parse `-expr` / `!expr` (right-associative) or fall through to postfix.
fn parse_unary(p: &mut Parser) -> Result<Expr, ParseError> {
    let op = match p.current() {
        TokenKind::Minus => Some(UnOp::Neg),
        TokenKind::Bang => Some(UnOp::Not),
        _ => None,
    };
    if let Some(op) = op {
        let op_span = p.advance().span;
        let operand = parse_unary(p)?;
        let span = op_span.cover(operand.span);
        return Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ));
    }
    parse_postfix(p)
}

// ── Postfix: calls, member access, index access ────────────────────────

fn parse_postfix(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(p)?;
    loop {
        match p.current() {
            TokenKind::LParen => {
                p.advance(); // (
                let mut args = Vec::new();
                while !p.at(TokenKind::RParen) {
                    args.push(parse_expr(p)?);
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
                let close = p.expect(TokenKind::RParen, "`)` to close argument list")?;
                let span = expr.span.cover(close.span);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            }
            TokenKind::Dot => {
                p.advance(); // .
                let field_tok = p.expect(TokenKind::Ident, "field name after `.`")?;
                let span = expr.span.cover(field_tok.span);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        field: field_tok.text(p.source).to_string(),
                    },
                    span,
                );
            }
            TokenKind::LBracket => {
                p.advance(); // [
                let index = parse_expr(p)?;
                let close = p.expect(TokenKind::RBracket, "`]` to close index")?;
                let span = expr.span.cover(close.span);
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            }
            _ => break,
        }
    }
    Ok(expr)
}

// ── Primary expressions ────────────────────────────────────────────────

fn parse_primary(p: &mut Parser) -> Result<Expr, ParseError> {
    match p.current() {
        TokenKind::Number => {
            let tok = p.advance();
            let value: f64 = tok
                .text(p.source)
                .parse()
                .map_err(|_| ParseError::new("invalid number literal", tok.span))?;
            Ok(Expr::new(ExprKind::Number(value), tok.span))
        }
        TokenKind::Str => {
            let tok = p.advance();
            let value = decode_string(tok.text(p.source));
            Ok(Expr::new(ExprKind::Str(value), tok.span))
        }
        TokenKind::True => {
            let tok = p.advance();
            Ok(Expr::new(ExprKind::Bool(true), tok.span))
        }
        TokenKind::False => {
            let tok = p.advance();
            Ok(Expr::new(ExprKind::Bool(false), tok.span))
        }
        TokenKind::Null => {
            let tok = p.advance();
            Ok(Expr::new(ExprKind::Null, tok.span))
        }
        TokenKind::Undefined => {
            let tok = p.advance();
            Ok(Expr::new(ExprKind::Undefined, tok.span))
        }
        TokenKind::Ident => {
            // `x => body` is the only parenthesis-free function form, and
            // it admits no type annotations.
            if p.nth(1) == TokenKind::FatArrow && p.func_sugar_enabled() {
                return parse_func_single_param(p);
            }
            let tok = p.advance();
            Ok(Expr::new(
                ExprKind::Ident(tok.text(p.source).to_string()),
                tok.span,
            ))
        }
        TokenKind::LParen => {
            if p.func_sugar_enabled() && p.speculate(is_function_head) {
                return parse_func_parens(p);
            }
            p.advance(); // (
            let inner = parse_expr(p)?;
            p.expect(TokenKind::RParen, "`)` to close parenthesized expression")?;
            Ok(inner)
        }
        TokenKind::If => parse_if(p),
        TokenKind::Match => parse_match(p),
        TokenKind::LBracket => parse_array_or_dict(p),
        TokenKind::LBrace => parse_block_or_record(p),
        _ => Err(p.error_here("expected expression")),
    }
}

// ── Function literals ──────────────────────────────────────────────────

/// Look-ahead run against `( ... )`: true when the tokens form a
/// (possibly empty, possibly annotated) parameter list, an optional
/// return annotation, and then `=>`. The position is rolled back by the
/// caller's `speculate`.
fn is_function_head(p: &mut Parser) -> bool {
    p.advance(); // (
    if !p.at(TokenKind::RParen) {
        loop {
            if !p.at(TokenKind::Ident) {
                return false;
            }
            p.advance();
            if p.eat(TokenKind::Colon) && types::parse_type(p).is_err() {
                return false;
            }
            if p.eat(TokenKind::Comma) {
                continue;
            }
            break;
        }
    }
    if !p.eat(TokenKind::RParen) {
        return false;
    }
    if p.eat(TokenKind::Colon) && types::parse_type(p).is_err() {
        return false;
    }
    p.at(TokenKind::FatArrow)
}

/// Parse `(params) (: ret)? => body` after the look-ahead confirmed it.
fn parse_func_parens(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.expect(TokenKind::LParen, "`(`")?;
    let mut params = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            params.push(parse_param(p)?);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen, "`)` to close parameter list")?;
    let ret = if p.eat(TokenKind::Colon) {
        Some(types::parse_type(p)?)
    } else {
        None
    };
    p.expect(TokenKind::FatArrow, "`=>`")?;
    let body = parse_expr(p)?;
    let span = open.span.cover(body.span);
    Ok(Expr::new(
        ExprKind::Func(Rc::new(FuncLit { params, ret, body })),
        span,
    ))
}

/// Parse the sugar form `x => body`.
fn parse_func_single_param(p: &mut Parser) -> Result<Expr, ParseError> {
    let name_tok = p.advance(); // parameter identifier
    p.expect(TokenKind::FatArrow, "`=>`")?;
    let body = parse_expr(p)?;
    let span = name_tok.span.cover(body.span);
    let param = Param {
        name: name_tok.text(p.source).to_string(),
        annotation: None,
        span: name_tok.span,
    };
    Ok(Expr::new(
        ExprKind::Func(Rc::new(FuncLit {
            params: vec![param],
            ret: None,
            body,
        })),
        span,
    ))
}

/// Parse `IDENT (: type)?` inside a parameter list.
fn parse_param(p: &mut Parser) -> Result<Param, ParseError> {
    let name_tok = p.expect(TokenKind::Ident, "parameter name")?;
    let annotation = if p.eat(TokenKind::Colon) {
        Some(types::parse_type(p)?)
    } else {
        None
    };
    Ok(Param {
        name: name_tok.text(p.source).to_string(),
        annotation,
        span: name_tok.span,
    })
}

// ── Conditionals ───────────────────────────────────────────────────────

fn parse_if(p: &mut Parser) -> Result<Expr, ParseError> {
    let if_tok = p.advance(); // if
    p.expect(TokenKind::LParen, "`(` after `if`")?;
    let cond = parse_expr(p)?;
    p.expect(TokenKind::RParen, "`)` after condition")?;
    let then_branch = parse_expr(p)?;
    let else_branch = if p.eat(TokenKind::Else) {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    let end = else_branch
        .as_ref()
        .map(|e| e.span)
        .unwrap_or(then_branch.span);
    Ok(Expr::new(
        ExprKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
        },
        if_tok.span.cover(end),
    ))
}

// ── Match expressions ──────────────────────────────────────────────────

fn parse_match(p: &mut Parser) -> Result<Expr, ParseError> {
    let match_tok = p.advance(); // match
    let scrutinee = parse_logical_or(p)?;
    p.expect(TokenKind::LBrace, "`{` after match discriminant")?;
    let mut cases = Vec::new();
    while !p.at(TokenKind::RBrace) {
        let pattern = patterns::parse_pattern(p)?;
        // The guard is parsed with function sugar disabled so a bare
        // `ident =>` guard boundary is not read as a function literal.
        let guard = if p.eat(TokenKind::If) {
            Some(p.without_func_sugar(parse_expr)?)
        } else {
            None
        };
        p.expect(TokenKind::FatArrow, "`=>` after match pattern")?;
        let body = parse_expr(p)?;
        cases.push(MatchCase {
            pattern,
            guard,
            body,
        });
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    let close = p.expect(TokenKind::RBrace, "`}` to close match expression")?;
    if cases.is_empty() {
        return Err(ParseError::new(
            "match expression needs at least one case",
            match_tok.span.cover(close.span),
        ));
    }
    Ok(Expr::new(
        ExprKind::Match {
            scrutinee: Box::new(scrutinee),
            cases,
        },
        match_tok.span.cover(close.span),
    ))
}

// ── Bracketed literals ─────────────────────────────────────────────────

/// Parse `[...]`: an array literal, unless the first element is followed
/// by `:`, which makes it a dictionary literal. `[]` is an empty array;
/// empty dictionaries are only expressible through type annotations.
fn parse_array_or_dict(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.advance(); // [
    if p.at(TokenKind::RBracket) {
        let close = p.advance();
        return Ok(Expr::new(ExprKind::Array(Vec::new()), open.span.cover(close.span)));
    }

    let first = parse_expr(p)?;
    if p.eat(TokenKind::Colon) {
        let value = parse_expr(p)?;
        let mut entries = vec![(first, value)];
        while p.eat(TokenKind::Comma) {
            if p.at(TokenKind::RBracket) {
                break; // trailing comma
            }
            let k = parse_expr(p)?;
            p.expect(TokenKind::Colon, "`:` between dictionary key and value")?;
            let v = parse_expr(p)?;
            entries.push((k, v));
        }
        let close = p.expect(TokenKind::RBracket, "`]` to close dictionary literal")?;
        return Ok(Expr::new(ExprKind::Dict(entries), open.span.cover(close.span)));
    }

    let mut elements = vec![first];
    while p.eat(TokenKind::Comma) {
        if p.at(TokenKind::RBracket) {
            break; // trailing comma
        }
        elements.push(parse_expr(p)?);
    }
    let close = p.expect(TokenKind::RBracket, "`]` to close array literal")?;
    Ok(Expr::new(ExprKind::Array(elements), open.span.cover(close.span)))
}

/// Parse `{...}`: a record literal when the body is empty or starts with
/// `ident :` / `"string" :`, otherwise a block expression.
fn parse_block_or_record(p: &mut Parser) -> Result<Expr, ParseError> {
    let looks_like_record = p.nth(1) == TokenKind::RBrace
        || ((p.nth(1) == TokenKind::Ident || p.nth(1) == TokenKind::Str)
            && p.nth(2) == TokenKind::Colon);
    if looks_like_record {
        parse_record(p)
    } else {
        parse_block(p)
    }
}

fn parse_record(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.advance(); // {
    let mut fields: Vec<(String, Expr)> = Vec::new();
    while !p.at(TokenKind::RBrace) {
        let (name, name_span) = match p.current() {
            TokenKind::Ident => {
                let tok = p.advance();
                (tok.text(p.source).to_string(), tok.span)
            }
            TokenKind::Str => {
                let tok = p.advance();
                (decode_string(tok.text(p.source)), tok.span)
            }
            _ => return Err(p.error_here("expected record field name")),
        };
        if fields.iter().any(|(existing, _)| existing == &name) {
            return Err(ParseError::new(
                format!("duplicate field `{name}` in record literal"),
                name_span,
            ));
        }
        p.expect(TokenKind::Colon, "`:` after record field name")?;
        let value = parse_expr(p)?;
        fields.push((name, value));
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    let close = p.expect(TokenKind::RBrace, "`}` to close record literal")?;
    Ok(Expr::new(ExprKind::Record(fields), open.span.cover(close.span)))
}

fn parse_block(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.advance(); // {
    let mut exprs = Vec::new();
    loop {
        if p.at(TokenKind::Eof) {
            return Err(ParseError::new(
                "expected `}` to close block, found end of input",
                p.current_span(),
            )
            .with_note("block started here", open.span));
        }
        exprs.push(parse_expr(p)?);
        p.eat(TokenKind::Semicolon);
        if p.at(TokenKind::RBrace) {
            break;
        }
    }
    let close = p.advance(); // }
    let tail = exprs.pop().expect("block loop pushes before exiting");
    Ok(Expr::new(
        ExprKind::Block {
            stmts: exprs,
            tail: Box::new(tail),
        },
        open.span.cover(close.span),
    ))
}

// ── String decoding ────────────────────────────────────────────────────

/// Decode a string lexeme (quotes included) into its value, resolving the
/// escapes `\n \t \r \\ \"`. Unknown escapes resolve to the escaped
/// character itself.
pub(crate) fn decode_string(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
