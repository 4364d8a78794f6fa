//! Recursive-descent parser for Marl.
//!
//! The parser consumes the token stream from `marl-lexer` and builds the
//! owned AST in `crate::ast` directly; there is no intermediate tree. One
//! function per precedence level, with explicit look-ahead for the three
//! ambiguous openers:
//!
//! - `(` -- function literal vs parenthesized expression (speculative scan
//!   for a parameter list followed by `=>`)
//! - `{` -- record literal vs block (two-token peek)
//! - `[` -- dictionary vs array literal (`:` after the first element)
//!
//! The parser stops at the first error. Lexical error tokens are rejected
//! up front so every malformed character surfaces as a located
//! [`ParseError`].

pub(crate) mod expressions;
pub(crate) mod patterns;
pub(crate) mod types;

use marl_common::error::{LexError, LexErrorKind};
use marl_common::span::Span;
use marl_common::token::{Token, TokenKind};

use crate::ast::{Expr, Program};
use crate::error::ParseError;

/// Recursive-descent parser over a lexed token stream.
///
/// State is the token position plus a counter that disables function-
/// literal sugar while a match guard is being parsed (so the guard does
/// not swallow the case's `=>`).
pub(crate) struct Parser<'src> {
    /// All tokens from the lexer, ending with `Eof`.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Original source text, for slicing lexemes out of spans.
    source: &'src str,
    /// When non-zero, `ident =>` and `(params) =>` are not treated as
    /// function literals. Incremented around match-guard parsing.
    no_func_sugar: u32,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            no_func_sugar: 0,
        }
    }

    /// Parse a whole program: expressions separated by optional `;`.
    pub(crate) fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();
        while !self.at(TokenKind::Eof) {
            items.push(expressions::parse_expr(self)?);
            self.eat(TokenKind::Semicolon);
        }
        Ok(Program { items })
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Kind of the current token. Past the end, reports `Eof`.
    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    /// Kind of the Nth token ahead (`nth(0)` is the current token).
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Span of the current token. Past the end, a zero-length span at the
    /// end of the source.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(self.source.len() as u32))
    }

    /// Lexeme text of the current token.
    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    /// Whether the current token has the given kind.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current token and return it. At `Eof`, stays put and
    /// returns the `Eof` token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, 0, 0));
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// If the current token matches `kind`, consume it and return true.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with "expected ...".
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    // ── Errors ─────────────────────────────────────────────────────────

    /// Build a parse error at the current token.
    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        let mut message = message.into();
        if self.at(TokenKind::Eof) {
            message.push_str(", found end of input");
        } else {
            message.push_str(&format!(", found `{}`", self.current_text()));
        }
        ParseError::new(message, self.current_span())
    }

    // ── Speculation ────────────────────────────────────────────────────

    /// Run `f` and roll the position back afterwards, reporting only
    /// whether it succeeded. Used for the `(`-disambiguation look-ahead.
    pub(crate) fn speculate(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let saved = self.pos;
        let ok = f(self);
        self.pos = saved;
        ok
    }

    // ── Sugar suppression ──────────────────────────────────────────────

    /// Whether function-literal sugar is currently enabled.
    pub(crate) fn func_sugar_enabled(&self) -> bool {
        self.no_func_sugar == 0
    }

    /// Parse `f` with function-literal sugar disabled.
    pub(crate) fn without_func_sugar<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.no_func_sugar += 1;
        let result = f(self);
        self.no_func_sugar -= 1;
        result
    }
}

/// Parse Marl source into a [`Program`].
///
/// Lexes the source, rejects lexical error tokens with a located error,
/// then runs the recursive-descent grammar. Returns the first error
/// encountered; there is no recovery.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = marl_lexer::Lexer::tokenize(source);

    // Surface lexical failures before parsing proper.
    for token in &tokens {
        let kind = match token.kind {
            TokenKind::Error => {
                let c = token.text(source).chars().next().unwrap_or('\u{FFFD}');
                LexErrorKind::UnexpectedCharacter(c)
            }
            TokenKind::UnterminatedString => LexErrorKind::UnterminatedString,
            _ => continue,
        };
        let error = LexError::new(kind, token.span);
        return Err(ParseError::new(error.to_string(), error.span));
    }

    Parser::new(tokens, source).parse_program()
}

/// Parse a single expression, requiring the whole input to be consumed.
///
/// Convenience for tools that type-check or evaluate one expression at a
/// time.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let program = parse(source)?;
    let mut items = program.items;
    match items.len() {
        1 => Ok(items.pop().expect("len checked")),
        0 => Err(ParseError::new(
            "expected an expression",
            Span::point(source.len() as u32),
        )),
        _ => Err(ParseError::new(
            "expected a single expression",
            items[1].span,
        )),
    }
}
