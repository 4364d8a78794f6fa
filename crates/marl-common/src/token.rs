use serde::Serialize;

use crate::span::Span;

/// A token produced by the Marl lexer.
///
/// Tokens carry a kind and a byte span only; the lexeme is recovered by
/// slicing the source with the span, and semantic payloads (number values,
/// unescaped string contents) are decoded by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// The lexeme text of this token within `source`.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.start as usize..self.span.end as usize]
    }
}

/// Every kind of token in the Marl language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords (9) ───────────────────────────────────────────────────
    Let,
    And,
    If,
    Else,
    Match,
    True,
    False,
    Null,
    Undefined,

    // ── Literals and identifiers (3) ───────────────────────────────────
    /// Numeric literal: `d+` or `d+.d+`, decoded to f64 by the parser.
    Number,
    /// Double-quoted string literal, escapes included verbatim in the
    /// lexeme; the parser decodes them.
    Str,
    /// `[A-Za-z_][A-Za-z0-9_]*`, except the keywords above and `_` alone.
    Ident,

    // ── Delimiters (6) ─────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // ── Punctuation (5) ────────────────────────────────────────────────
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `_` standing alone (the wildcard pattern).
    Underscore,

    // ── Operators (17) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `=`
    Eq,
    /// `=>`
    FatArrow,

    // ── Special (3) ────────────────────────────────────────────────────
    /// End of file. The lexer always emits exactly one as the final token.
    Eof,
    /// A character that starts no token. Carried to the parser for a
    /// located error.
    Error,
    /// A string literal that reached end of input before its closing `"`.
    UnterminatedString,
}

/// Look up a keyword from its string representation.
///
/// Returns `Some(TokenKind)` if the string is a Marl keyword, `None`
/// otherwise. The lexer calls this after scanning an identifier-shaped
/// lexeme.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "let" => Some(TokenKind::Let),
        "and" => Some(TokenKind::And),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "match" => Some(TokenKind::Match),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "undefined" => Some(TokenKind::Undefined),
        _ => None,
    }
}
