//! Marl lexer -- tokenizer for the Marl expression language.
//!
//! A single left-to-right pass over UTF-8 source. Whitespace (including
//! newlines; semicolons are the statement terminator) and `//` line
//! comments are elided. The output always ends with an `Eof` token; the
//! parser relies on that sentinel.
//!
//! The scanner works on raw bytes: every character that can shape a Marl
//! token is ASCII, and UTF-8 continuation bytes are all >= 0x80, so byte
//! comparisons never split a multi-byte character. The only place a full
//! character is decoded is the unknown-input path, where the error token
//! must cover the whole offending character.
//!
//! Malformed input does not abort the lexer. An unknown character becomes
//! an `Error` token and an unclosed string becomes an `UnterminatedString`
//! token; the parser turns either into a located parse error.

use marl_common::token::{keyword_from_str, Token, TokenKind};

/// The Marl lexer. Converts source text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>` so callers can consume tokens
/// lazily or collect them into a `Vec`.
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    /// Byte position of the next unconsumed input.
    pos: usize,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            emitted_eof: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    // ── Byte-level scanning ────────────────────────────────────────────

    /// The byte at the current position, if any.
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// The byte one past the current position, if any.
    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Consume bytes while the predicate holds.
    fn eat_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
    }

    /// Finish a token that started at byte offset `start`.
    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, start as u32, self.pos as u32)
    }

    // ── Token production ───────────────────────────────────────────────

    fn produce_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(byte) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        // Two-character operators first: each shares a leading byte with
        // a one-character token.
        if let Some(kind) = self.scan_compound_operator() {
            return self.token(kind, start);
        }

        if let Some(kind) = single_byte_token(byte) {
            self.pos += 1;
            return self.token(kind, start);
        }

        match byte {
            b'0'..=b'9' => self.scan_number(start),
            b'"' => self.scan_string(start),
            b if is_ident_byte_start(b) => self.scan_ident(start),
            _ => {
                // Not a Marl token. Decode the full character so the
                // error span covers every byte of it.
                let width = self.source[self.pos..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
                self.pos += width;
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Skip whitespace and `//` line comments. Newlines are whitespace;
    /// statements are separated by semicolons, not line breaks.
    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
            if self.peek() == Some(b'/') && self.peek2() == Some(b'/') {
                self.eat_while(|b| b != b'\n');
                continue;
            }
            break;
        }
    }

    /// Scan the operators that span two bytes (`==`, `=>`, `!=`, `<=`,
    /// `>=`, `&&`, `||`) plus their one-byte relatives. Returns `None`
    /// when the current byte cannot start any of them.
    ///
    /// A lone `&` or `|` has no one-byte form and becomes an `Error`
    /// token.
    fn scan_compound_operator(&mut self) -> Option<TokenKind> {
        let kind = match (self.peek()?, self.peek2()) {
            (b'=', Some(b'=')) => {
                self.pos += 2;
                TokenKind::EqEq
            }
            (b'=', Some(b'>')) => {
                self.pos += 2;
                TokenKind::FatArrow
            }
            (b'=', _) => {
                self.pos += 1;
                TokenKind::Eq
            }
            (b'!', Some(b'=')) => {
                self.pos += 2;
                TokenKind::NotEq
            }
            (b'!', _) => {
                self.pos += 1;
                TokenKind::Bang
            }
            (b'<', Some(b'=')) => {
                self.pos += 2;
                TokenKind::LtEq
            }
            (b'<', _) => {
                self.pos += 1;
                TokenKind::Lt
            }
            (b'>', Some(b'=')) => {
                self.pos += 2;
                TokenKind::GtEq
            }
            (b'>', _) => {
                self.pos += 1;
                TokenKind::Gt
            }
            (b'&', Some(b'&')) => {
                self.pos += 2;
                TokenKind::AmpAmp
            }
            (b'&', _) => {
                self.pos += 1;
                TokenKind::Error
            }
            (b'|', Some(b'|')) => {
                self.pos += 2;
                TokenKind::PipePipe
            }
            (b'|', _) => {
                self.pos += 1;
                TokenKind::Error
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Scan a number literal: `d+` optionally followed by `.d+`.
    ///
    /// A trailing `.` with no digit after it is not part of the number, so
    /// member access on a numeric result still lexes (`1.x` is `1` `.` `x`).
    fn scan_number(&mut self, start: usize) -> Token {
        self.eat_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') && self.peek2().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1; // '.'
            self.eat_while(|b| b.is_ascii_digit());
        }
        self.token(TokenKind::Number, start)
    }

    /// Scan a double-quoted string literal.
    ///
    /// Escape sequences are consumed but kept verbatim in the lexeme; the
    /// parser decodes `\n \t \r \\ \"`. Reaching end of input before the
    /// closing quote yields an `UnterminatedString` token. Multi-byte
    /// content passes through untouched: its bytes never collide with the
    /// ASCII terminators checked here.
    fn scan_string(&mut self, start: usize) -> Token {
        self.pos += 1; // opening '"'
        loop {
            match self.peek() {
                None => return self.token(TokenKind::UnterminatedString, start),
                Some(b'"') => {
                    self.pos += 1;
                    return self.token(TokenKind::Str, start);
                }
                Some(b'\\') => {
                    self.pos += 1; // '\'
                    // The escaped character may be multi-byte.
                    let width = self.source[self.pos..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(0);
                    self.pos += width;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Scan an identifier, keyword, or the `_` wildcard punctuator.
    fn scan_ident(&mut self, start: usize) -> Token {
        self.eat_while(is_ident_byte);
        let text = &self.source[start..self.pos];
        let kind = if text == "_" {
            TokenKind::Underscore
        } else {
            keyword_from_str(text).unwrap_or(TokenKind::Ident)
        };
        self.token(kind, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.produce_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Delimiters, punctuation, and the one-byte arithmetic operators.
/// `/` never reaches here as a comment (trivia is skipped first).
fn single_byte_token(byte: u8) -> Option<TokenKind> {
    Some(match byte {
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        b'[' => TokenKind::LBracket,
        b']' => TokenKind::RBracket,
        b',' => TokenKind::Comma,
        b'.' => TokenKind::Dot,
        b':' => TokenKind::Colon,
        b';' => TokenKind::Semicolon,
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        b'%' => TokenKind::Percent,
        _ => return None,
    })
}

/// Whether a byte can start an identifier (`[A-Za-z_]`).
fn is_ident_byte_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

/// Whether a byte can continue an identifier (`[A-Za-z0-9_]`).
fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
