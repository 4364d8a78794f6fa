use serde::Serialize;

/// Half-open byte range into Marl source text.
///
/// Spans are produced by the lexer and widened by the parser as nodes
/// grow (`cover`). They stay byte-based end to end; a human-readable
/// position is derived with [`line_col`] only at the moment an error is
/// shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span over `start..end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "backwards span {start}..{end}");
        Self { start, end }
    }

    /// Zero-width span at one offset (end-of-input errors).
    pub fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// The smallest span enclosing both `self` and `other`.
    ///
    /// This is how an expression node's span grows: a binary expression
    /// covers its leftmost and rightmost operand, a call covers its
    /// callee and closing parenthesis, and so on.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Resolve a byte offset to a 1-based (line, column) pair.
///
/// Walks the source counting line breaks up to the offset. Marl resolves
/// positions only when rendering an error, at most a handful of times per
/// run, so a fresh scan is cheaper than keeping a line table alive for
/// the whole pipeline. Column is measured in bytes from the line start.
/// Offsets past the end of the source clamp to its final position.
pub fn line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (i, byte) in source.bytes().enumerate().take(offset) {
        if byte == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, (offset - line_start) as u32 + 1)
}
