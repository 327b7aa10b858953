//! Source locations.
//!
//! Small types for tracking where a token or a reduced phrase came from, plus
//! the [`Cursor`] a scanner uses to keep line/column counters in step with a
//! byte offset.
//!
//! # Examples
//!
//! ```rust
//! # use mathnote_lr::{Position, Span};
//! let sp = Span::new(Position::new(1, 3), Position::new(1, 8));
//! assert!(!sp.is_empty());
//! assert_eq!(sp.to_string(), "span 1:3 to 1:8");
//! ```

use std::fmt;

/// A 1-based line/column position in source text.
///
/// Columns count characters, not bytes, so a Greek letter advances the column
/// by one just like an ASCII letter does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range: `[start, end)`.
///
/// Conventionally `start <= end` in lexicographic `(line, column)` order; this
/// is not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    /// Starting position (inclusive).
    pub start: Position,
    /// Ending position (exclusive).
    pub end: Position,
}

impl Span {
    /// Creates a new `Span`.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Merge with another span by covering both.
    #[inline]
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Is this span empty (start == end)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "span {} to {}", self.start, self.end)
    }
}

/// Tracks a byte offset into the input together with its line/column.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Byte offset of the next unread byte.
    pub offset: usize,
    /// Position of the next unread character.
    pub position: Position,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance over `text`, which must be the input slice starting at
    /// `self.offset`. Returns the span covered.
    pub fn advance(&mut self, text: &str) -> Span {
        let start = self.position;
        for c in text.chars() {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        self.offset += text.len();
        Span::new(start, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let a = Span::new(Position::new(1, 4), Position::new(1, 6));
        let b = Span::new(Position::new(1, 1), Position::new(1, 3));
        let m = a.merge(&b);
        assert_eq!(m.start, Position::new(1, 1));
        assert_eq!(m.end, Position::new(1, 6));
        assert_eq!(m.to_string(), "span 1:1 to 1:6");
    }

    #[test]
    fn cursor_counts_chars_and_lines() {
        let mut cursor = Cursor::new();
        let sp = cursor.advance("αβ");
        assert_eq!(sp.start, Position::new(1, 1));
        assert_eq!(sp.end, Position::new(1, 3));
        assert_eq!(cursor.offset, 4);
        cursor.advance("\n");
        assert_eq!(cursor.position, Position::new(2, 1));
        assert!(cursor.advance("").is_empty());
    }
}
