//! Source positions and spans.
//!
//! Positions are measured in Unicode scalar values, 1-based for both line
//! and column. Spans are half-open `[start, end)` ranges and are carried by
//! value on every AST and Core IR node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based (line, column) source position.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Position of the first character of a file.
    pub const ORIGIN: Position = Position { line: 1, column: 1 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::ORIGIN
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source span `[start, end)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Dummy span for synthesized nodes.
    pub const DUMMY: Span = Span {
        start: Position::ORIGIN,
        end: Position::ORIGIN,
    };

    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Zero-length span at a single position.
    #[inline]
    pub const fn point(at: Position) -> Self {
        Span { start: at, end: at }
    }

    /// Merge two spans into one covering both.
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// True when start and end coincide.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering_is_line_major() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(3, 2) < Position::new(3, 5));
    }

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(Position::new(1, 1), Position::new(1, 5));
        let b = Span::new(Position::new(1, 3), Position::new(2, 2));
        let merged = a.merge(b);
        assert_eq!(merged.start, Position::new(1, 1));
        assert_eq!(merged.end, Position::new(2, 2));
    }

    #[test]
    fn span_merge_reversed_order() {
        let a = Span::new(Position::new(4, 1), Position::new(4, 9));
        let b = Span::new(Position::new(2, 1), Position::new(3, 1));
        let merged = a.merge(b);
        assert_eq!(merged.start, Position::new(2, 1));
        assert_eq!(merged.end, Position::new(4, 9));
    }

    #[test]
    fn dummy_span_is_empty() {
        assert!(Span::DUMMY.is_empty());
    }

    #[test]
    fn display_format() {
        let span = Span::new(Position::new(2, 3), Position::new(2, 7));
        assert_eq!(format!("{span}"), "2:3..2:7");
    }
}
