//! Byte spans into a pattern or an input buffer.
//!
//! Tokens refer back to the pattern source by span, and capture slots are
//! reported to callers as spans of the input.

use std::ops::Range;

/// A contiguous byte region: `len` bytes starting at offset `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Offset one past the last byte.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The span as a half-open range, for slicing.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_and_range() {
        let span = Span::new(3, 4);
        assert_eq!(span.end(), 7);
        assert_eq!(span.range(), 3..7);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_slice_by_range() {
        let text = "hello world";
        assert_eq!(&text[Span::new(6, 5).range()], "world");
    }

    #[test]
    fn test_into_tuple() {
        let pair: (usize, usize) = Span::new(0, 1).into();
        assert_eq!(pair, (0, 1));
    }
}
