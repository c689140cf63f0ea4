//! Half-open character intervals over the annotated text.

use std::{fmt, ops::Range};

/// A half-open interval `[start, end)` of character offsets.
///
/// Spans are the identity key of every tagged entity. They order by
/// `(start, end)`, which is the order the span index iterates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a range.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the range is empty or inverted. Use
    /// [`Span::try_new`] for untrusted input.
    pub fn new(range: Range<usize>) -> Self {
        debug_assert!(
            range.start < range.end,
            "span start {} must be before end {}",
            range.start,
            range.end
        );
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Create a span, returning `None` unless `start < end`.
    ///
    /// # Examples
    ///
    /// ```
    /// use classmark_core::Span;
    ///
    /// assert!(Span::try_new(2, 6).is_some());
    /// assert!(Span::try_new(6, 6).is_none());
    /// ```
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans are never empty once constructed; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `offset` falls inside `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns `true` if the two spans share at least one offset.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The span as a `start..end` range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
