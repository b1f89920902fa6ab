use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// A span of raw source bytes.
///
/// Locations are absolute byte offsets into the UTF-8 source, never character
/// or line offsets. Use [`ByteRange::slice`] to read the text under a range;
/// it refuses ranges that split a multi-byte character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct ByteRange {
    pub location: usize,
    pub length: usize,
}

impl ByteRange {
    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// Build a range from a half-open `start..end` pair. `end < start` yields an empty range.
    pub const fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            location: start,
            length: end.saturating_sub(start),
        }
    }

    /// One past the last byte. Saturates at `usize::MAX`.
    pub const fn upper_bound(&self) -> usize {
        self.location.saturating_add(self.length)
    }

    /// One past the last byte, or `None` if it does not fit in a `usize`.
    pub const fn checked_upper_bound(&self) -> Option<usize> {
        self.location.checked_add(self.length)
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` lies inside the range. The upper bound is exclusive.
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.location && offset < self.upper_bound()
    }

    /// Whether `other` lies entirely within this range.
    pub const fn contains_range(&self, other: &ByteRange) -> bool {
        other.location >= self.location && other.upper_bound() <= self.upper_bound()
    }

    /// Whether the two ranges share at least one byte.
    ///
    /// Touching ranges (`a.upper_bound() == b.location`) do not intersect. An empty
    /// range intersects another range only when it sits strictly inside it, or when
    /// both ranges are empty at the same location.
    pub const fn intersects(&self, other: &ByteRange) -> bool {
        if self.length == 0 && other.length == 0 {
            return self.location == other.location;
        }
        if self.length == 0 {
            return self.location > other.location && self.location < other.upper_bound();
        }
        if other.length == 0 {
            return other.location > self.location && other.location < self.upper_bound();
        }
        self.location < other.upper_bound() && other.location < self.upper_bound()
    }

    pub const fn as_range(&self) -> Range<usize> {
        self.location..self.upper_bound()
    }

    /// The text under this range, or `None` if it is out of bounds or splits a character.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        let end = self.checked_upper_bound()?;
        source.get(self.location..end)
    }
}

impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        Self::from_bounds(range.start, range.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.location, self.upper_bound())
    }
}
