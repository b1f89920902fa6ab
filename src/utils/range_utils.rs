//! Utilities for position/range conversions

use crate::types::ByteRange;

/// Byte offsets of line starts for one source file.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    content: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(content.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { content, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset).max(1)
    }

    /// 1-based (line, column) for a byte offset. Columns count characters.
    ///
    /// Offsets past the end clamp to the end of the content; offsets inside a
    /// multi-byte character resolve to that character's column.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let line = self.line_of(offset);
        let line_start = self.line_starts[line - 1];
        let mut end = offset;
        while !self.content.is_char_boundary(end) {
            end -= 1;
        }
        let column = self.content[line_start..end].chars().count() + 1;
        (line, column)
    }

    /// Global start byte offset for a 1-based line number.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1).and_then(|idx| self.line_starts.get(idx)).copied()
    }

    /// Range of a 1-based line, excluding its terminator (`\n` or `\r\n`).
    pub fn line_range(&self, line: usize) -> Option<ByteRange> {
        let start = self.line_start(line)?;
        let mut end = self
            .line_starts
            .get(line)
            .map_or(self.content.len(), |&next| next - 1);
        if end > start && self.content.as_bytes()[end - 1] == b'\r' {
            end -= 1;
        }
        Some(ByteRange::from_bounds(start, end))
    }

    /// Every line with its 1-based number and range, terminators excluded.
    pub fn lines(&self) -> impl Iterator<Item = (usize, ByteRange, &'a str)> + '_ {
        (1..=self.line_count()).filter_map(move |line| {
            let range = self.line_range(line)?;
            Some((line, range, range.slice(self.content)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_counts_characters() {
        let index = LineIndex::new("ab\nçd\n");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(2), (1, 3));
        assert_eq!(index.line_col(3), (2, 1));
        // 'd' follows a two-byte character
        assert_eq!(index.line_col(5), (2, 2));
        assert_eq!(index.line_col(7), (3, 1));
        assert_eq!(index.line_col(100), (3, 1));
    }

    #[test]
    fn test_line_ranges() {
        let content = "first\r\nsecond\n\nlast";
        let index = LineIndex::new(content);
        assert_eq!(index.line_count(), 4);
        let lines: Vec<_> = index.lines().map(|(n, _, text)| (n, text)).collect();
        assert_eq!(lines, vec![(1, "first"), (2, "second"), (3, ""), (4, "last")]);
        assert_eq!(index.line_start(2), Some(7));
        assert_eq!(index.line_start(0), None);
        assert_eq!(index.line_start(5), None);
    }

    #[test]
    fn test_empty_content_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.lines().count(), 1);
    }
}
