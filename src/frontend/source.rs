//! Source positions and the line/column resolver
//!
//! Locations are 1-based line/column pairs measured in bytes, matching what a
//! C compiler reports. Ranges are half-open: `start` is the first character,
//! `end` is the position just past the last one.

use std::fmt;

/// A position in the main source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Same line, `n` columns further right
    pub fn shifted(self, n: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + n,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open span `[start, end)` of the main source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`
    pub fn to(self, other: SourceRange) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, loc: SourceLocation) -> bool {
        self.start <= loc && loc < self.end
    }

    /// True if `other` lies entirely within `self`
    pub fn encloses(&self, other: &SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if `loc` appears before the start of this range
    pub fn is_after(&self, loc: SourceLocation) -> bool {
        loc < self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Resolves locations to byte offsets and back for one source buffer
#[derive(Debug, Clone)]
pub struct SourceMap {
    text: String,
    /// Byte offset at which each line starts; `line_starts[0]` is line 1
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Location of the byte at `offset` (or of end-of-file)
    pub fn location(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.text.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        SourceLocation::new(line_index + 1, offset - self.line_starts[line_index] + 1)
    }

    /// Byte offset of `loc`, clamped to the end of its line and to the buffer
    pub fn offset(&self, loc: SourceLocation) -> usize {
        let Some(&line_start) = self.line_starts.get(loc.line.saturating_sub(1)) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(loc.line)
            .copied()
            .unwrap_or(self.text.len());
        (line_start + loc.column.saturating_sub(1)).min(line_end)
    }

    pub fn start_of_file(&self) -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    pub fn end_of_file(&self) -> SourceLocation {
        self.location(self.text.len())
    }

    /// Whole-file range
    pub fn full_range(&self) -> SourceRange {
        SourceRange::new(self.start_of_file(), self.end_of_file())
    }

    /// Original text covered by `range`
    pub fn slice(&self, range: SourceRange) -> &str {
        let start = self.offset(range.start);
        let end = self.offset(range.end).max(start);
        &self.text[start..end]
    }

    /// Byte at `loc`, if any
    pub fn byte_at(&self, loc: SourceLocation) -> Option<u8> {
        self.text.as_bytes().get(self.offset(loc)).copied()
    }

    /// Line of the first `{` or newline at or after `loc`
    pub fn line_of_next_brace_or_newline(&self, loc: SourceLocation) -> usize {
        let start = self.offset(loc);
        let found = self.text.as_bytes()[start..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'{')
            .map(|i| start + i)
            .unwrap_or(self.text.len());
        self.location(found).line
    }
}

/// Bytes of `token` other than line breaks; columns count bytes
pub fn count_non_newline_bytes(token: &str) -> usize {
    token.bytes().filter(|b| *b != b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_roundtrip() {
        let map = SourceMap::new("int x;\nint y = 2;\n");
        let loc = map.location(11);
        assert_eq!(loc, SourceLocation::new(2, 5));
        assert_eq!(map.offset(loc), 11);
        assert_eq!(map.end_of_file(), SourceLocation::new(3, 1));
    }

    #[test]
    fn test_slice_and_contains() {
        let map = SourceMap::new("a + b\n");
        let range = SourceRange::new(SourceLocation::new(1, 3), SourceLocation::new(1, 4));
        assert_eq!(map.slice(range), "+");
        assert!(range.contains(SourceLocation::new(1, 3)));
        assert!(!range.contains(SourceLocation::new(1, 4)));
    }

    #[test]
    fn test_ordering_is_line_major() {
        assert!(SourceLocation::new(1, 80) < SourceLocation::new(2, 1));
        assert!(SourceLocation::new(3, 2) > SourceLocation::new(3, 1));
    }

    #[test]
    fn test_next_brace_or_newline() {
        let map = SourceMap::new("if (a)\n{\n}\nwhile (b) {\n}");
        assert_eq!(map.line_of_next_brace_or_newline(SourceLocation::new(1, 6)), 1);
        assert_eq!(map.line_of_next_brace_or_newline(SourceLocation::new(4, 9)), 4);
    }

    #[test]
    fn test_count_non_newline_bytes() {
        assert_eq!(count_non_newline_bytes("(x+1)"), 5);
        assert_eq!(count_non_newline_bytes("{\n}"), 2);
        assert_eq!(count_non_newline_bytes("\"\u{e9}\""), 4);
    }
}
