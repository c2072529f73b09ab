// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A byte range in a statement's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Line-start offsets for byte-offset → line:col lookup.
///
/// Statements from documentation can span several continuation lines, so
/// syntax errors report the line within the statement.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineMap { line_starts }
    }

    /// Convert a byte offset to (line, col), both 1-based.
    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (line_idx + 1, offset - self.line_starts[line_idx] + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }

    #[test]
    fn continuation_lines() {
        let lm = LineMap::new("fn f() {\n    1 +\n}");
        assert_eq!(lm.line_count(), 3);
        assert_eq!(lm.offset_to_line_col(9), (2, 1));
        assert_eq!(lm.offset_to_line_col(15), (2, 7));
        assert_eq!(lm.offset_to_line_col(17), (3, 1));
    }

    #[test]
    fn span_union() {
        let a = Span::new(4, 8);
        let b = Span::new(1, 5);
        assert_eq!(a.to(b), Span::new(1, 8));
    }
}
