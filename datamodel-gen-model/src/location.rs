use std::fmt;

/// A position inside the grammar source.
///
/// `offset` is a byte offset; `line` and `column` are 1-based and counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (idx, ch) in source.char_indices() {
            if is_line_terminator(ch) {
                line_starts.push(idx + ch.len_utf8());
            }
        }
        Self { source, line_starts }
    }

    pub fn locate(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(0);

        SourceLocation {
            offset,
            line: line + 1,
            column: column + 1,
        }
    }
}

pub(crate) fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_lines_and_columns() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.locate(0), SourceLocation { offset: 0, line: 1, column: 1 });
        assert_eq!(index.locate(4), SourceLocation { offset: 4, line: 2, column: 2 });
        assert_eq!(index.locate(7).line, 4);
    }

    #[test]
    fn test_locate_past_end_is_clamped() {
        let index = LineIndex::new("abc");
        assert_eq!(index.locate(99).offset, 3);
    }
}
