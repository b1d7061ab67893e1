//! Source text model: immutable file contents plus a line index.
//!
//! Every offset in the crate is a byte offset into the original UTF-8 text.
//! Lines and columns are 1-indexed for reporting.

use serde::Serialize;
use std::fmt;

/// Line-ending style detected from the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the style from the first line break in the text.
    /// Files without any line break default to `Lf`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed, in bytes).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed, in bytes).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    #[cfg(feature = "tree-sitter")]
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end_byte - self.start_byte
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// Whether two half-open ranges share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Immutable source text with a precomputed line index.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
    line_ending: LineEnding,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        let line_ending = LineEnding::detect(&text);
        Self {
            text,
            line_starts,
            line_ending,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 0-indexed line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Byte offset where 0-indexed `line` begins.
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line.min(self.line_starts.len() - 1)]
    }

    /// Byte offset of the end of `line`, excluding its line break.
    pub fn line_end(&self, line: usize) -> usize {
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        let start = self.line_start(line);
        if end > start && self.text.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    /// Text of `line` without its line break.
    pub fn line_text(&self, line: usize) -> &str {
        &self.text[self.line_start(line)..self.line_end(line)]
    }

    /// Leading whitespace of `line`, verbatim.
    pub fn indent_of_line(&self, line: usize) -> &str {
        let text = self.line_text(line);
        let trimmed = text.trim_start_matches([' ', '\t']);
        &text[..text.len() - trimmed.len()]
    }

    /// 1-indexed (line, column) for a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_of(offset);
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Build a span over `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_col) = self.position(start);
        let (end_line, end_col) = self.position(end);
        Span {
            start_byte: start,
            end_byte: end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn slice(&self, span: &Span) -> &str {
        &self.text[span.start_byte..span.end_byte]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let src = SourceText::new("one\ntwo\n\nfour");
        assert_eq!(src.line_count(), 4);
        assert_eq!(src.line_of(0), 0);
        assert_eq!(src.line_of(3), 0);
        assert_eq!(src.line_of(4), 1);
        assert_eq!(src.line_of(9), 3);
        assert_eq!(src.line_text(1), "two");
        assert_eq!(src.line_text(2), "");
        assert_eq!(src.line_text(3), "four");
        assert_eq!(src.position(5), (2, 2));
    }

    #[test]
    fn test_crlf_detection_and_line_text() {
        let src = SourceText::new("a\r\n  b\r\n");
        assert_eq!(src.line_ending(), LineEnding::CrLf);
        assert_eq!(src.line_text(0), "a");
        assert_eq!(src.line_text(1), "  b");
        assert_eq!(src.indent_of_line(1), "  ");
        assert_eq!(LineEnding::detect("a\nb\r\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::Lf);
    }

    #[test]
    fn test_indent_is_verbatim() {
        let src = SourceText::new("\t  \tx = 1\n");
        assert_eq!(src.indent_of_line(0), "\t  \t");
    }

    #[test]
    fn test_span_positions() {
        let src = SourceText::new("fn a() {}\nfn b() {}\n");
        let span = src.span(10, 19);
        assert_eq!(span.start_line, 2);
        assert_eq!(span.start_col, 1);
        assert_eq!(span.end_col, 10);
        assert_eq!(src.slice(&span), "fn b() {}");
        assert!(!span.overlaps(&src.span(0, 10)));
        assert!(span.overlaps(&src.span(12, 13)));
    }
}
