use serde::Serialize;
use std::fmt;

/// A (row, column) location in a source file.
///
/// Both fields are 0-indexed; `column` counts bytes within the line, which is
/// what tree-sitter reports. Ordering is by row, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Immutable, line-indexed view of one file's text.
///
/// Lines are split on `\n` only, so a trailing `\r` stays part of its line and
/// CRLF files come back out byte-for-byte.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line `row` without its terminating `\n`.
    pub fn line(&self, row: usize) -> Option<&str> {
        let start = *self.line_starts.get(row)?;
        let end = self
            .line_starts
            .get(row + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some(&self.text[start..end])
    }

    /// Position just past the last byte of the buffer.
    pub fn end(&self) -> Position {
        let row = self.line_starts.len() - 1;
        Position::new(row, self.text.len() - self.line_starts[row])
    }

    /// Byte offset of `pos`, clamped to the end of the buffer.
    pub fn offset(&self, pos: Position) -> usize {
        match self.line_starts.get(pos.row) {
            Some(start) => (start + pos.column).min(self.text.len()),
            None => self.text.len(),
        }
    }

    /// Exact text between two positions, line breaks included.
    pub fn slice(&self, from: Position, to: Position) -> &str {
        let start = self.offset(from);
        let end = self.offset(to).max(start);
        &self.text[start..end]
    }
}
