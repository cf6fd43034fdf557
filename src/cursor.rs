use crate::source::{Position, SourceBuffer};

/// Forkable text accumulator over a shared [`SourceBuffer`].
///
/// The accumulated text is always the buffer slice from `start` to `current`,
/// minus skipped spans, plus whatever was inserted with [`Cursor::tag`].
/// `current` never moves backwards: the tree walk visits text in order, so a
/// backwards move is a traversal bug and panics.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a SourceBuffer,
    start: Position,
    current: Position,
    text: String,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a SourceBuffer) -> Self {
        Self::at(buffer, Position::default())
    }

    pub fn at(buffer: &'a SourceBuffer, pos: Position) -> Self {
        Self {
            buffer,
            start: pos,
            current: pos,
            text: String::new(),
        }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn current(&self) -> Position {
        self.current
    }

    /// Append the buffer text from `current` up to `until`.
    pub fn consume(&mut self, until: Position) {
        self.check_forward("consume", until);
        self.text.push_str(self.buffer.slice(self.current, until));
        self.current = until;
    }

    /// Move to `until` without recording the text in between.
    pub fn skip(&mut self, until: Position) {
        self.check_forward("skip", until);
        self.current = until;
    }

    /// Append text that does not come from the buffer (a placeholder).
    ///
    /// Returns the byte offset in the rendered text where it was inserted.
    pub fn tag(&mut self, text: &str) -> usize {
        let at = self.text.len();
        self.text.push_str(text);
        at
    }

    /// Fresh, empty cursor starting where this one currently is.
    pub fn fork(&self) -> Cursor<'a> {
        Cursor::at(self.buffer, self.current)
    }

    pub fn render(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn check_forward(&self, op: &str, until: Position) {
        assert!(
            until >= self.current,
            "cursor {op} out of order: at {} but asked for {}",
            self.current,
            until
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> SourceBuffer {
        SourceBuffer::new("fn a() {\n    1\n}\n")
    }

    #[test]
    fn consume_appends_across_lines() {
        let buf = buffer();
        let mut c = Cursor::new(&buf);
        c.consume(Position::new(0, 2));
        assert_eq!(c.render(), "fn");
        c.consume(Position::new(2, 1));
        assert_eq!(c.render(), "fn a() {\n    1\n}");
        assert_eq!(c.current(), Position::new(2, 1));
    }

    #[test]
    fn skip_and_tag_replace_a_span() {
        let buf = buffer();
        let mut c = Cursor::new(&buf);
        c.consume(Position::new(0, 7));
        assert_eq!(c.tag("<BODY a>"), 7);
        c.skip(Position::new(2, 1));
        c.consume(buf.end());
        assert_eq!(c.render(), "fn a() <BODY a>\n");
    }

    #[test]
    fn fork_leaves_parent_untouched() {
        let buf = buffer();
        let mut parent = Cursor::new(&buf);
        parent.consume(Position::new(0, 5));

        let mut child = parent.fork();
        assert_eq!(child.start(), Position::new(0, 5));
        assert_eq!(child.render(), "");
        child.consume(Position::new(1, 5));

        assert_eq!(parent.current(), Position::new(0, 5));
        assert_eq!(parent.render(), "fn a(");
        assert_eq!(child.render(), ") {\n    1");
    }

    #[test]
    fn zero_length_consume_is_a_no_op() {
        let buf = buffer();
        let mut c = Cursor::at(&buf, Position::new(1, 4));
        c.consume(Position::new(1, 4));
        assert_eq!(c.render(), "");
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn consume_backwards_panics() {
        let buf = buffer();
        let mut c = Cursor::new(&buf);
        c.consume(Position::new(1, 0));
        c.consume(Position::new(0, 3));
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn skip_backwards_panics() {
        let buf = buffer();
        let mut c = Cursor::at(&buf, Position::new(2, 0));
        c.skip(Position::new(1, 0));
    }
}
