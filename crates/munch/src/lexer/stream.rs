//! Character stream with checkpoint and rewind.
//!
//! Longest-match scanning consumes past the last accepting position and
//! backtracks when the automaton dies, so the scanner's cursor must rewind
//! in O(1). A [`StreamCheckpoint`] is just a saved byte offset.

use crate::text::TextSize;

/// A forward character cursor over input text
#[derive(Debug, Clone)]
pub struct CharStream<'a> {
    input: &'a str,
    pos: usize,
}

/// Saved stream position, valid only for the stream it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCheckpoint(usize);

impl<'a> CharStream<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// The next character, without consuming it
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// The character after the next one, without consuming anything
    #[must_use]
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the next character
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume the next character if it equals `ch`
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn checkpoint(&self) -> StreamCheckpoint {
        StreamCheckpoint(self.pos)
    }

    /// Move the cursor back to a previously saved position
    pub fn rewind(&mut self, checkpoint: StreamCheckpoint) {
        debug_assert!(checkpoint.0 <= self.pos, "checkpoints only rewind");
        self.pos = checkpoint.0;
    }

    /// Current byte offset from the start of the input
    #[must_use]
    pub fn offset(&self) -> TextSize {
        TextSize::of(self.pos)
    }

    /// The text consumed since `from`
    #[must_use]
    pub fn slice(&self, from: StreamCheckpoint) -> &'a str {
        &self.input[from.0..self.pos]
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_bump() {
        let mut stream = CharStream::new("ab");

        assert_eq!(stream.peek(), Some('a'));
        assert_eq!(stream.peek_second(), Some('b'));
        assert_eq!(stream.bump(), Some('a'));
        assert_eq!(stream.bump(), Some('b'));
        assert_eq!(stream.bump(), None);
        assert!(stream.is_at_end());
    }

    #[test]
    fn test_utf8_boundaries() {
        let mut stream = CharStream::new("aλb");

        assert_eq!(stream.bump(), Some('a'));
        assert_eq!(stream.peek(), Some('λ'));
        assert_eq!(stream.bump(), Some('λ'));
        assert_eq!(stream.offset(), TextSize::from(3));
        assert_eq!(stream.bump(), Some('b'));
    }

    #[test]
    fn test_checkpoint_rewind_slice() {
        let mut stream = CharStream::new("hello world");
        let start = stream.checkpoint();

        for _ in 0..5 {
            stream.bump();
        }
        assert_eq!(stream.slice(start), "hello");

        let after_hello = stream.checkpoint();
        stream.bump();
        stream.bump();
        stream.rewind(after_hello);
        assert_eq!(stream.peek(), Some(' '));
        assert_eq!(stream.slice(start), "hello");
    }

    #[test]
    fn test_eat() {
        let mut stream = CharStream::new("=>");

        assert!(!stream.eat('>'));
        assert!(stream.eat('='));
        assert!(stream.eat('>'));
        assert!(stream.is_at_end());
    }
}
