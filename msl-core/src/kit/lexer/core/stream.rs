//! Character stream
//!
//! Wraps the script text and provides peek/advance with position tracking.
//! Scripts are short, so the whole input is decoded up front.

use super::position::SourcePosition;

/// Character stream over an in-memory script
pub struct CharStream<'a> {
    source: &'a str,
    chars: Vec<char>,
    index: usize,
    position: SourcePosition,
}

impl<'a> CharStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            index: 0,
            position: SourcePosition::start(),
        }
    }

    /// Current position (of the next unread character)
    pub fn position(&self) -> SourcePosition {
        self.position
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    /// Look at the n-th character ahead without consuming it
    pub fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.index + n).copied()
    }

    /// Consume one character
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.index += 1;
        self.position.advance(c);
        Some(c)
    }

    /// Consume `count` characters
    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// Whether the next character is `expected`
    pub fn check(&self, expected: char) -> bool {
        self.peek(0) == Some(expected)
    }

    /// Whether the upcoming characters spell `literal`
    pub fn starts_with(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek(i) == Some(c))
    }

    /// Count the run of characters matching `pred`, starting `from` chars ahead
    pub fn count_while(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while let Some(c) = self.peek(from + n) {
            if !pred(c) {
                break;
            }
            n += 1;
        }
        n
    }

    /// Source text between two byte offsets
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance() {
        let mut stream = CharStream::new("ab");
        assert_eq!(stream.peek(0), Some('a'));
        assert_eq!(stream.peek(1), Some('b'));
        assert_eq!(stream.peek(2), None);

        assert_eq!(stream.advance(), Some('a'));
        assert_eq!(stream.position().column, 2);
        assert_eq!(stream.advance(), Some('b'));
        assert_eq!(stream.advance(), None);
        assert!(stream.is_eof());
    }

    #[test]
    fn test_starts_with() {
        let stream = CharStream::new("wheel+3");
        assert!(stream.starts_with("wheel"));
        assert!(!stream.starts_with("wheels"));
    }

    #[test]
    fn test_count_while() {
        let stream = CharStream::new("1234ms");
        assert_eq!(stream.count_while(0, |c| c.is_ascii_digit()), 4);
        assert_eq!(stream.count_while(4, |c| c.is_ascii_digit()), 0);
    }

    #[test]
    fn test_slice_by_offsets() {
        let mut stream = CharStream::new("Ctrl+C");
        let start = stream.position().offset;
        stream.advance_by(4);
        let end = stream.position().offset;
        assert_eq!(stream.slice(start, end), "Ctrl");
    }
}
