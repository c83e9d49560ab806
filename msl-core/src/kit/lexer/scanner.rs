//! Token structure and character classes

use super::core::{SourcePosition, SourceSpan};
use serde::Serialize;

/// A classified, position-tagged lexical unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token<K> {
    pub kind: K,
    pub span: SourceSpan,
    /// Literal source text of the token
    pub text: String,
}

impl<K> Token<K> {
    pub fn new(kind: K, span: SourceSpan, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// Start position of the token
    pub fn start(&self) -> SourcePosition {
        self.span.start
    }

    pub fn end(&self) -> SourcePosition {
        self.span.end
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }

    /// Absolute byte offset of the first character
    pub fn offset(&self) -> usize {
        self.span.start.offset
    }
}

/// `[A-Za-z]`
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// `[A-Za-z0-9_]`
pub fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestToken {
        Plus,
    }

    #[test]
    fn test_token_accessors() {
        let start = SourcePosition::new(2, 4, 9);
        let end = SourcePosition::new(2, 5, 10);
        let token = Token::new(TestToken::Plus, SourceSpan::range(start, end), "+");
        assert_eq!(token.kind, TestToken::Plus);
        assert_eq!(token.line(), 2);
        assert_eq!(token.column(), 4);
        assert_eq!(token.offset(), 9);
        assert_eq!(token.text, "+");
    }

    #[test]
    fn test_is_identifier_start() {
        assert!(is_identifier_start('a'));
        assert!(is_identifier_start('Z'));
        assert!(!is_identifier_start('_'));
        assert!(!is_identifier_start('1'));
    }

    #[test]
    fn test_is_identifier_continue() {
        assert!(is_identifier_continue('a'));
        assert!(is_identifier_continue('1'));
        assert!(is_identifier_continue('_'));
        assert!(!is_identifier_continue('+'));
    }
}
