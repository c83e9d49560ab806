//! Lexer diagnostics
//!
//! The lexer never fails: unknown input becomes an `Invalid` token and
//! `validate` turns each one into a structured `LexerError`.

use super::core::SourcePosition;
use serde::Serialize;

/// Kind of lexical problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LexErrorKind {
    #[error("Invalid character '{0}'")]
    InvalidChar(char),
    /// `@` not followed by a well-formed `(x, y)` pair
    #[error("Malformed mouse coordinate, expected @(x, y)")]
    MalformedMouseCoord,
    /// `$` not followed by a variable name
    #[error("Expected variable name after '$'")]
    MissingVariableName,
    /// `-` outside of a numeric operand
    #[error("Unexpected sign '-', negative numbers are only allowed as operands")]
    MisplacedSign,
}

/// Lexical error with position
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("[{position}] {kind}")]
pub struct LexerError {
    pub kind: LexErrorKind,
    pub position: SourcePosition,
    pub message: String,
}

impl LexerError {
    pub fn at(kind: LexErrorKind, position: SourcePosition) -> Self {
        let message = format!("{} at {}:{}", kind, position.line, position.column);
        Self {
            kind,
            position,
            message,
        }
    }

    /// Classify the offending character of an `Invalid` token
    pub fn for_invalid(text: &str, position: SourcePosition) -> Self {
        let kind = match text.chars().next() {
            Some('@') => LexErrorKind::MalformedMouseCoord,
            Some('$') => LexErrorKind::MissingVariableName,
            Some('-') => LexErrorKind::MisplacedSign,
            Some(c) => LexErrorKind::InvalidChar(c),
            None => LexErrorKind::InvalidChar('\0'),
        };
        Self::at(kind, position)
    }

    /// Line number (1-based)
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Column number (1-based)
    pub fn column(&self) -> usize {
        self.position.column
    }
}
