use crate::kit::lexer::SourcePosition;
use serde::Serialize;
use std::fmt;

/// Syntax error with location
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("[{location}] {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: ErrorLocation,
}

/// Where a syntax error was detected
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ErrorLocation {
    /// At the offending token
    At(SourcePosition),
    /// At the end of input; carries the end position
    Eof(SourcePosition),
}

impl ErrorLocation {
    pub fn position(&self) -> SourcePosition {
        match self {
            ErrorLocation::At(pos) | ErrorLocation::Eof(pos) => *pos,
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::At(pos) => write!(f, "{pos}"),
            ErrorLocation::Eof(pos) => write!(f, "EOF {pos}"),
        }
    }
}

/// Syntax error kinds
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("{}", unexpected_message(.found, .expected))]
    UnexpectedToken { found: String, expected: Vec<String> },
    /// A timing delimiter or postfix operator without its NUMBER
    #[error("Expected NUMBER after '{after}', found {found}")]
    MissingNumber { after: String, found: String },
    #[error("Unterminated '{open}', expected '{close}', found {found}")]
    Unterminated { open: char, close: char, found: String },
    /// Infix/postfix operator with no operand on one side
    #[error("Dangling operator '{operator}'")]
    DanglingOperator { operator: String },
    #[error("Unexpected {found} after end of expression")]
    TrailingTokens { found: String },
    #[error("Invalid character '{text}'")]
    InvalidCharacter { text: String },
    #[error("Invalid number '{text}'")]
    InvalidNumber { text: String },
    #[error("Repeat count must be a non-negative integer, found '{text}'")]
    InvalidRepeatCount { text: String },
    #[error("Negative value '{text}' is not allowed here")]
    NegativeValue { text: String },
    /// `<N>` not followed by a KEY or VARIABLE
    #[error("Fade '<{ms}>' must be followed by a KEY or VARIABLE, found {found}")]
    FadeWithoutTarget { ms: String, found: String },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput { expected: String },
    #[error("Nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

fn unexpected_message(found: &str, expected: &[String]) -> String {
    if expected.is_empty() {
        format!("Unexpected token {found}")
    } else {
        format!("Unexpected token {found}, expected: {}", expected.join(", "))
    }
}

impl ParseError {
    pub fn at(kind: ParseErrorKind, position: SourcePosition) -> Self {
        Self {
            kind,
            location: ErrorLocation::At(position),
        }
    }

    pub fn at_eof(kind: ParseErrorKind, position: SourcePosition) -> Self {
        Self {
            kind,
            location: ErrorLocation::Eof(position),
        }
    }

    pub fn position(&self) -> SourcePosition {
        self.location.position()
    }

    /// Line number (1-based)
    pub fn line(&self) -> usize {
        self.location.position().line
    }

    /// Column number (1-based)
    pub fn column(&self) -> usize {
        self.location.position().column
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.location, ErrorLocation::Eof(_))
    }
}

/// Parse result type
pub type ParseResult<T> = Result<T, ParseError>;

/// Helper: unexpected token error kind
pub fn unexpected_token(
    found: impl Into<String>,
    expected: Vec<impl Into<String>>,
) -> ParseErrorKind {
    ParseErrorKind::UnexpectedToken {
        found: found.into(),
        expected: expected.into_iter().map(Into::into).collect(),
    }
}
