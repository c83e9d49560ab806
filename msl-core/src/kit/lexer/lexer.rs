//! Lexer entry point
//!
//! ```rust,ignore
//! use msl_core::kit::lexer::Lexer;
//!
//! let tokens = Lexer::tokenize("Ctrl+C, Ctrl+V");
//! let diagnostics = Lexer::validate(&tokens);
//! assert!(diagnostics.is_empty());
//! ```

use super::core::CharStream;
use super::error::LexerError;
use super::msl::MslScanner;
use super::scanner::Token;
use crate::compiler::lexer::token_kind::MslTokenKind;
use tracing::debug;

/// Token type produced by the MSL lexer
pub type MslToken = Token<MslTokenKind>;

/// Single-pass MSL lexer
pub struct Lexer;

impl Lexer {
    /// Convert script text into a position-tagged token stream.
    ///
    /// The stream always ends with an `Eof` sentinel. Comments are kept as
    /// `Comment` tokens; whitespace produces no tokens.
    pub fn tokenize(text: &str) -> Vec<MslToken> {
        let mut stream = CharStream::new(text);
        let mut scanner = MslScanner::new();
        let mut tokens = Vec::new();

        loop {
            let token = scanner.next_token(&mut stream);
            let is_eof = token.kind == MslTokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        debug!(
            target: "msl::lexer",
            tokens = tokens.len(),
            invalid = tokens.iter().filter(|t| t.kind == MslTokenKind::Invalid).count(),
            "Tokenized script"
        );
        tokens
    }

    /// Report every `Invalid` token with its line/column.
    ///
    /// No bracket matching happens here, that is the parser's job.
    pub fn validate(tokens: &[MslToken]) -> Vec<LexerError> {
        tokens
            .iter()
            .filter(|t| t.kind == MslTokenKind::Invalid)
            .map(|t| LexerError::for_invalid(&t.text, t.start()))
            .collect()
    }
}

/// Shorthand for [`Lexer::tokenize`]
pub fn tokenize(text: &str) -> Vec<MslToken> {
    Lexer::tokenize(text)
}

/// Shorthand for [`Lexer::validate`]
pub fn validate(tokens: &[MslToken]) -> Vec<LexerError> {
    Lexer::validate(tokens)
}
