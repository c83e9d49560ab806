//! MSL lexer
//!
//! Single left-to-right pass over the script text producing position-tagged
//! tokens. Invalid input never aborts lexing; it surfaces as `Invalid` tokens
//! which `validate` turns into diagnostics.

pub mod core;
pub mod error;
pub mod lexer;
pub mod msl;
pub mod scanner;

pub use core::{CharStream, SourcePosition, SourceSpan};
pub use error::{LexErrorKind, LexerError};
pub use lexer::{tokenize, validate, Lexer, MslToken};
pub use msl::MslScanner;
pub use scanner::Token;
