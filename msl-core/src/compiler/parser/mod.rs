pub mod error;
pub mod parser;

pub use error::{ErrorLocation, ParseError, ParseErrorKind, ParseResult};
pub use parser::{parse, parse_tokens, parse_tokens_with, Parser};
