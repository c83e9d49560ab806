//! Character-level primitives shared by the scanner.

pub mod position;
pub mod stream;

pub use position::{SourcePosition, SourceSpan};
pub use stream::CharStream;
