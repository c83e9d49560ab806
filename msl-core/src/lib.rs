//! MSL Core - macro scripting engine (pure logic, no IO)
//!
//! Contains the lexer, parser, AST tooling, and the interpreter.
//! Device side effects go through the `InputDevice` trait; this crate never
//! touches files or the terminal.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod compiler;
pub mod kit;
pub mod runtime;

// Re-export common types
pub use compiler::ast::{Ast, NodeId, NodeKind, Visitor};
pub use compiler::parser::{parse, ParseError, ParseErrorKind};
pub use kit::lexer::{tokenize, validate, LexerError, MslToken};
pub use runtime::{
    ExecutionError, ExecutionResult, InputDevice, Interpreter, RecordingDevice, Variables,
};

// Re-export config types from msl-config
pub use msl_config::{DelayMode, EngineConfig, LimitConfig, Phase};
