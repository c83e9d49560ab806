//! API error types
//!
//! One error type for every phase, plus a structured report for tooling.

use msl_config::Phase;
use serde::Serialize;
use thiserror::Error;

pub use msl_core::compiler::parser::{ErrorLocation, ParseError};
pub use msl_core::kit::lexer::LexerError;

/// MSL error type
#[derive(Error, Debug, Clone)]
pub enum MslError {
    /// Lexical diagnostics, one per invalid token
    #[error("{}", join_diagnostics(.0))]
    Lexer(Vec<LexerError>),

    #[error("{0}")]
    Parser(#[from] ParseError),

    /// A run that ended unsuccessfully
    #[error("Execution error: {0}")]
    Execution(String),
}

fn join_diagnostics(errors: &[LexerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `UnexpectedToken { .. }` -> `UnexpectedToken`
fn variant_name(debug: &str) -> String {
    debug
        .split([' ', '{', '('])
        .next()
        .unwrap_or_default()
        .to_string()
}

impl MslError {
    /// Line of the (first) error, if it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            MslError::Lexer(errors) => errors.first().map(LexerError::line),
            MslError::Parser(e) => Some(e.line()),
            MslError::Execution(_) => None,
        }
    }

    /// Column of the (first) error, if it has one
    pub fn column(&self) -> Option<usize> {
        match self {
            MslError::Lexer(errors) => errors.first().map(LexerError::column),
            MslError::Parser(e) => Some(e.column()),
            MslError::Execution(_) => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            MslError::Lexer(_) => Phase::Lexer,
            MslError::Parser(_) => Phase::Parser,
            MslError::Execution(_) => Phase::Interpreter,
        }
    }

    /// Convert to a structured report
    ///
    /// The CLI prints it, tooling serializes it.
    ///
    /// # Example
    /// ```ignore
    /// if let Err(e) = engine.parse("A,") {
    ///     let report = e.to_report();
    ///     println!("{}", report);
    ///     let json = report.to_json()?;
    /// }
    /// ```
    pub fn to_report(&self) -> ErrorReport {
        match self {
            MslError::Lexer(errors) => {
                let first = errors.first();
                ErrorReport {
                    phase: Phase::Lexer.as_str(),
                    line: first.map(LexerError::line),
                    column: first.map(LexerError::column),
                    error_kind: first
                        .map(|e| variant_name(&format!("{:?}", e.kind)))
                        .unwrap_or_else(|| "LexerError".to_string()),
                    message: first.map(|e| e.message.clone()).unwrap_or_default(),
                    details: (errors.len() > 1).then(|| ErrorDetails::Diagnostics {
                        count: errors.len(),
                        messages: errors.iter().map(|e| e.message.clone()).collect(),
                    }),
                }
            }
            MslError::Parser(e) => {
                let location_type = match e.location {
                    ErrorLocation::At(_) => "at",
                    ErrorLocation::Eof(_) => "eof",
                };
                ErrorReport {
                    phase: Phase::Parser.as_str(),
                    line: Some(e.line()),
                    column: Some(e.column()),
                    error_kind: variant_name(&format!("{:?}", e.kind)),
                    message: e.kind.to_string(),
                    details: Some(ErrorDetails::Location { location_type }),
                }
            }
            MslError::Execution(msg) => ErrorReport {
                phase: Phase::Interpreter.as_str(),
                line: None,
                column: None,
                error_kind: "ExecutionError".to_string(),
                message: msg.clone(),
                details: None,
            },
        }
    }
}

/// Structured error report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// lexer, parser or interpreter
    pub phase: &'static str,
    /// 1-based line, if any
    pub line: Option<usize>,
    /// 1-based column, if any
    pub column: Option<usize>,
    /// Machine-readable error kind
    pub error_kind: String,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Extra report details
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetails {
    Location { location_type: &'static str },
    /// Every lexer diagnostic when there is more than one
    Diagnostics { count: usize, messages: Vec<String> },
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                write!(f, "[{}:{}] {} error: {}", line, col, self.phase, self.message)
            }
            _ => write!(f, "[{}] {} error: {}", self.phase, self.phase, self.message),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Short form for terminals
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
