//! MSL API - Execution orchestration layer
//!
//! Provides the unified entry points on top of `msl-core`:
//! - `Engine`, which owns an interpreter and a device
//! - Configuration (`RunConfig`) with an optional global singleton
//! - Unified error handling (`MslError`, `ErrorReport`)
//!
//! Library users should pass configuration explicitly; the global config
//! exists for the CLI.

use std::sync::Arc;
use tracing::{debug, info};

use msl_core::compiler::ast::{DependencyCollector, NodeCounter};
use msl_core::compiler::lexer::MslTokenKind;
use msl_core::runtime::CancelToken;
use msl_core::{Ast, ExecutionResult, InputDevice, Interpreter, MslToken, Variables};

pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

pub mod error;
pub mod types;
pub use error::{ErrorDetails, ErrorReport, MslError};
pub use types::{CheckOutput, RunOutput, ScriptStats};

pub use msl_config;
pub use msl_config::{DelayMode, EngineConfig, Phase};

const TARGET: &str = "msl::api";

/// Tokenize a script, failing on any lexical diagnostic
pub fn tokenize(source: &str) -> Result<Vec<MslToken>, MslError> {
    let tokens = msl_core::tokenize(source);
    let diagnostics = msl_core::validate(&tokens);
    if diagnostics.is_empty() {
        Ok(tokens)
    } else {
        Err(MslError::Lexer(diagnostics))
    }
}

/// Parse a script into an AST
///
/// Lexical problems are reported all at once before parsing starts.
pub fn parse(source: &str) -> Result<Ast, MslError> {
    parse_with(source, &msl_config::LimitConfig::default())
}

/// Parse a script under explicit limits
pub fn parse_with(source: &str, limits: &msl_config::LimitConfig) -> Result<Ast, MslError> {
    let tokens = tokenize(source)?;
    let ast = msl_core::compiler::parser::parse_tokens_with(tokens, limits)?;
    debug!(target: TARGET, nodes = ast.len(), "script parsed");
    Ok(ast)
}

/// Check a script without running it
pub fn check(source: &str) -> Result<CheckOutput, MslError> {
    let tokens = tokenize(source)?;
    let significant = tokens
        .iter()
        .filter(|t| !matches!(t.kind, MslTokenKind::Comment | MslTokenKind::Eof))
        .count();
    let ast = msl_core::compiler::parser::parse_tokens(tokens)?;
    Ok(CheckOutput {
        tokens: significant,
        nodes: ast.len(),
        dependencies: DependencyCollector::collect(&ast),
    })
}

/// Node statistics of a script
pub fn stats(source: &str) -> Result<ScriptStats, MslError> {
    let ast = parse(source)?;
    Ok(ScriptStats {
        counts: NodeCounter::count(&ast),
        dependencies: DependencyCollector::collect(&ast),
    })
}

/// Parse and run with explicit configuration
pub fn run(
    source: &str,
    device: Arc<dyn InputDevice>,
    variables: Variables,
    config: &RunConfig,
) -> Result<RunOutput, MslError> {
    Engine::new(device, config.clone()).run(source, variables)
}

/// Parse and run with the global config
pub fn quick_run(source: &str, device: Arc<dyn InputDevice>) -> Result<RunOutput, MslError> {
    run(source, device, Variables::new(), get_config())
}

/// Interpreter bound to a device and a configuration
///
/// `stop` may be called from any thread while `run` or `execute` is in
/// progress on another.
pub struct Engine {
    interpreter: Interpreter,
    config: RunConfig,
}

impl Engine {
    pub fn new(device: Arc<dyn InputDevice>, config: RunConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(device, config.engine.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn parse(&self, source: &str) -> Result<Arc<Ast>, MslError> {
        parse_with(source, &self.config.engine.limits).map(Arc::new)
    }

    pub fn check(&self, source: &str) -> Result<CheckOutput, MslError> {
        check(source)
    }

    pub fn execute(&self, ast: Arc<Ast>, variables: Variables) -> ExecutionResult {
        self.interpreter.execute(ast, variables)
    }

    /// Parse, then execute unless this is a dry run
    pub fn run(&self, source: &str, variables: Variables) -> Result<RunOutput, MslError> {
        let ast = self.parse(source)?;
        if self.config.show_tree {
            info!(target: TARGET, "\n{}", ast.tree_string());
        }
        if self.config.dry_run {
            info!(target: TARGET, nodes = ast.len(), "dry run, execution skipped");
            return Ok(RunOutput { ast, result: None });
        }

        let result = self.execute(Arc::clone(&ast), variables);
        Ok(RunOutput {
            ast,
            result: Some(result),
        })
    }

    pub fn stop(&self) {
        self.interpreter.stop();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.interpreter.cancel_token()
    }
}
