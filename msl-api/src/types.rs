//! API input/output types

use crate::error::MslError;
use msl_core::compiler::ast::{Dependencies, NodeCounter};
use msl_core::{Ast, ExecutionResult};
use serde::Serialize;
use std::sync::Arc;

/// Result of checking a script without running it
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    /// Significant tokens (comments and the end sentinel excluded)
    pub tokens: usize,
    pub nodes: usize,
    pub dependencies: Dependencies,
}

/// Node statistics of a parsed script
#[derive(Debug, Clone, Serialize)]
pub struct ScriptStats {
    pub counts: NodeCounter,
    pub dependencies: Dependencies,
}

/// Output of a run
#[derive(Debug)]
pub struct RunOutput {
    pub ast: Arc<Ast>,
    /// `None` for a dry run
    pub result: Option<ExecutionResult>,
}

impl RunOutput {
    pub fn succeeded(&self) -> bool {
        self.result.as_ref().map_or(true, |r| r.success)
    }

    /// The run failure as an API error
    pub fn error(&self) -> Option<MslError> {
        let result = self.result.as_ref()?;
        if result.success {
            return None;
        }
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| "execution failed".to_string());
        Some(MslError::Execution(message))
    }
}
