//! MSL Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all MSL crates.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parallel: ParallelConfig,
    pub timing: TimingConfig,
    pub limits: LimitConfig,
}

/// Configuration for `|` branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Maximum number of branch workers running at once
    pub max_workers: usize,
    /// Join timeout for each branch, in milliseconds
    pub branch_timeout_ms: u64,
}

/// Timing behavior of the interpreter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Hard wall-clock cap for continuous fire (`&`), in milliseconds
    pub continuous_cap_ms: u64,
    /// Pause between the steps of a hold chain (`>`), in milliseconds
    pub hold_chain_step_ms: u64,
    /// What a `(N)` delay does with the action it wraps
    pub delay_mode: DelayMode,
}

/// Semantics of the `(N)` delay modifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayMode {
    /// Run the wrapped action, then wait
    #[default]
    ActionThenWait,
    /// Only wait; the wrapped action is not executed
    WaitOnly,
}

/// Configuration for execution limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum wall-clock duration of a single run (`None` disables the guard)
    pub max_duration_ms: Option<u64>,
    /// Maximum depth of variable-to-script expansion
    pub max_recursion_depth: usize,
    /// Maximum height of a parsed tree, counting groups and modifiers
    pub max_nesting_depth: usize,
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexer,
    Parser,
    Interpreter,
    Api,
    Cli,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Lexer,
        Phase::Parser,
        Phase::Interpreter,
        Phase::Api,
        Phase::Cli,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Interpreter => "interpreter",
            Phase::Api => "api",
            Phase::Cli => "cli",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("msl::{}", self.as_str())
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            branch_timeout_ms: 10_000,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            continuous_cap_ms: 10_000,
            hold_chain_step_ms: 50,
            delay_mode: DelayMode::default(),
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: Some(300_000),
            max_recursion_depth: 32,
            max_nesting_depth: 128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parallel_config() {
        let cfg = ParallelConfig::default();
        assert_eq!(cfg.max_workers, 10);
        assert_eq!(cfg.branch_timeout_ms, 10_000);
    }

    #[test]
    fn test_default_timing_config() {
        let cfg = TimingConfig::default();
        assert_eq!(cfg.continuous_cap_ms, 10_000);
        assert_eq!(cfg.hold_chain_step_ms, 50);
        assert_eq!(cfg.delay_mode, DelayMode::ActionThenWait);
    }

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.max_duration_ms, Some(300_000));
        assert_eq!(cfg.max_recursion_depth, 32);
        assert_eq!(cfg.max_nesting_depth, 128);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Interpreter.target(), "msl::interpreter");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "timing": { "delay_mode": "wait_only" } }"#).unwrap();
        assert_eq!(cfg.timing.delay_mode, DelayMode::WaitOnly);
        assert_eq!(cfg.timing.continuous_cap_ms, 10_000);
        assert_eq!(cfg.parallel, ParallelConfig::default());
    }

    #[test]
    fn test_disable_duration_guard() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "limits": { "max_duration_ms": null } }"#).unwrap();
        assert_eq!(cfg.limits.max_duration_ms, None);
        assert_eq!(cfg.limits.max_recursion_depth, 32);
    }

    #[test]
    fn test_nesting_depth_from_json() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "limits": { "max_nesting_depth": 16 } }"#).unwrap();
        assert_eq!(cfg.limits.max_nesting_depth, 16);
        assert_eq!(cfg.limits.max_duration_ms, Some(300_000));
    }
}
