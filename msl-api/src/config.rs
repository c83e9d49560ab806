//! API layer configuration
//!
//! `RunConfig` plus a process-wide singleton for the CLI.

use msl_config::EngineConfig;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Execution configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Log the parsed tree before running
    pub show_tree: bool,
    /// Parse and validate only, never touch the device
    pub dry_run: bool,
    /// Interpreter configuration
    pub engine: EngineConfig,
}

impl RunConfig {
    pub fn with_engine(engine: EngineConfig) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }
}

static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize the global configuration
///
/// Returns the rejected config if one was already installed.
pub fn init(config: RunConfig) -> Result<(), RunConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Global config, installing the default on first use
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use msl_config::DelayMode;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert!(!cfg.show_tree);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.engine.parallel.max_workers, 10);
        assert_eq!(cfg.engine.limits.max_recursion_depth, 32);
    }

    #[test]
    fn test_run_config_from_json() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{ "dry_run": true, "engine": { "timing": { "delay_mode": "wait_only" } } }"#,
        )
        .unwrap();
        assert!(cfg.dry_run);
        assert_eq!(cfg.engine.timing.delay_mode, DelayMode::WaitOnly);
        assert_eq!(cfg.engine.timing.hold_chain_step_ms, 50);
    }

    #[test]
    fn test_global_config_init_once() {
        // Global state is shared by every test in this binary
        let _ = init(RunConfig::default());
        assert!(is_initialized());
        assert!(init(RunConfig::default()).is_err());
        assert_eq!(config(), &RunConfig::default());
    }
}
