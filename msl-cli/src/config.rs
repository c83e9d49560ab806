//! CLI configuration
//!
//! Log levels per phase plus loading of the JSON run configuration.

use msl_api::{Phase, RunConfig};
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub lexer: Option<Level>,
    pub parser: Option<Level>,
    pub interpreter: Option<Level>,
    pub api: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            lexer: None,
            parser: None,
            interpreter: None,
            api: None,
        }
    }
}

impl LogConfig {
    pub fn with_global(global: Level) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Effective level for a phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let specific = match phase {
            Phase::Lexer => self.lexer,
            Phase::Parser => self.parser,
            Phase::Interpreter => self.interpreter,
            Phase::Api => self.api,
            Phase::Cli => None,
        };
        specific.unwrap_or(self.global)
    }

    pub fn set(&mut self, phase: Phase, level: Level) {
        match phase {
            Phase::Lexer => self.lexer = Some(level),
            Phase::Parser => self.parser = Some(level),
            Phase::Interpreter => self.interpreter = Some(level),
            Phase::Api => self.api = Some(level),
            Phase::Cli => self.global = level,
        }
    }

    /// Apply a `phase=level` override such as `parser=debug`
    pub fn apply_override(&mut self, directive: &str) -> Result<(), String> {
        let (phase, level) = directive
            .split_once('=')
            .ok_or_else(|| format!("expected PHASE=LEVEL, got '{directive}'"))?;
        let phase = parse_phase(phase.trim())?;
        let level = Level::from_str(level.trim())
            .map_err(|_| format!("unknown log level '{}'", level.trim()))?;
        self.set(phase, level);
        Ok(())
    }
}

fn parse_phase(name: &str) -> Result<Phase, String> {
    Phase::ALL
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("unknown phase '{name}'"))
}

/// Load a run configuration from a JSON file
pub fn load_run_config(path: &Path) -> Result<RunConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Cannot parse config '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let mut cfg = LogConfig::with_global(Level::INFO);
        cfg.parser = Some(Level::TRACE);
        assert_eq!(cfg.level_for(Phase::Parser), Level::TRACE);
        assert_eq!(cfg.level_for(Phase::Interpreter), Level::INFO);
        assert_eq!(cfg.level_for(Phase::Cli), Level::INFO);
    }

    #[test]
    fn test_apply_override() {
        let mut cfg = LogConfig::default();
        cfg.apply_override("interpreter=debug").unwrap();
        assert_eq!(cfg.interpreter, Some(Level::DEBUG));
        assert!(cfg.apply_override("vm=debug").is_err());
        assert!(cfg.apply_override("lexer").is_err());
        assert!(cfg.apply_override("lexer=loud").is_err());
    }
}
