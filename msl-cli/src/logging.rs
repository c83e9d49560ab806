//! CLI logging setup
//!
//! Per-phase filtering on top of `tracing-subscriber`. Logs go to stderr so
//! command output on stdout stays machine-readable.

use crate::config::LogConfig;
use msl_api::Phase;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    Compact,
    /// One JSON object per event
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Cannot open log file: {0}")]
    File(#[from] io::Error),
    #[error("Logger already installed: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Target filter built from the per-phase levels
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL.into_iter().fold(
        Targets::new().with_default(log_config.global),
        |targets, phase| targets.with_target(phase.target(), log_config.level_for(phase)),
    )
}

/// Install the global subscriber, optionally teeing to a file
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> Result<(), LoggingError> {
    let targets = targets(log_config);
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> =
        vec![create_format_layer(format, io::stderr)
            .with_filter(targets.clone())
            .boxed()];

    if let Some(path) = file {
        let file_handle = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file_handle))
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_targets_respect_phase_overrides() {
        let mut cfg = LogConfig::with_global(Level::WARN);
        cfg.parser = Some(Level::DEBUG);
        let targets = targets(&cfg);
        assert!(targets.would_enable("msl::parser", &Level::DEBUG));
        assert!(!targets.would_enable("msl::lexer", &Level::DEBUG));
        assert!(targets.would_enable("msl::interpreter", &Level::WARN));
        assert!(!targets.would_enable("other", &Level::INFO));
    }
}
