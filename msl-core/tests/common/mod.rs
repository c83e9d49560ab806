//! Test helpers
//!
//! End-to-end helpers: script text in, recorded device calls out.

#![allow(dead_code)]

use msl_core::compiler::parser::parse;
use msl_core::runtime::{
    DeviceCall, ExecutionResult, Interpreter, RecordingDevice, Variables,
};
use msl_core::EngineConfig;
use std::sync::Arc;

/// Interpreter config with short pauses so tests stay fast
pub fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.timing.hold_chain_step_ms = 1;
    config.timing.continuous_cap_ms = 100;
    config.parallel.branch_timeout_ms = 2_000;
    config
}

/// Parse and run a script end to end
///
/// # Example
/// ```ignore
/// let run = run_script("A,B").unwrap();
/// assert_eq!(run.calls.len(), 2);
/// ```
pub fn run_script(script: &str) -> Result<Run, RunError> {
    run_on(script, RecordingDevice::new(), Variables::new(), fast_config())
}

/// Run against a prepared device, bindings, and config
pub fn run_on(
    script: &str,
    device: RecordingDevice,
    variables: Variables,
    config: EngineConfig,
) -> Result<Run, RunError> {
    let ast = parse(script).map_err(|e| RunError::Parser(e.to_string()))?;
    let device = Arc::new(device);
    let interpreter = Interpreter::with_config(device.clone(), config);
    let result = interpreter.execute(Arc::new(ast), variables);
    Ok(Run {
        calls: device.calls(),
        device,
        result,
    })
}

/// A device that fails its `n`-th call
pub fn failing_device(n: usize) -> RecordingDevice {
    RecordingDevice::new().failing_on_call(n)
}

/// Outcome of a run
#[derive(Debug)]
pub struct Run {
    pub result: ExecutionResult,
    /// Calls in the order the device saw them
    pub calls: Vec<DeviceCall>,
    pub device: Arc<RecordingDevice>,
}

#[derive(Debug)]
pub enum RunError {
    Parser(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Parser(msg) => write!(f, "Parser error: {msg}"),
        }
    }
}

impl std::error::Error for RunError {}

pub fn press(key: &str) -> DeviceCall {
    DeviceCall::Press(key.to_string())
}

pub fn down(key: &str) -> DeviceCall {
    DeviceCall::KeyDown(key.to_string())
}

pub fn up(key: &str) -> DeviceCall {
    DeviceCall::KeyUp(key.to_string())
}

/// Compact tree of a script, or the parse error text
pub fn compact(script: &str) -> String {
    match parse(script) {
        Ok(ast) => ast.to_string(),
        Err(e) => format!("error: {e}"),
    }
}
