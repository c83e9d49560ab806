//! Console input device
//!
//! Prints each primitive instead of injecting it into the OS, so scripts
//! can be traced safely from a terminal.

use msl_core::runtime::{DeviceError, InputDevice};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Instant;

pub struct ConsoleDevice<W: Write + Send = io::Stdout> {
    started: Instant,
    out: Mutex<W>,
}

impl ConsoleDevice {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleDevice<W> {
    pub fn new(out: W) -> Self {
        Self {
            started: Instant::now(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) -> Result<(), DeviceError> {
        let elapsed = self.started.elapsed().as_millis();
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "[{elapsed:>6}ms] {line}")
            .and_then(|_| out.flush())
            .map_err(|e| DeviceError::new(format!("console write failed: {e}")))
    }
}

impl<W: Write + Send> InputDevice for ConsoleDevice<W> {
    fn press(&self, key: &str) -> Result<(), DeviceError> {
        self.emit(format_args!("press {key}"))
    }

    fn key_down(&self, key: &str) -> Result<(), DeviceError> {
        self.emit(format_args!("down  {key}"))
    }

    fn key_up(&self, key: &str) -> Result<(), DeviceError> {
        self.emit(format_args!("up    {key}"))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), DeviceError> {
        self.emit(format_args!("move  ({x}, {y})"))
    }

    fn scroll(&self, amount: i32) -> Result<(), DeviceError> {
        self.emit(format_args!("wheel {amount:+}"))
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), DeviceError> {
        self.emit(format_args!("chord {}", keys.join("+")))
    }
}
