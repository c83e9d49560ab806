//! Input device boundary
//!
//! The interpreter only talks to an [`InputDevice`]. OS-level injection
//! lives outside this crate; [`RecordingDevice`] is the in-memory double.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Failure reported by a device primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Keyboard/mouse capability driven by the interpreter.
///
/// Implementations must tolerate calls from several threads at once
/// (parallel branches).
pub trait InputDevice: Send + Sync {
    /// Press and release one key
    fn press(&self, key: &str) -> Result<(), DeviceError>;
    fn key_down(&self, key: &str) -> Result<(), DeviceError>;
    fn key_up(&self, key: &str) -> Result<(), DeviceError>;
    /// Move the pointer to absolute screen coordinates
    fn move_to(&self, x: i32, y: i32) -> Result<(), DeviceError>;
    /// Scroll the wheel, positive is up
    fn scroll(&self, amount: i32) -> Result<(), DeviceError>;
    /// Press all keys together as one atomic chord
    fn hotkey(&self, keys: &[String]) -> Result<(), DeviceError>;
}

/// One primitive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Press(String),
    KeyDown(String),
    KeyUp(String),
    MoveTo(i32, i32),
    Scroll(i32),
    Hotkey(Vec<String>),
}

impl DeviceCall {
    pub fn operation(&self) -> &'static str {
        match self {
            DeviceCall::Press(_) => "press",
            DeviceCall::KeyDown(_) => "key_down",
            DeviceCall::KeyUp(_) => "key_up",
            DeviceCall::MoveTo(..) => "move_to",
            DeviceCall::Scroll(_) => "scroll",
            DeviceCall::Hotkey(_) => "hotkey",
        }
    }

    /// Whether the call presses `key` (releases never count)
    fn presses(&self, key: &str) -> bool {
        match self {
            DeviceCall::Press(k) | DeviceCall::KeyDown(k) => k == key,
            DeviceCall::Hotkey(keys) => keys.iter().any(|k| k == key),
            _ => false,
        }
    }
}

/// A call with the time it was made, relative to device creation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub call: DeviceCall,
    pub at: Duration,
    /// `false` when the device was told to fail this call
    pub ok: bool,
}

/// Records every call; can be scripted to fail
#[derive(Debug)]
pub struct RecordingDevice {
    created: Instant,
    calls: Mutex<Vec<RecordedCall>>,
    seen: AtomicUsize,
    fail_on_call: Option<usize>,
    fail_on_key: Option<String>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
            calls: Mutex::new(Vec::new()),
            seen: AtomicUsize::new(0),
            fail_on_call: None,
            fail_on_key: None,
        }
    }

    /// Fail the `n`-th call (1-based)
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Fail every press, key-down, or chord involving `key`
    pub fn failing_on_key(mut self, key: impl Into<String>) -> Self {
        self.fail_on_key = Some(key.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: DeviceCall) -> Result<(), DeviceError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = self.fail_on_call == Some(n)
            || self.fail_on_key.as_deref().is_some_and(|key| call.presses(key));
        let error = fails.then(|| DeviceError::new(format!("{} #{n} rejected", call.operation())));
        self.lock().push(RecordedCall {
            call,
            at: self.created.elapsed(),
            ok: error.is_none(),
        });
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().iter().map(|r| r.call.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.lock().iter().filter(|r| predicate(&r.call)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl InputDevice for RecordingDevice {
    fn press(&self, key: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::Press(key.to_string()))
    }

    fn key_down(&self, key: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::KeyDown(key.to_string()))
    }

    fn key_up(&self, key: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::KeyUp(key.to_string()))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), DeviceError> {
        self.record(DeviceCall::MoveTo(x, y))
    }

    fn scroll(&self, amount: i32) -> Result<(), DeviceError> {
        self.record(DeviceCall::Scroll(amount))
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), DeviceError> {
        self.record(DeviceCall::Hotkey(keys.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let device = RecordingDevice::new();
        device.key_down("Shift").unwrap();
        device.press("A").unwrap();
        device.key_up("Shift").unwrap();
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::KeyDown("Shift".into()),
                DeviceCall::Press("A".into()),
                DeviceCall::KeyUp("Shift".into()),
            ]
        );
    }

    #[test]
    fn test_fail_on_nth_call() {
        let device = RecordingDevice::new().failing_on_call(2);
        assert!(device.press("A").is_ok());
        let err = device.press("B").unwrap_err();
        assert!(err.message.contains("press #2"));
        assert!(device.press("C").is_ok());

        let recorded = device.recorded();
        assert_eq!(recorded.len(), 3);
        assert!(!recorded[1].ok);
    }

    #[test]
    fn test_fail_on_key_spares_release() {
        let device = RecordingDevice::new().failing_on_key("X");
        assert!(device.press("X").is_err());
        assert!(device.hotkey(&["Ctrl".into(), "X".into()]).is_err());
        assert!(device.key_up("X").is_ok());
        assert!(device.press("Y").is_ok());
    }

    #[test]
    fn test_count_and_clear() {
        let device = RecordingDevice::new();
        device.scroll(3).unwrap();
        device.move_to(1, 2).unwrap();
        assert_eq!(device.count(|c| matches!(c, DeviceCall::Scroll(_))), 1);
        device.clear();
        assert!(device.calls().is_empty());
    }
}
