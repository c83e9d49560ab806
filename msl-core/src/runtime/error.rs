use super::device::DeviceError;

/// Interpreter errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("Device {operation} failed: {source}")]
    Device {
        operation: &'static str,
        #[source]
        source: DeviceError,
    },
    #[error("Unresolved variable '${name}'")]
    UnresolvedVariable { name: String },
    #[error("Variable '${name}' expands deeper than {limit} levels")]
    RecursionLimit { name: String, limit: usize },
    #[error("Run exceeded the maximum duration of {limit_ms}ms")]
    MaxDurationExceeded { limit_ms: u64 },
    #[error("Wait of {ms}ms is out of range")]
    InvalidDuration { ms: f64 },
    /// Logged only; parallel failures never abort the run
    #[error("Parallel branch {index} failed: {source}")]
    BranchFailed {
        index: usize,
        #[source]
        source: Box<ExecutionError>,
    },
    #[error("Parallel branch {index} panicked: {message}")]
    BranchPanicked { index: usize, message: String },
    /// `stop()` was called; unwinds the walk and is reported as a successful,
    /// cancelled run
    #[error("Run cancelled")]
    Cancelled,
}

impl ExecutionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled)
    }
}

pub type ExecResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let err = ExecutionError::Device {
            operation: "press",
            source: DeviceError::new("no display"),
        };
        assert_eq!(err.to_string(), "Device press failed: no display");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unresolved_variable_display() {
        let err = ExecutionError::UnresolvedVariable { name: "combo".into() };
        assert_eq!(err.to_string(), "Unresolved variable '$combo'");
    }

    #[test]
    fn test_branch_failed_wraps_source() {
        let err = ExecutionError::BranchFailed {
            index: 2,
            source: Box::new(ExecutionError::UnresolvedVariable { name: "x".into() }),
        };
        assert!(err.to_string().starts_with("Parallel branch 2 failed"));
        assert!(!err.is_cancelled());
        assert!(ExecutionError::Cancelled.is_cancelled());
    }
}
