use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one `execute` call
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub success: bool,
    /// Set when `stop()` ended the run early; still counts as success
    pub cancelled: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Device primitives issued, across all branches
    pub actions: u64,
    pub error: Option<String>,
    pub metrics: BTreeMap<String, u64>,
}

impl ExecutionResult {
    pub fn metric(&self, name: &str) -> u64 {
        self.metrics.get(name).copied().unwrap_or(0)
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
