//! Per-run execution state

use super::error::ExecutionError;
use super::value::Variables;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Metric names reported in `ExecutionResult::metrics`
pub mod metric {
    pub const NODES_VISITED: &str = "nodes_visited";
    pub const DEVICE_CALLS: &str = "device_calls";
    pub const SLEEPS: &str = "sleeps";
    pub const SLEPT_MS: &str = "slept_ms";
    pub const PARALLEL_BRANCHES: &str = "parallel_branches";
    pub const BRANCH_FAILURES: &str = "branch_failures";
    pub const BRANCH_TIMEOUTS: &str = "branch_timeouts";
    pub const CONTINUOUS_ITERATIONS: &str = "continuous_iterations";
    pub const CONTINUOUS_CAPPED: &str = "continuous_capped";
}

/// Shared cooperative cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Named counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics(BTreeMap<String, u64>);

impl Metrics {
    pub fn incr(&mut self, name: &str, by: u64) {
        *self.0.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: Metrics) {
        for (name, value) in other.0 {
            *self.0.entry(name).or_insert(0) += value;
        }
    }

    pub fn into_map(self) -> BTreeMap<String, u64> {
        self.0
    }
}

/// State of one `execute` call.
///
/// Parallel branches work on a [`fork`](Self::fork) and are merged back on
/// join; only the cancel token and deadline are shared.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: Uuid,
    pub started: Instant,
    pub deadline: Option<Instant>,
    pub limit_ms: Option<u64>,
    pub cancel: CancelToken,
    pub variables: Arc<Variables>,
    /// Device primitives issued
    pub actions: u64,
    pub metrics: Metrics,
    /// Current variable-to-script expansion depth
    pub depth: usize,
}

impl ExecutionContext {
    pub fn new(variables: Arc<Variables>, cancel: CancelToken, limit_ms: Option<u64>) -> Self {
        let started = Instant::now();
        Self {
            run_id: Uuid::new_v4(),
            started,
            deadline: limit_ms.and_then(|ms| started.checked_add(Duration::from_millis(ms))),
            limit_ms,
            cancel,
            variables,
            actions: 0,
            metrics: Metrics::default(),
            depth: 0,
        }
    }

    /// Context for a parallel branch: same run, fresh counters
    pub fn fork(&self) -> Self {
        Self {
            actions: 0,
            metrics: Metrics::default(),
            ..self.clone()
        }
    }

    /// Fold a finished branch back in
    pub fn merge(&mut self, branch: ExecutionContext) {
        self.actions += branch.actions;
        self.metrics.merge(branch.metrics);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail once cancelled or past the deadline
    pub fn check(&self) -> Result<(), ExecutionError> {
        if self.cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        if let (Some(deadline), Some(limit_ms)) = (self.deadline, self.limit_ms) {
            if Instant::now() > deadline {
                return Err(ExecutionError::MaxDurationExceeded { limit_ms });
            }
        }
        Ok(())
    }

    /// Fail up front when a wait of `wait` would end past the deadline
    pub fn check_wait(&self, wait: Duration) -> Result<(), ExecutionError> {
        if let (Some(deadline), Some(limit_ms)) = (self.deadline, self.limit_ms) {
            let ends_late = Instant::now()
                .checked_add(wait)
                .map_or(true, |end| end > deadline);
            if ends_late {
                return Err(ExecutionError::MaxDurationExceeded { limit_ms });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(limit_ms: Option<u64>) -> ExecutionContext {
        ExecutionContext::new(Arc::new(Variables::new()), CancelToken::new(), limit_ms)
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_check_cancelled() {
        let ctx = context(None);
        assert!(ctx.check().is_ok());
        ctx.cancel.cancel();
        assert!(matches!(ctx.check(), Err(ExecutionError::Cancelled)));
    }

    #[test]
    fn test_check_deadline() {
        let ctx = context(Some(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            ctx.check(),
            Err(ExecutionError::MaxDurationExceeded { limit_ms: 0 })
        ));
    }

    #[test]
    fn test_check_wait_against_deadline() {
        let ctx = context(Some(60_000));
        assert!(ctx.check_wait(Duration::from_millis(10)).is_ok());
        assert!(matches!(
            ctx.check_wait(Duration::from_secs(120)),
            Err(ExecutionError::MaxDurationExceeded { limit_ms: 60_000 })
        ));
        assert!(ctx.check_wait(Duration::MAX).is_err());
        assert!(context(None).check_wait(Duration::MAX).is_ok());
    }

    #[test]
    fn test_unreachable_deadline_is_unbounded() {
        let ctx = context(Some(u64::MAX));
        assert_eq!(ctx.limit_ms, Some(u64::MAX));
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_fork_and_merge() {
        let mut ctx = context(None);
        ctx.actions = 3;
        ctx.metrics.incr(metric::DEVICE_CALLS, 3);

        let mut branch = ctx.fork();
        assert_eq!(branch.run_id, ctx.run_id);
        assert_eq!(branch.actions, 0);
        branch.actions = 2;
        branch.metrics.incr(metric::DEVICE_CALLS, 2);
        branch.metrics.incr(metric::SLEEPS, 1);

        ctx.merge(branch);
        assert_eq!(ctx.actions, 5);
        assert_eq!(ctx.metrics.get(metric::DEVICE_CALLS), 5);
        assert_eq!(ctx.metrics.get(metric::SLEEPS), 1);
    }

    #[test]
    fn test_fork_shares_cancel_token() {
        let ctx = context(None);
        let branch = ctx.fork();
        ctx.cancel.cancel();
        assert!(branch.cancel.is_cancelled());
    }
}
