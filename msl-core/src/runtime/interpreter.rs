//! Tree-walking interpreter
//!
//! One [`Walker`] per `execute` call walks the tree through the visitor
//! contract and drives the [`InputDevice`]. Parallel branches get their own
//! walker on a forked context; results come back over a channel and are
//! merged on join.

use super::context::{metric, CancelToken, ExecutionContext};
use super::device::{DeviceError, InputDevice};
use super::error::{ExecResult, ExecutionError};
use super::pool::BranchPool;
use super::result::ExecutionResult;
use super::value::{Binding, Value, Variables};
use crate::compiler::ast::{Ast, NodeId, NodeKind, Visitor, WheelDirection};
use crossbeam_channel::{unbounded, RecvTimeoutError};
use msl_config::{DelayMode, EngineConfig};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TARGET: &str = "msl::interpreter";

/// Parallel branches walk the tree recursively like the caller does
const BRANCH_STACK_BYTES: usize = 8 * 1024 * 1024;

/// State shared by every walker of one interpreter
struct Shared {
    device: Arc<dyn InputDevice>,
    config: EngineConfig,
    pool: BranchPool,
}

/// Executes parsed scripts against an input device
pub struct Interpreter {
    shared: Arc<Shared>,
    cancel: CancelToken,
}

impl Interpreter {
    pub fn new(device: Arc<dyn InputDevice>) -> Self {
        Self::with_config(device, EngineConfig::default())
    }

    pub fn with_config(device: Arc<dyn InputDevice>, config: EngineConfig) -> Self {
        let pool = BranchPool::new(config.parallel.max_workers);
        Self {
            shared: Arc::new(Shared {
                device,
                config,
                pool,
            }),
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Token observed by every run of this interpreter
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation of the current run. In-flight sleeps and device
    /// calls finish; no further node starts.
    pub fn stop(&self) {
        info!(target: TARGET, "Stop requested");
        self.cancel.cancel();
    }

    /// Run `ast` to completion, cancellation, or the first error.
    ///
    /// Clears a previous `stop()` request before starting.
    pub fn execute(&self, ast: Arc<Ast>, variables: Variables) -> ExecutionResult {
        self.cancel.reset();
        let ctx = ExecutionContext::new(
            Arc::new(variables),
            self.cancel.clone(),
            self.shared.config.limits.max_duration_ms,
        );
        let run_id = ctx.run_id;
        info!(target: TARGET, %run_id, nodes = ast.len(), "Run started");

        let mut walker = Walker {
            shared: Arc::clone(&self.shared),
            program: Arc::clone(&ast),
            ctx,
        };
        let outcome = match ast.root() {
            Some(root) => walker.eval(root),
            None => Ok(Value::Unit),
        };

        let ctx = walker.ctx;
        let elapsed = ctx.elapsed();
        let (success, cancelled, error) = match outcome {
            Ok(_) => (true, false, None),
            Err(ExecutionError::Cancelled) => {
                warn!(target: TARGET, %run_id, "Run cancelled");
                (true, true, None)
            }
            Err(err) => (false, false, Some(err.to_string())),
        };

        info!(
            target: TARGET,
            %run_id,
            success,
            cancelled,
            actions = ctx.actions,
            elapsed_ms = elapsed.as_millis() as u64,
            error = error.as_deref().unwrap_or(""),
            "Run finished"
        );

        ExecutionResult {
            run_id,
            success,
            cancelled,
            elapsed,
            actions: ctx.actions,
            error,
            metrics: ctx.metrics.into_map(),
        }
    }
}

/// Outcome of one spawned parallel branch
struct BranchReport {
    index: usize,
    outcome: thread::Result<ExecResult<Value>>,
    ctx: ExecutionContext,
}

/// Walks one tree (or one parallel branch of it)
struct Walker {
    shared: Arc<Shared>,
    /// Tree the current node ids belong to; swapped while a variable's
    /// script is being evaluated
    program: Arc<Ast>,
    ctx: ExecutionContext,
}

impl Walker {
    fn eval(&mut self, id: NodeId) -> ExecResult<Value> {
        let program = Arc::clone(&self.program);
        program.accept(id, self)
    }

    fn eval_children(&mut self, ast: &Ast, id: NodeId) -> ExecResult<Value> {
        for &child in ast.children(id) {
            self.eval(child)?;
        }
        Ok(Value::Unit)
    }

    fn fork(&self) -> Walker {
        Walker {
            shared: Arc::clone(&self.shared),
            program: Arc::clone(&self.program),
            ctx: self.ctx.fork(),
        }
    }

    /// Start of every visit: count the node, honor cancel and deadline
    fn enter(&mut self) -> ExecResult<()> {
        self.ctx.metrics.incr(metric::NODES_VISITED, 1);
        self.ctx.check()
    }

    fn device(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&dyn InputDevice) -> Result<(), DeviceError>,
    ) -> ExecResult<()> {
        self.ctx.actions += 1;
        self.ctx.metrics.incr(metric::DEVICE_CALLS, 1);
        call(self.shared.device.as_ref())
            .map_err(|source| ExecutionError::Device { operation, source })
    }

    /// Wait `ms` milliseconds; a wait that cannot end before the deadline
    /// fails without sleeping
    fn sleep(&mut self, ms: f64) -> ExecResult<()> {
        if ms.is_nan() || ms <= 0.0 {
            return Ok(());
        }
        let wait = Duration::try_from_secs_f64(ms / 1000.0)
            .map_err(|_| ExecutionError::InvalidDuration { ms })?;
        self.ctx.check_wait(wait)?;
        self.ctx.metrics.incr(metric::SLEEPS, 1);
        self.ctx.metrics.incr(metric::SLEPT_MS, ms.round() as u64);
        thread::sleep(wait);
        Ok(())
    }

    /// Key name when `id` is a plain key, or a variable bound to a script
    /// that is a single key
    fn key_of(&self, ast: &Ast, id: NodeId) -> Option<String> {
        match ast.kind(id) {
            NodeKind::Key { name } => Some(name.clone()),
            NodeKind::Variable { name } => match self.ctx.variables.get(name) {
                Some(Binding::Script(script)) => {
                    script.root().and_then(|root| script.as_key(root)).map(str::to_string)
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn hold_key(&mut self, key: &str, ms: f64) -> ExecResult<()> {
        debug!(target: TARGET, key, ms, "key_down");
        self.device("key_down", |d| d.key_down(key))?;
        let waited = self.sleep(ms);
        debug!(target: TARGET, key, "key_up");
        let released = self.device("key_up", |d| d.key_up(key));
        waited.and(released)
    }

    fn run_chain(&mut self, steps: &[NodeId]) -> ExecResult<()> {
        let step_ms = self.shared.config.timing.hold_chain_step_ms as f64;
        for &step in steps {
            self.sleep(step_ms)?;
            self.eval(step)?;
        }
        Ok(())
    }

    /// Fold a branch's outcome into this walker; failures are only logged
    fn absorb(&mut self, report: BranchReport) {
        let BranchReport { index, outcome, ctx } = report;
        self.ctx.merge(ctx);
        let failure = match outcome {
            Ok(Ok(_)) | Ok(Err(ExecutionError::Cancelled)) => return,
            Ok(Err(err)) => ExecutionError::BranchFailed {
                index,
                source: Box::new(err),
            },
            Err(payload) => ExecutionError::BranchPanicked {
                index,
                message: panic_message(payload.as_ref()),
            },
        };
        self.ctx.metrics.incr(metric::BRANCH_FAILURES, 1);
        warn!(
            target: TARGET,
            run_id = %self.ctx.run_id,
            index,
            error = %failure,
            "Parallel branch failed"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Visitor for Walker {
    type Output = ExecResult<Value>;

    fn visit_key(&mut self, _: &Ast, _: NodeId, name: &str) -> Self::Output {
        self.enter()?;
        debug!(target: TARGET, key = name, "press");
        self.device("press", |d| d.press(name))?;
        Ok(Value::Unit)
    }

    fn visit_number(&mut self, _: &Ast, _: NodeId, value: f64) -> Self::Output {
        self.enter()?;
        Ok(Value::Number(value))
    }

    fn visit_variable(&mut self, _: &Ast, _: NodeId, name: &str) -> Self::Output {
        self.enter()?;
        let binding = self
            .ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionError::UnresolvedVariable {
                name: name.to_string(),
            })?;
        match binding {
            Binding::Literal(text) => Ok(Value::Text(text)),
            Binding::Script(script) => {
                let limit = self.shared.config.limits.max_recursion_depth;
                if self.ctx.depth >= limit {
                    return Err(ExecutionError::RecursionLimit {
                        name: name.to_string(),
                        limit,
                    });
                }
                let Some(root) = script.root() else {
                    return Ok(Value::Unit);
                };
                let saved = std::mem::replace(&mut self.program, Arc::clone(&script));
                self.ctx.depth += 1;
                let result = script.accept(root, self);
                self.ctx.depth -= 1;
                self.program = saved;
                result
            }
        }
    }

    fn visit_mouse_coord(&mut self, _: &Ast, _: NodeId, x: i32, y: i32) -> Self::Output {
        self.enter()?;
        debug!(target: TARGET, x, y, "move_to");
        self.device("move_to", |d| d.move_to(x, y))?;
        Ok(Value::Unit)
    }

    fn visit_wheel(
        &mut self,
        _: &Ast,
        _: NodeId,
        direction: WheelDirection,
        amount: u32,
    ) -> Self::Output {
        self.enter()?;
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let amount = match direction {
            WheelDirection::Up => amount,
            WheelDirection::Down => -amount,
        };
        debug!(target: TARGET, amount, "scroll");
        self.device("scroll", |d| d.scroll(amount))?;
        Ok(Value::Unit)
    }

    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        self.eval_children(ast, id)
    }

    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        let (keys, rest): (Vec<NodeId>, Vec<NodeId>) = ast
            .children(id)
            .iter()
            .copied()
            .partition(|&child| matches!(ast.kind(child), NodeKind::Key { .. }));

        let names: Vec<String> = keys
            .iter()
            .filter_map(|&key| ast.as_key(key).map(str::to_string))
            .collect();
        if !names.is_empty() {
            debug!(target: TARGET, keys = ?names, "hotkey");
            self.device("hotkey", |d| d.hotkey(&names))?;
        }
        for child in rest {
            self.eval(child)?;
        }
        Ok(Value::Unit)
    }

    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        let children = ast.children(id);
        let Some((&first, steps)) = children.split_first() else {
            return Ok(Value::Unit);
        };
        let Some(key) = self.key_of(ast, first) else {
            return self.eval_children(ast, id);
        };

        debug!(target: TARGET, key = %key, steps = steps.len(), "key_down (chain)");
        self.device("key_down", |d| d.key_down(&key))?;
        let outcome = self.run_chain(steps);
        debug!(target: TARGET, key = %key, "key_up (chain)");
        let released = self.device("key_up", |d| d.key_up(&key));
        outcome?;
        released?;
        Ok(Value::Unit)
    }

    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        let children = ast.children(id).to_vec();
        let timeout = Duration::from_millis(self.shared.config.parallel.branch_timeout_ms);
        let (sender, receiver) = unbounded::<BranchReport>();
        let mut spawned = 0usize;

        for (index, &child) in children.iter().enumerate() {
            self.ctx.metrics.incr(metric::PARALLEL_BRANCHES, 1);
            let mut branch = self.fork();

            let Some(permit) = self.shared.pool.try_acquire() else {
                debug!(target: TARGET, index, "No free worker, running branch inline");
                let outcome = Ok(branch.eval(child));
                self.absorb(BranchReport {
                    index,
                    outcome,
                    ctx: branch.ctx,
                });
                continue;
            };

            let sender = sender.clone();
            let spawn = thread::Builder::new()
                .name(format!("msl-branch-{index}"))
                .stack_size(BRANCH_STACK_BYTES)
                .spawn(move || {
                    let _permit = permit;
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| branch.eval(child)));
                    let _ = sender.send(BranchReport {
                        index,
                        outcome,
                        ctx: branch.ctx,
                    });
                });
            match spawn {
                Ok(_) => spawned += 1,
                Err(err) => {
                    warn!(
                        target: TARGET,
                        index,
                        error = %err,
                        "Branch thread failed to start, running inline"
                    );
                    let mut branch = self.fork();
                    let outcome = Ok(branch.eval(child));
                    self.absorb(BranchReport {
                        index,
                        outcome,
                        ctx: branch.ctx,
                    });
                }
            }
        }
        drop(sender);

        let join_deadline = Instant::now() + timeout;
        let mut joined = 0usize;
        while joined < spawned {
            let remaining = join_deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok(report) => {
                    joined += 1;
                    self.absorb(report);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let missing = (spawned - joined) as u64;
                    self.ctx.metrics.incr(metric::BRANCH_TIMEOUTS, missing);
                    warn!(
                        target: TARGET,
                        run_id = %self.ctx.run_id,
                        missing,
                        timeout_ms = timeout.as_millis() as u64,
                        "Parallel branches did not join in time"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.ctx.check()?;
        Ok(Value::Unit)
    }

    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        match ast.children(id).first() {
            Some(&target) => self.eval(target),
            None => Ok(Value::Unit),
        }
    }

    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, count: u32) -> Self::Output {
        self.enter()?;
        let children = ast.children(id);
        let Some(&action) = children.first() else {
            return Ok(Value::Unit);
        };
        let interval = children.iter().skip(1).find_map(|&c| match ast.kind(c) {
            NodeKind::Interval { ms } => Some(*ms),
            _ => None,
        });

        for i in 0..count {
            if i > 0 {
                if let Some(ms) = interval {
                    self.sleep(ms)?;
                }
            }
            self.eval(action)?;
        }
        Ok(Value::Unit)
    }

    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, interval: f64) -> Self::Output {
        self.enter()?;
        let Some(&action) = ast.children(id).first() else {
            return Ok(Value::Unit);
        };
        let cap = Duration::from_millis(self.shared.config.timing.continuous_cap_ms);
        // An interval too large to represent never fits under the cap
        let spacing =
            Duration::try_from_secs_f64(interval.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
        let started = Instant::now();

        loop {
            self.ctx.check()?;
            self.eval(action)?;
            self.ctx.metrics.incr(metric::CONTINUOUS_ITERATIONS, 1);
            if started.elapsed().saturating_add(spacing) >= cap {
                self.ctx.metrics.incr(metric::CONTINUOUS_CAPPED, 1);
                warn!(
                    target: TARGET,
                    run_id = %self.ctx.run_id,
                    cap_ms = cap.as_millis() as u64,
                    "Continuous fire reached its safety cap"
                );
                return Ok(Value::Unit);
            }
            self.sleep(interval)?;
        }
    }

    fn visit_delay(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output {
        self.enter()?;
        if self.shared.config.timing.delay_mode == DelayMode::ActionThenWait {
            self.eval_children(ast, id)?;
        }
        self.sleep(ms)?;
        Ok(Value::Unit)
    }

    fn visit_hold(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output {
        self.enter()?;
        let Some(&target) = ast.children(id).first() else {
            return Ok(Value::Unit);
        };
        match self.key_of(ast, target) {
            Some(key) => {
                self.hold_key(&key, ms)?;
                Ok(Value::Unit)
            }
            None => self.eval(target),
        }
    }

    fn visit_interval(&mut self, _: &Ast, _: NodeId, _: f64) -> Self::Output {
        self.enter()?;
        Ok(Value::Unit)
    }

    fn visit_fade(&mut self, ast: &Ast, id: NodeId, _: f64) -> Self::Output {
        self.enter()?;
        self.eval_children(ast, id)
    }

    fn visit_group(&mut self, ast: &Ast, id: NodeId) -> Self::Output {
        self.enter()?;
        self.eval_children(ast, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse;
    use crate::runtime::device::{DeviceCall, RecordingDevice};

    fn fast_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.timing.hold_chain_step_ms = 0;
        config.timing.continuous_cap_ms = 50;
        config
    }

    fn run_with(
        script: &str,
        device: RecordingDevice,
        variables: Variables,
    ) -> (ExecutionResult, Arc<RecordingDevice>) {
        let device = Arc::new(device);
        let interpreter = Interpreter::with_config(device.clone(), fast_config());
        let ast = Arc::new(parse(script).unwrap());
        (interpreter.execute(ast, variables), device)
    }

    fn run(script: &str) -> (ExecutionResult, Arc<RecordingDevice>) {
        run_with(script, RecordingDevice::new(), Variables::new())
    }

    fn press(key: &str) -> DeviceCall {
        DeviceCall::Press(key.to_string())
    }

    #[test]
    fn test_sequential_presses_in_order() {
        let (result, device) = run("A,B,C");
        assert!(result.success);
        assert_eq!(device.calls(), vec![press("A"), press("B"), press("C")]);
        assert_eq!(result.actions, 3);
        assert_eq!(result.metric(metric::DEVICE_CALLS), 3);
        assert_eq!(result.metric(metric::NODES_VISITED), 4);
    }

    #[test]
    fn test_simultaneous_is_one_chord() {
        let (_, device) = run("Ctrl+Shift+S");
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Hotkey(vec!["Ctrl".into(), "Shift".into(), "S".into()])]
        );
    }

    #[test]
    fn test_simultaneous_keys_first_then_rest() {
        let (_, device) = run("(A,B)+Ctrl");
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Hotkey(vec!["Ctrl".into()]), press("A"), press("B")]
        );
    }

    #[test]
    fn test_hold_chain_releases_after_steps() {
        let (result, device) = run("Shift > A > B");
        assert!(result.success);
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::KeyDown("Shift".into()),
                press("A"),
                press("B"),
                DeviceCall::KeyUp("Shift".into()),
            ]
        );
    }

    #[test]
    fn test_hold_chain_releases_on_error() {
        let (result, device) = run_with(
            "Shift > A > B",
            RecordingDevice::new().failing_on_call(2),
            Variables::new(),
        );
        assert!(!result.success);
        assert!(result.error.unwrap().contains("press"));
        assert_eq!(device.count(|c| *c == DeviceCall::KeyUp("Shift".into())), 1);
        assert_eq!(device.count(|c| *c == press("B")), 0);
    }

    #[test]
    fn test_hold_chain_degrades_without_leading_key() {
        let (_, device) = run("@(1,2) > A");
        assert_eq!(device.calls(), vec![DeviceCall::MoveTo(1, 2), press("A")]);
    }

    #[test]
    fn test_hold_on_key() {
        let (result, device) = run("W[20]");
        assert_eq!(
            device.calls(),
            vec![DeviceCall::KeyDown("W".into()), DeviceCall::KeyUp("W".into())]
        );
        assert_eq!(result.metric(metric::SLEPT_MS), 20);
    }

    #[test]
    fn test_hold_on_group_runs_once() {
        let (_, device) = run("(A,B)[20]");
        assert_eq!(device.calls(), vec![press("A"), press("B")]);
    }

    #[test]
    fn test_hold_on_variable_bound_to_key() {
        let mut vars = Variables::new();
        vars.insert_script("k", "Q").unwrap();
        let (_, device) = run_with("$k[10]", RecordingDevice::new(), vars);
        assert_eq!(
            device.calls(),
            vec![DeviceCall::KeyDown("Q".into()), DeviceCall::KeyUp("Q".into())]
        );
    }

    #[test]
    fn test_delay_runs_action_then_waits() {
        let (result, device) = run("W(30)");
        assert_eq!(device.calls(), vec![press("W")]);
        assert!(result.elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn test_delay_wait_only_mode() {
        let device = Arc::new(RecordingDevice::new());
        let mut config = fast_config();
        config.timing.delay_mode = DelayMode::WaitOnly;
        let interpreter = Interpreter::with_config(device.clone(), config);
        let result = interpreter.execute(Arc::new(parse("W(10)").unwrap()), Variables::new());
        assert!(result.success);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_repeat_with_interval() {
        let (result, device) = run("Space*3{20}");
        assert_eq!(device.calls(), vec![press("Space"); 3]);
        assert_eq!(result.metric(metric::SLEEPS), 2);
        assert_eq!(result.metric(metric::SLEPT_MS), 40);
    }

    #[test]
    fn test_toggle_is_single_press() {
        let (_, device) = run("~CapsLock");
        assert_eq!(device.calls(), vec![press("CapsLock")]);
    }

    #[test]
    fn test_mouse_and_wheel() {
        let (_, device) = run("@(100,200), wheel-3, wheel+");
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::MoveTo(100, 200),
                DeviceCall::Scroll(-3),
                DeviceCall::Scroll(1),
            ]
        );
    }

    #[test]
    fn test_fade_runs_both_sides() {
        let (_, device) = run("A<100>B");
        assert_eq!(device.calls(), vec![press("A"), press("B")]);
    }

    #[test]
    fn test_variables() {
        let mut vars = Variables::new();
        vars.insert_script("copy", "Ctrl+C").unwrap();
        vars.insert_literal("label", "ignored");
        let (result, device) = run_with("$copy, $label", RecordingDevice::new(), vars);
        assert!(result.success);
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Hotkey(vec!["Ctrl".into(), "C".into()])]
        );
    }

    #[test]
    fn test_unresolved_variable_fails() {
        let (result, device) = run("A, $missing, B");
        assert!(!result.success);
        assert!(result.error.unwrap().contains("$missing"));
        assert_eq!(device.calls(), vec![press("A")]);
    }

    #[test]
    fn test_recursive_variable_hits_limit() {
        let mut vars = Variables::new();
        vars.insert_script("loop", "A, $loop").unwrap();
        let (result, _) = run_with("$loop", RecordingDevice::new(), vars);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("expands deeper than 32"));
    }

    #[test]
    fn test_device_failure_aborts_run() {
        let (result, device) = run_with(
            "A,B,C",
            RecordingDevice::new().failing_on_key("B"),
            Variables::new(),
        );
        assert!(!result.success);
        assert_eq!(device.count(|c| *c == press("C")), 0);
    }

    #[test]
    fn test_parallel_runs_every_branch() {
        let (result, device) = run("A|B|C");
        assert!(result.success);
        let mut calls = device.calls();
        calls.sort_by_key(|c| format!("{c:?}"));
        assert_eq!(calls, vec![press("A"), press("B"), press("C")]);
        assert_eq!(result.actions, 3);
        assert_eq!(result.metric(metric::PARALLEL_BRANCHES), 3);
    }

    #[test]
    fn test_parallel_branch_failure_is_isolated() {
        let (result, device) =
            run_with("A|B|C", RecordingDevice::new().failing_on_key("B"), Variables::new());
        assert!(result.success);
        assert_eq!(result.metric(metric::BRANCH_FAILURES), 1);
        assert_eq!(device.count(|c| *c == press("A")), 1);
        assert_eq!(device.count(|c| *c == press("C")), 1);
    }

    #[test]
    fn test_parallel_without_workers_runs_inline() {
        let device = Arc::new(RecordingDevice::new());
        let mut config = fast_config();
        config.parallel.max_workers = 0;
        let interpreter = Interpreter::with_config(device.clone(), config);
        let result = interpreter.execute(Arc::new(parse("A|B").unwrap()), Variables::new());
        assert!(result.success);
        assert_eq!(device.calls(), vec![press("A"), press("B")]);
    }

    #[test]
    fn test_parallel_join_timeout() {
        let device = Arc::new(RecordingDevice::new());
        let mut config = fast_config();
        config.parallel.branch_timeout_ms = 20;
        let interpreter = Interpreter::with_config(device.clone(), config);
        let result = interpreter.execute(Arc::new(parse("A(300)|B").unwrap()), Variables::new());
        assert!(result.success);
        assert_eq!(result.metric(metric::BRANCH_TIMEOUTS), 1);
        assert!(result.elapsed < Duration::from_millis(300));
    }

    #[test]
    fn test_continuous_stops_at_cap() {
        let (result, device) = run("A&10");
        assert!(result.success);
        assert_eq!(result.metric(metric::CONTINUOUS_CAPPED), 1);
        let presses = device.count(|c| *c == press("A"));
        assert!(presses >= 2, "presses: {presses}");
        assert_eq!(presses as u64, result.metric(metric::CONTINUOUS_ITERATIONS));
    }

    #[test]
    fn test_stop_cancels_continuous() {
        let device = Arc::new(RecordingDevice::new());
        let mut config = EngineConfig::default();
        config.timing.continuous_cap_ms = 5_000;
        let interpreter = Arc::new(Interpreter::with_config(device.clone(), config));
        let ast = Arc::new(parse("A&5").unwrap());

        let runner = {
            let interpreter = Arc::clone(&interpreter);
            thread::spawn(move || interpreter.execute(ast, Variables::new()))
        };
        thread::sleep(Duration::from_millis(50));
        interpreter.stop();
        let result = runner.join().unwrap();

        assert!(result.success);
        assert!(result.cancelled);
        assert!(result.elapsed < Duration::from_millis(2_000));
    }

    #[test]
    fn test_max_duration_guard() {
        let device = Arc::new(RecordingDevice::new());
        let mut config = fast_config();
        config.limits.max_duration_ms = Some(10);
        let interpreter = Interpreter::with_config(device.clone(), config);
        let result = interpreter.execute(Arc::new(parse("A(30), B").unwrap()), Variables::new());
        assert!(!result.success);
        assert!(result.error.unwrap().contains("maximum duration"));
        assert_eq!(device.calls(), vec![press("A")]);
    }

    #[test]
    fn test_runs_get_distinct_ids() {
        let (first, _) = run("A");
        let (second, _) = run("A");
        assert_ne!(first.run_id, second.run_id);
    }
}
