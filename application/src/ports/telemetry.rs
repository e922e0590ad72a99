//! Run telemetry port
//!
//! Callbacks fired by the orchestrator, plan executor, and batch executor.
//! All are fire-and-forget: [`TelemetryGuard`] isolates a panicking hook so
//! it can never abort orchestration, and counts how often that happened.

use crate::use_cases::batch_executor::BatchSummary;
use crew_domain::{MemoryEntry, Plan, PlanStep, RouteDecision, Termination, WorkResult};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Which structured request a repair-loop attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Route,
    Plan,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Route => "route",
            DecisionKind::Plan => "plan",
        }
    }
}

/// One attempt of a structured-output request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub kind: DecisionKind,
    /// 1-based attempt number.
    pub attempt: usize,
    pub max_attempts: usize,
    /// Parse or validation error; `None` when the attempt succeeded.
    pub error: Option<String>,
}

/// Callback for lifecycle events during a run
///
/// Every method has a no-op default so implementations only override what
/// they display or record.
pub trait RunTelemetry: Send + Sync {
    fn on_run_start(&self, _goal: &str, _crew: &str) {}

    /// A route or plan attempt settled.
    fn on_decision_attempt(&self, _report: &AttemptReport) {}

    fn on_route_decided(&self, _decision: &RouteDecision) {}

    /// `fallback` is true when the deterministic fallback plan was used.
    fn on_plan_generated(&self, _plan: &Plan, _fallback: bool) {}

    /// Wave indices start at 0 and have no gaps.
    fn on_step_start(&self, _step: &PlanStep, _wave: usize) {}

    /// The step is done or error.
    fn on_step_complete(&self, _step: &PlanStep, _wave: usize) {}

    fn on_wave_complete(&self, _wave: usize, _steps_in_wave: usize) {}

    fn on_batch_start(&self, _size: usize) {}

    fn on_unit_complete(&self, _result: &WorkResult) {}

    fn on_batch_complete(&self, _summary: &BatchSummary) {}

    fn on_terminated(&self, _termination: &Termination) {}

    fn on_memory_appended(&self, _entry: &MemoryEntry) {}

    fn on_run_complete(&self, _note: &str) {}
}

/// No-op telemetry for when nobody is listening
pub struct NoTelemetry;

impl RunTelemetry for NoTelemetry {}

/// Telemetry that forwards every event to several sinks in order.
///
/// Lets the CLI drive a progress display and a JSONL recorder from the same
/// run. Panics are not isolated per sink; wrap the composite in a
/// [`TelemetryGuard`] as the orchestrator does.
#[derive(Default)]
pub struct CompositeTelemetry {
    sinks: Vec<Arc<dyn RunTelemetry>>,
}

impl CompositeTelemetry {
    pub fn new(sinks: Vec<Arc<dyn RunTelemetry>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn RunTelemetry>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        for sink in &$self.sinks {
            sink.$method($($arg),*);
        }
    };
}

impl RunTelemetry for CompositeTelemetry {
    fn on_run_start(&self, goal: &str, crew: &str) {
        delegate!(self, on_run_start, goal, crew);
    }

    fn on_decision_attempt(&self, report: &AttemptReport) {
        delegate!(self, on_decision_attempt, report);
    }

    fn on_route_decided(&self, decision: &RouteDecision) {
        delegate!(self, on_route_decided, decision);
    }

    fn on_plan_generated(&self, plan: &Plan, fallback: bool) {
        delegate!(self, on_plan_generated, plan, fallback);
    }

    fn on_step_start(&self, step: &PlanStep, wave: usize) {
        delegate!(self, on_step_start, step, wave);
    }

    fn on_step_complete(&self, step: &PlanStep, wave: usize) {
        delegate!(self, on_step_complete, step, wave);
    }

    fn on_wave_complete(&self, wave: usize, steps_in_wave: usize) {
        delegate!(self, on_wave_complete, wave, steps_in_wave);
    }

    fn on_batch_start(&self, size: usize) {
        delegate!(self, on_batch_start, size);
    }

    fn on_unit_complete(&self, result: &WorkResult) {
        delegate!(self, on_unit_complete, result);
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        delegate!(self, on_batch_complete, summary);
    }

    fn on_terminated(&self, termination: &Termination) {
        delegate!(self, on_terminated, termination);
    }

    fn on_memory_appended(&self, entry: &MemoryEntry) {
        delegate!(self, on_memory_appended, entry);
    }

    fn on_run_complete(&self, note: &str) {
        delegate!(self, on_run_complete, note);
    }
}

/// Fans telemetry out to a hook while swallowing its panics.
pub struct TelemetryGuard {
    inner: Arc<dyn RunTelemetry>,
    swallowed: AtomicUsize,
}

impl TelemetryGuard {
    pub fn new(inner: Arc<dyn RunTelemetry>) -> Self {
        Self {
            inner,
            swallowed: AtomicUsize::new(0),
        }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(NoTelemetry))
    }

    /// Invoke a hook. A panic inside it is logged and counted.
    pub fn emit(&self, event: &'static str, f: impl FnOnce(&dyn RunTelemetry)) {
        let inner = self.inner.as_ref();
        if catch_unwind(AssertUnwindSafe(|| f(inner))).is_err() {
            self.swallowed.fetch_add(1, Ordering::Relaxed);
            warn!(event, "Telemetry hook panicked; continuing");
        }
    }

    /// Number of hook invocations that panicked so far.
    pub fn swallowed(&self) -> usize {
        self.swallowed.load(Ordering::Relaxed)
    }
}

impl Default for TelemetryGuard {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Panicky;

    impl RunTelemetry for Panicky {
        fn on_run_start(&self, _goal: &str, _crew: &str) {
            panic!("display crashed");
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl RunTelemetry for Recording {
        fn on_run_complete(&self, note: &str) {
            self.0.lock().unwrap().push(note.to_string());
        }
    }

    #[test]
    fn test_panicking_hook_is_swallowed_and_counted() {
        let guard = TelemetryGuard::new(Arc::new(Panicky));
        guard.emit("run_start", |t| t.on_run_start("g", "c"));
        guard.emit("run_start", |t| t.on_run_start("g", "c"));
        guard.emit("run_complete", |t| t.on_run_complete("done"));
        assert_eq!(guard.swallowed(), 2);
    }

    #[test]
    fn test_composite_forwards_to_every_sink() {
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        let mut composite = CompositeTelemetry::default();
        assert!(composite.is_empty());
        composite.push(first.clone());
        composite.push(second.clone());

        composite.on_run_complete("done");
        composite.on_run_start("ignored by recorder", "core");

        assert_eq!(*first.0.lock().unwrap(), vec!["done".to_string()]);
        assert_eq!(*second.0.lock().unwrap(), vec!["done".to_string()]);
    }

    #[test]
    fn test_events_reach_inner_hook() {
        let recording = Arc::new(Recording::default());
        let guard = TelemetryGuard::new(recording.clone());
        guard.emit("run_complete", |t| t.on_run_complete("done"));
        assert_eq!(*recording.0.lock().unwrap(), vec!["done".to_string()]);
        assert_eq!(guard.swallowed(), 0);
    }
}
