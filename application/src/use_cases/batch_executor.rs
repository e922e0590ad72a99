//! Parallel batch executor
//!
//! Runs independent units of work with bounded concurrency on the calling
//! task: a pending queue feeds a `FuturesUnordered` set, and each finished
//! unit makes room for the next. Nothing is spawned, so units may borrow.
//!
//! A batch never fails. An action that returns an error or panics becomes a
//! failed [`WorkResult`]. The concurrency ceiling is shared by every batch
//! run through the same executor, so concurrent batches (one per parallel
//! group) still respect it in total.

use crate::ports::checkpoint::{CheckpointError, CheckpointHook};
use crate::ports::telemetry::TelemetryGuard;
use chrono::Utc;
use crew_domain::{WorkLabel, WorkResult};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Output text on success, error message on failure.
pub type WorkOutcome = Result<Option<String>, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchExecutorError {
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,
}

/// One schedulable action plus its identity.
pub struct WorkUnit<'a> {
    pub label: WorkLabel,
    action: BoxFuture<'a, WorkOutcome>,
}

impl<'a> WorkUnit<'a> {
    pub fn new<F>(label: WorkLabel, action: F) -> Self
    where
        F: Future<Output = WorkOutcome> + Send + 'a,
    {
        Self {
            label,
            action: Box::pin(action),
        }
    }
}

impl std::fmt::Debug for WorkUnit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkUnit").field("label", &self.label).finish()
    }
}

/// Everything a batch produced, in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub results: Vec<WorkResult>,
    pub elapsed: Duration,
    /// Checkpoint hook failures that were logged and ignored.
    pub swallowed_hook_errors: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> Vec<&WorkResult> {
        self.results.iter().filter(|r| r.success).collect()
    }

    pub fn failed(&self) -> Vec<&WorkResult> {
        self.results.iter().filter(|r| !r.success).collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }
}

pub struct ParallelBatchExecutor {
    max_concurrency: usize,
    permits: Arc<Semaphore>,
    checkpoint: Option<Arc<dyn CheckpointHook>>,
    telemetry: Arc<TelemetryGuard>,
}

impl ParallelBatchExecutor {
    pub fn new(max_concurrency: usize) -> Result<Self, BatchExecutorError> {
        if max_concurrency == 0 {
            return Err(BatchExecutorError::ZeroConcurrency);
        }
        Ok(Self {
            max_concurrency,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            checkpoint: None,
            telemetry: Arc::new(TelemetryGuard::silent()),
        })
    }

    pub fn with_checkpoint(mut self, hook: Arc<dyn CheckpointHook>) -> Self {
        self.checkpoint = Some(hook);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryGuard>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every unit to completion. Always returns one result per unit.
    pub async fn run<'a>(&self, units: Vec<WorkUnit<'a>>) -> BatchSummary {
        let started = Instant::now();
        let size = units.len();
        self.telemetry.emit("batch_start", |t| t.on_batch_start(size));
        debug!(size, max_concurrency = self.max_concurrency, "Batch started");

        let swallowed = AtomicUsize::new(0);
        let mut pending: VecDeque<WorkUnit<'a>> = units.into();
        let mut running = FuturesUnordered::new();
        let mut results = Vec::with_capacity(size);

        loop {
            while running.len() < self.max_concurrency {
                match pending.pop_front() {
                    Some(unit) => running.push(self.run_unit(unit, &swallowed)),
                    None => break,
                }
            }

            match running.next().await {
                Some(result) => {
                    self.telemetry
                        .emit("unit_complete", |t| t.on_unit_complete(&result));
                    results.push(result);
                }
                None => break,
            }
        }

        let summary = BatchSummary {
            results,
            elapsed: started.elapsed(),
            swallowed_hook_errors: swallowed.load(Ordering::Relaxed),
        };
        debug!(
            succeeded = summary.succeeded_count(),
            failed = summary.failed_count(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Batch finished"
        );
        self.telemetry
            .emit("batch_complete", |t| t.on_batch_complete(&summary));
        summary
    }

    async fn run_unit(&self, unit: WorkUnit<'_>, swallowed: &AtomicUsize) -> WorkResult {
        // The semaphore is never closed.
        let _permit = self.permits.acquire().await.ok();
        let WorkUnit { label, action } = unit;

        if let Some(hook) = &self.checkpoint {
            let outcome = AssertUnwindSafe(hook.before(&label)).catch_unwind().await;
            note_checkpoint(outcome, "before", &label, swallowed);
        }

        let started_at = Utc::now();
        let result = match AssertUnwindSafe(action).catch_unwind().await {
            Ok(Ok(output)) => WorkResult::succeeded(label.clone(), output, started_at, Utc::now()),
            Ok(Err(error)) => WorkResult::caught(label.clone(), error, Utc::now()),
            Err(panic) => {
                WorkResult::caught(label.clone(), panic_message(panic.as_ref()), Utc::now())
            }
        };

        if let Some(hook) = &self.checkpoint {
            let outcome = AssertUnwindSafe(hook.after(&label, &result))
                .catch_unwind()
                .await;
            note_checkpoint(outcome, "after", &label, swallowed);
        }

        result
    }
}

/// Count a failed or panicking checkpoint; neither reaches the batch.
fn note_checkpoint(
    outcome: std::thread::Result<Result<(), CheckpointError>>,
    stage: &'static str,
    label: &WorkLabel,
    swallowed: &AtomicUsize,
) {
    let error = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };
    swallowed.fetch_add(1, Ordering::Relaxed);
    warn!(
        correlation_id = %label.correlation_id,
        stage,
        error = %error,
        "Checkpoint failed; continuing"
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
