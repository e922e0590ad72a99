//! Plan DAG executor
//!
//! Drives a [`Plan`] to a fixed point in waves. Each wave takes every ready
//! step (pending, all dependencies done), groups them by parallel group, and
//! runs one batch per group concurrently. The next wave starts only after
//! every batch of the current wave has resolved.
//!
//! When nothing is ready but steps remain unfinished, those steps can never
//! run (cyclic or dangling dependencies). They are marked error with
//! [`DEPENDENCIES_UNRESOLVED`] and execution stops, so the loop always
//! terminates.

use super::batch_executor::{ParallelBatchExecutor, WorkUnit};
use crew_domain::{DEPENDENCIES_UNRESOLVED, Plan, PlanStep, StepId, StepStatus};
use futures::future::join_all;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Step lifecycle callbacks. All methods default to no-ops.
pub trait PlanObserver: Send + Sync {
    fn on_step_start(&self, _step: &PlanStep, _wave: usize) {}

    /// The step reached done or error.
    fn on_step_complete(&self, _step: &PlanStep, _wave: usize) {}

    fn on_wave_complete(&self, _wave: usize, _steps_in_wave: usize) {}
}

pub struct NoPlanObserver;

impl PlanObserver for NoPlanObserver {}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanExecutionReport {
    pub waves: usize,
    /// Steps that actually ran (done or error), excluding deadlocked ones.
    pub steps_executed: usize,
    pub failed_steps: Vec<StepId>,
    pub elapsed: Duration,
    /// Stopped by the halt predicate with steps still pending.
    pub halted: bool,
    pub batches: usize,
    pub swallowed_hook_errors: usize,
}

pub struct PlanDagExecutor<'e> {
    batch: &'e ParallelBatchExecutor,
}

impl<'e> PlanDagExecutor<'e> {
    pub fn new(batch: &'e ParallelBatchExecutor) -> Self {
        Self { batch }
    }

    /// Execute `plan` in place.
    ///
    /// `make_unit` builds the unit of work for a step; its correlation id is
    /// overwritten with the step id, which is how results find their step.
    /// `halt` is checked before every wave.
    pub async fn execute<'a>(
        &self,
        plan: &mut Plan,
        mut make_unit: impl FnMut(&PlanStep) -> WorkUnit<'a>,
        observer: &dyn PlanObserver,
        halt: &(dyn Fn() -> bool + Sync),
    ) -> PlanExecutionReport {
        let started = Instant::now();
        let mut report = PlanExecutionReport::default();

        loop {
            let wave = report.waves;

            if halt() {
                if plan.has_unfinished() {
                    info!(wave, "Plan execution halted before wave");
                    report.halted = true;
                }
                break;
            }

            let ready = plan.ready_steps();
            if ready.is_empty() {
                if plan.has_unfinished() {
                    self.fail_unresolved(plan, wave, observer, &mut report);
                }
                break;
            }

            let mut groups: Vec<(Option<String>, Vec<WorkUnit<'a>>)> = Vec::new();
            for id in &ready {
                let Some(step) = plan.step_mut(id) else {
                    continue;
                };
                if let Err(e) = step.mark_running() {
                    warn!(step = %id, error = %e, "Ready step could not start");
                    continue;
                }
                observer.on_step_start(step, wave);

                let mut unit = make_unit(step);
                unit.label.correlation_id = step.id.to_string();

                match groups.iter_mut().find(|(g, _)| *g == step.parallel_group) {
                    Some((_, units)) => units.push(unit),
                    None => groups.push((step.parallel_group.clone(), vec![unit])),
                }
            }

            debug!(wave, steps = ready.len(), groups = groups.len(), "Wave started");
            let summaries =
                join_all(groups.into_iter().map(|(_, units)| self.batch.run(units))).await;
            report.batches += summaries.len();

            let mut steps_in_wave = 0;
            for summary in summaries {
                report.swallowed_hook_errors += summary.swallowed_hook_errors;
                for result in summary.results {
                    let id = StepId::new(result.correlation_id());
                    let Some(step) = plan
                        .step_mut(&id)
                        .filter(|s| s.status == StepStatus::Running)
                    else {
                        warn!(
                            correlation_id = result.correlation_id(),
                            "Unmatched result ignored"
                        );
                        continue;
                    };

                    let transition = if result.success {
                        step.mark_done(result.output)
                    } else {
                        step.mark_error(result.error.unwrap_or_else(|| "unknown error".into()))
                    };
                    if let Err(e) = transition {
                        warn!(step = %id, error = %e, "Step transition rejected");
                        continue;
                    }

                    if step.status == StepStatus::Error {
                        report.failed_steps.push(step.id.clone());
                    }
                    steps_in_wave += 1;
                    observer.on_step_complete(step, wave);
                }
            }

            report.steps_executed += steps_in_wave;
            observer.on_wave_complete(wave, steps_in_wave);
            report.waves += 1;
        }

        report.elapsed = started.elapsed();
        info!(
            waves = report.waves,
            executed = report.steps_executed,
            failed = report.failed_steps.len(),
            halted = report.halted,
            "Plan execution finished"
        );
        report
    }

    fn fail_unresolved(
        &self,
        plan: &mut Plan,
        wave: usize,
        observer: &dyn PlanObserver,
        report: &mut PlanExecutionReport,
    ) {
        for step in plan.steps.iter_mut().filter(|s| !s.status.is_terminal()) {
            if step.mark_error(DEPENDENCIES_UNRESOLVED).is_ok() {
                warn!(step = %step.id, depends_on = ?step.depends_on, "Step deadlocked");
                report.failed_steps.push(step.id.clone());
                observer.on_step_complete(step, wave);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_domain::{ExecutionPhase, WorkLabel};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        start_waves: Mutex<Vec<usize>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PlanObserver for Recorder {
        fn on_step_start(&self, step: &PlanStep, wave: usize) {
            self.events.lock().unwrap().push(format!("start:{}", step.id));
            self.start_waves.lock().unwrap().push(wave);
        }

        fn on_step_complete(&self, step: &PlanStep, _wave: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", step.status, step.id));
        }

        fn on_wave_complete(&self, wave: usize, _steps_in_wave: usize) {
            self.events.lock().unwrap().push(format!("wave:{}", wave));
        }
    }

    /// Succeeds unless the description contains "fail".
    fn unit_for(step: &PlanStep) -> WorkUnit<'static> {
        let agent = step.agent_id.clone().unwrap_or_else(|| "worker".into());
        let fail = step.description.contains("fail");
        let description = step.description.clone();
        WorkUnit::new(
            WorkLabel::new(agent, ExecutionPhase::Execution, ""),
            async move {
                if fail {
                    Err(format!("{} failed", description))
                } else {
                    Ok(Some(format!("{} ok", description)))
                }
            },
        )
    }

    fn never() -> bool {
        false
    }

    #[tokio::test]
    async fn test_independent_steps_finish_in_one_wave() {
        let batch = ParallelBatchExecutor::new(2).unwrap();
        let mut plan = Plan::new(
            None,
            (1..=5).map(|i| PlanStep::new(StepId::sequential(i - 1), "work")).collect(),
        );

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &NoPlanObserver, &never)
            .await;

        assert_eq!(report.waves, 1);
        assert_eq!(report.steps_executed, 5);
        assert_eq!(plan.count(StepStatus::Done), 5);
        assert!(plan.steps.iter().all(|s| s.output.as_deref() == Some("work ok")));
    }

    #[tokio::test]
    async fn test_linear_chain_waves_are_gapless_from_zero() {
        let batch = ParallelBatchExecutor::new(4).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "a"),
                PlanStep::new("s2", "b").with_dependency("s1"),
                PlanStep::new("s3", "c").with_dependency("s2"),
                PlanStep::new("s4", "d").with_dependency("s3"),
            ],
        );
        let recorder = Recorder::default();

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &recorder, &never)
            .await;

        assert_eq!(report.waves, 4);
        assert_eq!(*recorder.start_waves.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(plan.count(StepStatus::Done), 4);
    }

    #[tokio::test]
    async fn test_dangling_dependency_deadlocks_only_its_chain() {
        let batch = ParallelBatchExecutor::new(4).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "independent"),
                PlanStep::new("s2", "gated").with_dependency("nope"),
                PlanStep::new("s3", "behind gated").with_dependency("s2"),
            ],
        );
        let recorder = Recorder::default();

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &recorder, &never)
            .await;

        assert_eq!(plan.steps[0].status, StepStatus::Done);
        for step in &plan.steps[1..] {
            assert_eq!(step.status, StepStatus::Error);
            assert_eq!(step.error.as_deref(), Some(DEPENDENCIES_UNRESOLVED));
        }
        assert_eq!(report.failed_steps, vec![StepId::new("s2"), StepId::new("s3")]);
        assert_eq!(report.steps_executed, 1);
        assert!(recorder.events().contains(&"error:s3".to_string()));
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let batch = ParallelBatchExecutor::new(1).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "a").with_dependency("s2"),
                PlanStep::new("s2", "b").with_dependency("s1"),
            ],
        );

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &NoPlanObserver, &never)
            .await;

        assert_eq!(report.waves, 0);
        assert_eq!(plan.count(StepStatus::Error), 2);
    }

    #[tokio::test]
    async fn test_failed_step_blocks_dependents() {
        let batch = ParallelBatchExecutor::new(2).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "fail here"),
                PlanStep::new("s2", "after").with_dependency("s1"),
            ],
        );

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &NoPlanObserver, &never)
            .await;

        assert_eq!(plan.steps[0].error.as_deref(), Some("fail here failed"));
        assert_eq!(plan.steps[1].error.as_deref(), Some(DEPENDENCIES_UNRESOLVED));
        assert_eq!(report.waves, 1);
        assert_eq!(report.failed_steps.len(), 2);
    }

    #[tokio::test]
    async fn test_same_agent_results_matched_by_step() {
        let batch = ParallelBatchExecutor::new(4).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "fail one").with_agent("coder").with_parallel_group("g1"),
                PlanStep::new("s2", "pass two").with_agent("coder").with_parallel_group("g2"),
            ],
        );

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &NoPlanObserver, &never)
            .await;

        assert_eq!(report.batches, 2);
        assert_eq!(plan.steps[0].status, StepStatus::Error);
        assert_eq!(plan.steps[1].status, StepStatus::Done);
        assert_eq!(plan.steps[1].output.as_deref(), Some("pass two ok"));
    }

    #[tokio::test]
    async fn test_same_group_steps_emit_start_and_success() {
        let batch = ParallelBatchExecutor::new(2).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "a").with_parallel_group("docs"),
                PlanStep::new("s2", "b").with_parallel_group("docs"),
            ],
        );
        let recorder = Recorder::default();

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &recorder, &never)
            .await;

        assert_eq!(report.waves, 1);
        assert_eq!(report.batches, 1);
        let events = recorder.events();
        assert_eq!(events.iter().filter(|e| e.starts_with("start:")).count(), 2);
        assert_eq!(events.iter().filter(|e| e.starts_with("done:")).count(), 2);
        assert_eq!(events.last().map(String::as_str), Some("wave:0"));
    }

    #[tokio::test]
    async fn test_halt_leaves_remaining_steps_pending() {
        let batch = ParallelBatchExecutor::new(2).unwrap();
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "a"),
                PlanStep::new("s2", "b").with_dependency("s1"),
            ],
        );
        let tripped = AtomicBool::new(false);
        let halt = || tripped.swap(true, Ordering::SeqCst);

        let report = PlanDagExecutor::new(&batch)
            .execute(&mut plan, unit_for, &NoPlanObserver, &halt)
            .await;

        assert!(report.halted);
        assert_eq!(report.waves, 1);
        assert_eq!(plan.steps[0].status, StepStatus::Done);
        assert_eq!(plan.steps[1].status, StepStatus::Pending);
    }
}
