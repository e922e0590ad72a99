//! Orchestrator use case
//!
//! Top-level coordinator for one run:
//!
//! ```text
//! route decision ──┬─ plan_then_parallel ─▶ Planner ─▶ PlanDagExecutor ─▶ batches
//!                  └─ direct_execution ───▶ one flat batch of worker agents
//!                                     (optional reflection batch afterwards)
//! ```
//!
//! The roster is a snapshot taken at construction. Lifecycle events flow into
//! [`ShortTermMemory`] and the caller's [`RunTelemetry`]. Only an unresolved
//! roster and an unusable route decision abort a run; everything else is
//! reported on [`RunOutput`].

use super::batch_executor::{BatchSummary, ParallelBatchExecutor, WorkUnit};
use super::plan_executor::{PlanDagExecutor, PlanObserver};
use super::planner::{PlanRequest, Planner};
use super::structured_output::{StructuredOutputError, StructuredOutputRequest};
use crate::config::OrchestratorParams;
use crate::ports::agent_worker::{AgentTask, AgentWorker, PlaceholderWorker};
use crate::ports::checkpoint::CheckpointHook;
use crate::ports::config_store::{ConfigStorePort, load_active_roster};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::telemetry::{DecisionKind, RunTelemetry, TelemetryGuard};
use crew_domain::util::{single_line, truncate_chars};
use crew_domain::{
    ActiveRoster, Agent, AgentId, AllowDecision, CrewPromptTemplate, DomainError, ExecutionPhase,
    ExecutionPolicy, MemoryEntry, MemoryRecord, Message, Observation, Plan, PlanStep, RouteDecision,
    RouteStrategy, ShortTermMemory, StepStatus, Termination, TerminationReason, TerminationState,
    Thought, ToolAllowlist, ToolPolicy, WorkLabel, WorkResult,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

const RATIONALE_PREVIEW_CHARS: usize = 200;
const OUTPUT_PREVIEW_CHARS: usize = 500;

/// Errors that abort a run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No active agent roster: {0}")]
    NoRoster(DomainError),

    #[error("Route decision failed: {0}")]
    RouteDecision(StructuredOutputError),

    #[error("Invalid orchestrator configuration: {0}")]
    Configuration(String),
}

/// Input for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInput {
    pub goal: String,
    /// Recent notes fed into the route and planning prompts.
    pub notes: Option<String>,
}

impl RunInput {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutput {
    pub crew_id: String,
    /// `None` when the run stopped before a route was decided.
    pub strategy: Option<RouteStrategy>,
    pub decision: Option<RouteDecision>,
    pub plan_generated: bool,
    pub plan: Option<Plan>,
    /// Parallel batches executed across all waves and phases.
    pub parallel_batches: usize,
    pub waves: usize,
    /// Results of the direct-execution batch.
    pub results: Vec<WorkResult>,
    /// Results of the reflection batch.
    pub reflection: Vec<WorkResult>,
    pub terminated_early: bool,
    pub termination_reason: Option<TerminationReason>,
    pub termination_detail: Option<String>,
    pub note: String,
    /// Checkpoint failures plus panicking telemetry hooks, all ignored.
    pub swallowed_hook_errors: usize,
    pub memory: Vec<MemoryEntry>,
    pub elapsed: Duration,
}

/// Orchestrates one run of a crew against a goal
pub struct Orchestrator {
    roster: Result<ActiveRoster, DomainError>,
    policy: ExecutionPolicy,
    gateway: Arc<dyn LlmGateway>,
    worker: Arc<dyn AgentWorker>,
    params: OrchestratorParams,
    batch: ParallelBatchExecutor,
    telemetry: Arc<TelemetryGuard>,
    memory: Arc<ShortTermMemory>,
    termination: Mutex<TerminationState>,
    allowlist: RwLock<ToolAllowlist>,
}

impl Orchestrator {
    /// An unresolved roster is accepted here; every `run` then fails with
    /// [`OrchestratorError::NoRoster`].
    pub fn new(
        roster: Result<ActiveRoster, DomainError>,
        gateway: Arc<dyn LlmGateway>,
        params: OrchestratorParams,
    ) -> Result<Self, OrchestratorError> {
        let telemetry = Arc::new(TelemetryGuard::silent());
        let batch = ParallelBatchExecutor::new(params.max_concurrency)
            .map_err(|e| OrchestratorError::Configuration(e.to_string()))?
            .with_telemetry(telemetry.clone());
        let (policy, allowlist) = match &roster {
            Ok(r) => (r.policy.clone(), ToolAllowlist::from_agents(&r.agents)),
            Err(_) => (ExecutionPolicy::default(), ToolAllowlist::new()),
        };

        Ok(Self {
            roster,
            policy,
            gateway,
            worker: Arc::new(PlaceholderWorker),
            memory: Arc::new(ShortTermMemory::new(params.memory_capacity)),
            params,
            batch,
            telemetry,
            termination: Mutex::new(TerminationState::new()),
            allowlist: RwLock::new(allowlist),
        })
    }

    /// Snapshot the roster from a configuration store.
    pub fn from_store(
        store: &dyn ConfigStorePort,
        gateway: Arc<dyn LlmGateway>,
        params: OrchestratorParams,
    ) -> Result<Self, OrchestratorError> {
        Self::new(load_active_roster(store), gateway, params)
    }

    // ==================== Builder Methods ====================

    pub fn with_worker(mut self, worker: Arc<dyn AgentWorker>) -> Self {
        self.worker = worker;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn RunTelemetry>) -> Self {
        self.telemetry = Arc::new(TelemetryGuard::new(telemetry));
        self.batch = self.batch.with_telemetry(self.telemetry.clone());
        self
    }

    pub fn with_checkpoint(mut self, hook: Arc<dyn CheckpointHook>) -> Self {
        self.batch = self.batch.with_checkpoint(hook);
        self
    }

    // ==================== Accessors ====================

    pub fn roster(&self) -> Option<&ActiveRoster> {
        self.roster.as_ref().ok()
    }

    pub fn memory(&self) -> &ShortTermMemory {
        &self.memory
    }

    /// Shared handle to the run's memory, for inspection after the run.
    pub fn memory_handle(&self) -> Arc<ShortTermMemory> {
        Arc::clone(&self.memory)
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    pub fn is_terminated(&self) -> bool {
        self.lock_termination().is_terminated()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.lock_termination().termination().cloned()
    }

    // ==================== Termination ====================

    /// Count one unit of work issued to `agent`. Returns `false` once the
    /// run has terminated; callers must not issue further work then.
    pub fn increment_agent_loop(&self, agent: &AgentId) -> bool {
        self.update_termination(|state, policy| state.record_agent_loop(agent, policy))
    }

    /// Count one reflection cycle. Returns `false` once the run has terminated.
    pub fn increment_reflection_cycle(&self) -> bool {
        self.update_termination(|state, policy| state.record_reflection_cycle(policy))
    }

    /// Stop issuing new work. In-flight units still finish.
    pub fn abort(&self, detail: impl Into<String>) -> bool {
        let detail = detail.into();
        self.update_termination(|state, _| state.terminate(TerminationReason::ManualAbort, detail))
    }

    /// Record that the model declared the goal complete.
    pub fn signal_done(&self, detail: impl Into<String>) -> bool {
        let detail = detail.into();
        self.update_termination(|state, _| {
            state.terminate(TerminationReason::ModelSignaledDone, detail)
        })
    }

    // A poisoned lock still holds a valid latch: every update is a single call.
    fn lock_termination(&self) -> MutexGuard<'_, TerminationState> {
        self.termination
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_termination<R>(
        &self,
        f: impl FnOnce(&mut TerminationState, &ExecutionPolicy) -> R,
    ) -> R {
        let (result, latched) = {
            let mut state = self.lock_termination();
            let was_terminated = state.is_terminated();
            let result = f(&mut state, &self.policy);
            let latched = if was_terminated {
                None
            } else {
                state.termination().cloned()
            };
            (result, latched)
        };

        if let Some(termination) = latched {
            warn!(
                reason = termination.reason.as_str(),
                detail = %termination.detail,
                "Run terminated"
            );
            self.remember(
                Observation::new(format!("Run terminated: {}", termination.reason.as_str()))
                    .failed(termination.detail.clone()),
            );
            self.telemetry
                .emit("terminated", |t| t.on_terminated(&termination));
        }
        result
    }

    // ==================== Tool Authorization ====================

    /// Check a tool invocation against the agent's allowlist and record the
    /// decision. A denial latches termination when the policy asks for it.
    pub fn authorize_tool(&self, agent: &AgentId, tool: &str) -> AllowDecision {
        let decision = self
            .allowlist
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .check(agent, tool);

        let observation = Observation::new(format!("Tool '{}' requested", tool))
            .by(agent)
            .with_tool(tool);
        if decision.allowed {
            self.remember(observation.succeeded());
        } else {
            warn!(agent = %agent, tool, "Tool denied by allowlist");
            self.remember(observation.failed(decision.reason.clone()));
            if self.policy.halt_on_policy_deny {
                let reason = decision.reason.clone();
                self.update_termination(|state, _| {
                    state.terminate(TerminationReason::PolicyDeny, reason)
                });
            }
        }
        decision
    }

    /// Replace an agent's tool policy, reflecting a configuration edit.
    pub fn update_tool_policy(&self, agent: impl Into<AgentId>, policy: ToolPolicy) {
        self.allowlist
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .upsert(agent, policy);
    }

    pub fn remove_tool_policy(&self, agent: &AgentId) {
        self.allowlist
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(agent);
    }

    // ==================== Run ====================

    pub async fn run(&self, input: RunInput) -> Result<RunOutput, OrchestratorError> {
        let roster = self
            .roster
            .as_ref()
            .map_err(|e| OrchestratorError::NoRoster(e.clone()))?;
        let started = Instant::now();
        let goal = input.goal.as_str();
        let notes = input.notes.as_deref().filter(|n| !n.trim().is_empty());

        info!(
            crew = %roster.crew_id,
            agents = roster.agents.len(),
            goal = %truncate_chars(&single_line(goal), 80),
            "Run started"
        );
        self.telemetry
            .emit("run_start", |t| t.on_run_start(goal, &roster.crew_name));
        self.remember(
            Thought::new(format!("Goal: {}", truncate_chars(goal, RATIONALE_PREVIEW_CHARS)))
                .in_phase(ExecutionPhase::Planning),
        );

        let mut out = RunOutput {
            crew_id: roster.crew_id.clone(),
            ..RunOutput::default()
        };
        let mut notes_out = Vec::new();

        if self.is_terminated() {
            return Ok(self.finish(out, notes_out, started));
        }

        let decision = self.decide_route(roster, goal, notes).await?;
        out.strategy = Some(decision.strategy);
        out.decision = Some(decision.clone());

        if !self.is_terminated() {
            match decision.strategy {
                RouteStrategy::PlanThenParallel => {
                    self.run_planned(roster, goal, notes, &mut out, &mut notes_out)
                        .await
                }
                RouteStrategy::DirectExecution => {
                    self.run_direct(roster, goal, &mut out, &mut notes_out).await
                }
            }
        }

        if self.params.enable_reflection && !self.is_terminated() {
            self.run_reflection(roster, goal, &mut out, &mut notes_out)
                .await;
        }

        Ok(self.finish(out, notes_out, started))
    }

    async fn decide_route(
        &self,
        roster: &ActiveRoster,
        goal: &str,
        notes: Option<&str>,
    ) -> Result<RouteDecision, OrchestratorError> {
        let messages = vec![
            Message::system(CrewPromptTemplate::route_system()),
            Message::user(CrewPromptTemplate::route_prompt(goal, &roster.summary(), notes)),
        ];

        let result = StructuredOutputRequest::new(
            self.gateway.as_ref(),
            &self.params.completion,
            DecisionKind::Route,
            self.params.route_max_attempts,
        )
        .run(messages, RouteDecision::parse, |report| {
            self.telemetry
                .emit("decision_attempt", |t| t.on_decision_attempt(report))
        })
        .await;

        match result {
            Ok(structured) => {
                let decision = structured.value;
                info!(
                    strategy = decision.strategy.as_str(),
                    attempts = structured.attempts,
                    "Route decided"
                );
                self.remember(
                    Thought::new(format!(
                        "Route: {} ({})",
                        decision.strategy,
                        truncate_chars(&decision.rationale, RATIONALE_PREVIEW_CHARS)
                    ))
                    .in_phase(ExecutionPhase::Planning),
                );
                self.telemetry
                    .emit("route_decided", |t| t.on_route_decided(&decision));
                Ok(decision)
            }
            Err(e) => {
                warn!(error = %e, "Route decision failed");
                self.remember(Observation::new("Route decision failed").failed(e.to_string()));
                Err(OrchestratorError::RouteDecision(e))
            }
        }
    }

    async fn run_planned(
        &self,
        roster: &ActiveRoster,
        goal: &str,
        notes: Option<&str>,
        out: &mut RunOutput,
        notes_out: &mut Vec<String>,
    ) {
        let summary = roster.summary();
        let planner = Planner::new(
            self.gateway.as_ref(),
            &self.params.completion,
            self.params.planner_max_attempts,
            self.params.planner_max_steps,
        );
        // Caller notes first, then the most recent memory entries.
        let recent = self.memory.render_notes(self.params.notes_window);
        let notes = match (notes, recent.is_empty()) {
            (Some(given), false) => Some(format!("{}\n{}", given, recent)),
            (Some(given), true) => Some(given.to_string()),
            (None, false) => Some(recent),
            (None, true) => None,
        };
        let request = PlanRequest {
            goal,
            roster: &summary,
            notes: notes.as_deref(),
        };

        let planned = planner
            .plan(request, |report| {
                self.telemetry
                    .emit("decision_attempt", |t| t.on_decision_attempt(report))
            })
            .await;

        let mut plan = match planned {
            Ok(plan) => {
                self.remember(
                    Thought::new(format!(
                        "Plan generated with {} step(s): {}",
                        plan.steps.len(),
                        truncate_chars(
                            plan.rationale.as_deref().unwrap_or_default(),
                            RATIONALE_PREVIEW_CHARS
                        )
                    ))
                    .in_phase(ExecutionPhase::Planning),
                );
                plan
            }
            Err(e) => {
                warn!(error = %e, "Planner failed; using fallback plan");
                self.remember(
                    Observation::new("Planner failed; using fallback plan").failed(e.to_string()),
                );
                notes_out.push("Planner failed; fallback plan used.".to_string());
                Plan::fallback(goal, roster.workers())
            }
        };
        out.plan_generated = true;
        let fallback = plan.is_fallback();
        self.telemetry
            .emit("plan_generated", |t| t.on_plan_generated(&plan, fallback));

        let recorder = PlanRecorder {
            memory: &self.memory,
            telemetry: &self.telemetry,
        };
        let halt = || self.is_terminated();
        let report = PlanDagExecutor::new(&self.batch)
            .execute(
                &mut plan,
                |step| self.step_unit(roster, goal, step),
                &recorder,
                &halt,
            )
            .await;

        let done = plan.count(StepStatus::Done);
        let failed = plan.count(StepStatus::Error);
        self.remember(Observation::new(format!(
            "Plan finished: {} done, {} error across {} wave(s)",
            done, failed, report.waves
        )));
        notes_out.push(format!(
            "Executed {}-step plan in {} wave(s): {} done, {} error.",
            plan.steps.len(),
            report.waves,
            done,
            failed
        ));
        if report.halted {
            notes_out.push(format!(
                "{} step(s) left pending.",
                plan.count(StepStatus::Pending)
            ));
        }

        out.waves = report.waves;
        out.parallel_batches += report.batches;
        out.swallowed_hook_errors += report.swallowed_hook_errors;
        out.plan = Some(plan);
    }

    /// Unit of work for a plan step. Steps without an agent go to the first
    /// worker; steps naming an unknown or disabled agent fail.
    fn step_unit(&self, roster: &ActiveRoster, goal: &str, step: &PlanStep) -> WorkUnit<'static> {
        let agent = match &step.agent_id {
            Some(id) => roster.agent(id).filter(|a| a.enabled),
            None => roster.workers().next(),
        };
        let Some(agent) = agent else {
            let agent_id = step.agent_id.clone().unwrap_or_else(|| "unassigned".into());
            let error = format!("no enabled agent '{}' in crew '{}'", agent_id, roster.crew_id);
            return WorkUnit::new(
                WorkLabel::new(agent_id, ExecutionPhase::Execution, step.id.as_str()),
                async move { Err(error) },
            );
        };

        let task = AgentTask::new(goal, step.description.clone(), ExecutionPhase::Execution)
            .for_step(&step.id);
        self.agent_unit(agent, task, step.id.to_string())
    }

    /// Count the loop and wrap the worker call. Past the loop ceiling the
    /// unit fails without calling the worker.
    fn agent_unit(
        &self,
        agent: &Agent,
        task: AgentTask,
        correlation_id: String,
    ) -> WorkUnit<'static> {
        let label = WorkLabel::new(agent.id.clone(), task.phase, correlation_id);

        let admitted = match task.phase {
            ExecutionPhase::Reflection => true,
            _ => self.increment_agent_loop(&agent.id),
        };
        if !admitted {
            let detail = self
                .termination()
                .map(|t| format!("not started: run terminated ({})", t.reason.as_str()))
                .unwrap_or_else(|| "not started: run terminated".to_string());
            return WorkUnit::new(label, async move { Err(detail) });
        }

        let worker = Arc::clone(&self.worker);
        let agent = agent.clone();
        WorkUnit::new(label, async move {
            worker
                .perform(&agent, &task)
                .await
                .map(Some)
                .map_err(|e| e.to_string())
        })
    }

    async fn run_direct(
        &self,
        roster: &ActiveRoster,
        goal: &str,
        out: &mut RunOutput,
        notes_out: &mut Vec<String>,
    ) {
        let units: Vec<WorkUnit<'static>> = roster
            .workers()
            .enumerate()
            .map(|(index, agent)| {
                let task = AgentTask::new(
                    goal,
                    format!("As {}, work on the goal directly.", agent.role),
                    ExecutionPhase::Execution,
                );
                self.agent_unit(agent, task, format!("direct-{}-{}", index + 1, agent.id))
            })
            .collect();

        let summary = self.batch.run(units).await;
        self.record_results(&summary);
        self.remember(Observation::new(format!(
            "Direct execution finished: {} succeeded, {} failed",
            summary.succeeded_count(),
            summary.failed_count()
        )));
        notes_out.push(format!(
            "Ran {} agent(s) directly: {} succeeded, {} failed.",
            summary.results.len(),
            summary.succeeded_count(),
            summary.failed_count()
        ));

        out.parallel_batches += 1;
        out.swallowed_hook_errors += summary.swallowed_hook_errors;
        out.results = summary.results;
    }

    async fn run_reflection(
        &self,
        roster: &ActiveRoster,
        goal: &str,
        out: &mut RunOutput,
        notes_out: &mut Vec<String>,
    ) {
        let reviewers: Vec<&Agent> = roster.reflectors().collect();
        if reviewers.is_empty() {
            return;
        }
        let produced = produced_outputs(out);

        let mut units = Vec::with_capacity(reviewers.len());
        for agent in reviewers {
            if !self.increment_reflection_cycle() {
                break;
            }
            let task = AgentTask::new(goal, produced.clone(), ExecutionPhase::Reflection);
            units.push(self.agent_unit(agent, task, format!("reflect-{}", agent.id)));
        }
        if units.is_empty() {
            return;
        }

        let summary = self.batch.run(units).await;
        self.record_results(&summary);
        notes_out.push(format!(
            "Reflection by {} reviewer(s): {} succeeded.",
            summary.results.len(),
            summary.succeeded_count()
        ));

        out.parallel_batches += 1;
        out.swallowed_hook_errors += summary.swallowed_hook_errors;
        out.reflection = summary.results;
    }

    fn remember(&self, record: impl Into<MemoryRecord>) {
        remember(&self.memory, &self.telemetry, record);
    }

    fn record_results(&self, summary: &BatchSummary) {
        for result in &summary.results {
            let observation = Observation::new(format!(
                "{} finished ({})",
                result.correlation_id(),
                result.label.phase
            ))
            .by(result.agent_id());
            self.remember(match (&result.error, result.success) {
                (_, true) => observation.succeeded(),
                (Some(error), false) => observation.failed(error.clone()),
                (None, false) => observation.failed("unknown error"),
            });
        }
    }

    fn finish(&self, mut out: RunOutput, mut notes: Vec<String>, started: Instant) -> RunOutput {
        if out.strategy.is_none() {
            notes.push("No work dispatched.".to_string());
        }
        if let Some(termination) = self.termination() {
            notes.push(format!(
                "Terminated early ({}): {}.",
                termination.reason.as_str(),
                termination.detail
            ));
            out.terminated_early = true;
            out.termination_reason = Some(termination.reason);
            out.termination_detail = Some(termination.detail);
        }

        out.note = notes.join(" ");
        out.swallowed_hook_errors += self.telemetry.swallowed();
        out.elapsed = started.elapsed();

        info!(
            strategy = ?out.strategy,
            batches = out.parallel_batches,
            waves = out.waves,
            terminated_early = out.terminated_early,
            elapsed_ms = out.elapsed.as_millis() as u64,
            "Run finished"
        );
        let note = out.note.clone();
        self.telemetry.emit("run_complete", |t| t.on_run_complete(&note));
        out.memory = self.memory.snapshot();
        out
    }
}

fn remember(memory: &ShortTermMemory, telemetry: &TelemetryGuard, record: impl Into<MemoryRecord>) {
    let entry = memory.append(record);
    telemetry.emit("memory_appended", |t| t.on_memory_appended(&entry));
}

/// Step outputs (or direct results) rendered for reviewers.
fn produced_outputs(out: &RunOutput) -> String {
    let lines: Vec<String> = match &out.plan {
        Some(plan) => plan
            .steps
            .iter()
            .map(|s| {
                let agent = s.agent_id.as_ref().map(|a| a.as_str()).unwrap_or("unassigned");
                let body = match s.status {
                    StepStatus::Done => s.output.as_deref().unwrap_or("(no output)"),
                    _ => s.error.as_deref().unwrap_or(s.status.as_str()),
                };
                format!(
                    "- {} ({}, {}): {}",
                    s.id,
                    agent,
                    s.status,
                    truncate_chars(body, OUTPUT_PREVIEW_CHARS)
                )
            })
            .collect(),
        None => out
            .results
            .iter()
            .map(|r| {
                let body = r.output.as_deref().or(r.error.as_deref()).unwrap_or("(no output)");
                format!(
                    "- {}: {}",
                    r.agent_id(),
                    truncate_chars(body, OUTPUT_PREVIEW_CHARS)
                )
            })
            .collect(),
    };
    if lines.is_empty() {
        "(nothing was produced)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Mirrors plan lifecycle events into memory and telemetry.
struct PlanRecorder<'a> {
    memory: &'a ShortTermMemory,
    telemetry: &'a TelemetryGuard,
}

impl PlanRecorder<'_> {
    fn remember(&self, record: impl Into<MemoryRecord>) {
        remember(self.memory, self.telemetry, record);
    }
}

impl PlanObserver for PlanRecorder<'_> {
    fn on_step_start(&self, step: &PlanStep, wave: usize) {
        let mut thought = Thought::new(format!(
            "Step {} started in wave {}: {}",
            step.id,
            wave,
            truncate_chars(&single_line(&step.description), RATIONALE_PREVIEW_CHARS)
        ))
        .in_phase(ExecutionPhase::Execution);
        if let Some(agent) = &step.agent_id {
            thought = thought.by(agent);
        }
        self.remember(thought);
        self.telemetry
            .emit("step_start", |t| t.on_step_start(step, wave));
    }

    fn on_step_complete(&self, step: &PlanStep, wave: usize) {
        let mut observation = Observation::new(format!("Step {} {}", step.id, step.status));
        if let Some(agent) = &step.agent_id {
            observation = observation.by(agent);
        }
        self.remember(match step.status {
            StepStatus::Done => observation.succeeded(),
            _ => observation.failed(step.error.clone().unwrap_or_default()),
        });
        self.telemetry
            .emit("step_complete", |t| t.on_step_complete(step, wave));
    }

    fn on_wave_complete(&self, wave: usize, steps_in_wave: usize) {
        self.remember(
            Thought::new(format!(
                "Wave {} complete: {} step(s)",
                wave, steps_in_wave
            ))
            .in_phase(ExecutionPhase::Execution),
        );
        self.telemetry
            .emit("wave_complete", |t| t.on_wave_complete(wave, steps_in_wave));
    }
}
