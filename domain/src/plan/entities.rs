//! Plan domain entities

use crate::agent::entities::Agent;
use crate::agent::value_objects::{AgentId, StepId};
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rationale stamped on plans built without the planner.
pub const FALLBACK_PLAN_RATIONALE: &str =
    "Fallback plan: the planner did not return a usable plan, so every enabled agent works on the goal directly.";

/// Error message given to steps whose dependencies can never be satisfied.
pub const DEPENDENCIES_UNRESOLVED: &str = "dependencies unresolved";

/// Status of a plan step.
///
/// A step moves `Pending -> Running -> Done | Error` at most once per run.
/// Deadlocked steps go straight from `Pending` to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Done,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Done => "done",
            StepStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Error)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single step within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: StepId,
    pub description: String,
    pub agent_id: Option<AgentId>,
    pub parallel_group: Option<String>,
    pub depends_on: Vec<StepId>,
    pub status: StepStatus,
    pub error: Option<String>,
    /// Output reported by the unit of work that ran this step.
    pub output: Option<String>,
}

impl PlanStep {
    pub fn new(id: impl Into<StepId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            agent_id: None,
            parallel_group: None,
            depends_on: Vec::new(),
            status: StepStatus::Pending,
            error: None,
            output: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent.into());
        self
    }

    pub fn with_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn with_dependency(mut self, step: impl Into<StepId>) -> Self {
        self.depends_on.push(step.into());
        self
    }

    fn invalid(&self, to: StepStatus) -> DomainError {
        DomainError::InvalidStepTransition {
            step: self.id.to_string(),
            from: self.status.as_str(),
            to: to.as_str(),
        }
    }

    pub fn mark_running(&mut self) -> Result<(), DomainError> {
        if self.status != StepStatus::Pending {
            return Err(self.invalid(StepStatus::Running));
        }
        self.status = StepStatus::Running;
        Ok(())
    }

    pub fn mark_done(&mut self, output: Option<String>) -> Result<(), DomainError> {
        if self.status != StepStatus::Running {
            return Err(self.invalid(StepStatus::Done));
        }
        self.status = StepStatus::Done;
        self.output = output;
        Ok(())
    }

    pub fn mark_error(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(self.invalid(StepStatus::Error));
        }
        self.status = StepStatus::Error;
        self.error = Some(error.into());
        Ok(())
    }
}

/// A dependency-ordered decomposition of a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub rationale: Option<String>,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(rationale: Option<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            rationale,
            steps,
        }
    }

    /// Deterministic skeleton plan: one independent step per worker agent.
    pub fn fallback<'a>(goal: &str, workers: impl IntoIterator<Item = &'a Agent>) -> Self {
        let steps = workers
            .into_iter()
            .enumerate()
            .map(|(index, agent)| {
                let mut step = PlanStep::new(
                    StepId::sequential(index),
                    format!("As {}, contribute to the goal: {}", agent.role, goal),
                )
                .with_agent(agent.id.clone());
                step.parallel_group = agent.parallel_group.clone();
                step
            })
            .collect();
        Self::new(Some(FALLBACK_PLAN_RATIONALE.to_string()), steps)
    }

    pub fn is_fallback(&self) -> bool {
        self.rationale.as_deref() == Some(FALLBACK_PLAN_RATIONALE)
    }

    pub fn step(&self, id: &StepId) -> Option<&PlanStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    pub fn step_mut(&mut self, id: &StepId) -> Option<&mut PlanStep> {
        self.steps.iter_mut().find(|s| &s.id == id)
    }

    fn is_done(&self, id: &StepId) -> bool {
        self.step(id).is_some_and(|s| s.status == StepStatus::Done)
    }

    /// Ids of pending steps whose every dependency is done, in plan order.
    ///
    /// A dependency naming a step that does not exist never resolves.
    pub fn ready_steps(&self) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .filter(|s| s.depends_on.iter().all(|dep| self.is_done(dep)))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Whether any step is still pending or running.
    pub fn has_unfinished(&self) -> bool {
        self.steps.iter().any(|s| !s.status.is_terminal())
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// (terminal, total)
    pub fn progress(&self) -> (usize, usize) {
        let finished = self.steps.iter().filter(|s| s.status.is_terminal()).count();
        (finished, self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_lifecycle() {
        let mut step = PlanStep::new("s1", "write docs");
        step.mark_running().unwrap();
        step.mark_done(Some("ok".into())).unwrap();
        assert_eq!(step.status, StepStatus::Done);
        assert_eq!(step.output.as_deref(), Some("ok"));
    }

    #[test]
    fn test_step_never_reruns() {
        let mut step = PlanStep::new("s1", "x");
        step.mark_running().unwrap();
        step.mark_error("boom").unwrap();
        assert!(step.mark_running().is_err());
        assert!(step.mark_error("again").is_err());
        assert_eq!(step.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_pending_step_can_error_directly() {
        let mut step = PlanStep::new("s1", "x");
        step.mark_error(DEPENDENCIES_UNRESOLVED).unwrap();
        assert_eq!(step.status, StepStatus::Error);
    }

    #[test]
    fn test_done_requires_running() {
        let mut step = PlanStep::new("s1", "x");
        let err = step.mark_done(None).unwrap_err();
        assert!(err.to_string().contains("pending -> done"));
    }

    #[test]
    fn test_ready_steps_respect_dependencies() {
        let mut plan = Plan::new(
            None,
            vec![
                PlanStep::new("s1", "a"),
                PlanStep::new("s2", "b").with_dependency("s1"),
                PlanStep::new("s3", "c").with_dependency("missing"),
            ],
        );
        assert_eq!(plan.ready_steps(), vec![StepId::new("s1")]);

        let s1 = plan.step_mut(&StepId::new("s1")).unwrap();
        s1.mark_running().unwrap();
        s1.mark_done(None).unwrap();

        assert_eq!(plan.ready_steps(), vec![StepId::new("s2")]);
        assert!(plan.has_unfinished());
    }

    #[test]
    fn test_fallback_plan() {
        let agents = [
            Agent::new("writer", "Technical writer").with_parallel_group("docs"),
            Agent::new("coder", "Rust engineer"),
        ];
        let plan = Plan::fallback("Build feature X", agents.iter());

        assert!(plan.is_fallback());
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].id, StepId::new("s1"));
        assert_eq!(plan.steps[0].agent_id, Some(AgentId::new("writer")));
        assert_eq!(plan.steps[0].parallel_group.as_deref(), Some("docs"));
        assert!(plan.steps[1].description.contains("Rust engineer"));
        assert!(plan.steps[1].description.contains("Build feature X"));
        assert!(plan.steps.iter().all(|s| s.depends_on.is_empty()));
    }

    #[test]
    fn test_counts_and_progress() {
        let mut plan = Plan::new(None, vec![PlanStep::new("s1", "a"), PlanStep::new("s2", "b")]);
        plan.steps[0].mark_error("x").unwrap();
        assert_eq!(plan.count(StepStatus::Error), 1);
        assert_eq!(plan.count(StepStatus::Pending), 1);
        assert_eq!(plan.progress(), (1, 2));
    }
}
