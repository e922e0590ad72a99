//! Agent worker port
//!
//! Performs the actual work of one agent on one task. The orchestrator wraps
//! each call in a unit of work; the batch executor contains its failures.

use super::llm_gateway::GatewayError;
use async_trait::async_trait;
use crew_domain::{Agent, ExecutionPhase, StepId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Failed(String),
}

/// What an agent is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    pub goal: String,
    pub description: String,
    pub phase: ExecutionPhase,
    /// Set when the task comes from a plan step.
    pub step_id: Option<StepId>,
}

impl AgentTask {
    pub fn new(
        goal: impl Into<String>,
        description: impl Into<String>,
        phase: ExecutionPhase,
    ) -> Self {
        Self {
            goal: goal.into(),
            description: description.into(),
            phase,
            step_id: None,
        }
    }

    pub fn for_step(mut self, step: &StepId) -> Self {
        self.step_id = Some(step.clone());
        self
    }
}

#[async_trait]
pub trait AgentWorker: Send + Sync {
    /// Run the task and return the agent's output text.
    async fn perform(&self, agent: &Agent, task: &AgentTask) -> Result<String, WorkerError>;
}

/// Worker that completes immediately without calling any model.
///
/// Used for dry runs and as the default when no worker is wired.
pub struct PlaceholderWorker;

#[async_trait]
impl AgentWorker for PlaceholderWorker {
    async fn perform(&self, agent: &Agent, task: &AgentTask) -> Result<String, WorkerError> {
        Ok(format!(
            "[{}] {} acknowledged: {}",
            task.phase, agent.id, task.description
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_worker_echoes_task() {
        let agent = Agent::new("coder", "Rust engineer");
        let task = AgentTask::new("g", "write tests", ExecutionPhase::Execution)
            .for_step(&StepId::new("s1"));
        let output = PlaceholderWorker.perform(&agent, &task).await.unwrap();
        assert_eq!(output, "[execution] coder acknowledged: write tests");
    }
}
