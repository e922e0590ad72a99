//! Execution configuration from TOML (`[execution]` section)

use crew_application::{CompletionOptions, OrchestratorParams};
use crew_domain::ExecutionPolicy;
use serde::{Deserialize, Serialize};

/// Raw execution configuration from TOML
///
/// # Example
///
/// ```toml
/// [execution]
/// max_concurrency = 4
/// route_max_attempts = 3
/// planner_max_attempts = 3
/// planner_max_steps = 12
/// max_agent_loops = 8        # per agent; omit for unlimited
/// max_reflection_cycles = 1  # omit for unlimited
/// halt_on_policy_deny = false
/// enable_reflection = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_concurrency: usize,
    pub route_max_attempts: usize,
    pub planner_max_attempts: usize,
    pub planner_max_steps: usize,
    pub memory_capacity: usize,
    /// Recent memory entries fed into the planner prompt
    pub notes_window: usize,
    pub enable_reflection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_agent_loops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reflection_cycles: Option<u32>,
    pub halt_on_policy_deny: bool,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = OrchestratorParams::default();
        let policy = ExecutionPolicy::default();
        Self {
            max_concurrency: params.max_concurrency,
            route_max_attempts: params.route_max_attempts,
            planner_max_attempts: params.planner_max_attempts,
            planner_max_steps: params.planner_max_steps,
            memory_capacity: params.memory_capacity,
            notes_window: params.notes_window,
            enable_reflection: params.enable_reflection,
            max_agent_loops: policy.max_agent_loops,
            max_reflection_cycles: policy.max_reflection_cycles,
            halt_on_policy_deny: policy.halt_on_policy_deny,
        }
    }
}

impl FileExecutionConfig {
    /// Global termination ceilings, applied to crews without their own policy.
    pub fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            max_agent_loops: self.max_agent_loops,
            max_reflection_cycles: self.max_reflection_cycles,
            halt_on_policy_deny: self.halt_on_policy_deny,
        }
    }

    pub fn params(&self, completion: CompletionOptions) -> OrchestratorParams {
        OrchestratorParams::default()
            .with_max_concurrency(self.max_concurrency)
            .with_route_max_attempts(self.route_max_attempts)
            .with_planner_max_attempts(self.planner_max_attempts)
            .with_planner_max_steps(self.planner_max_steps)
            .with_memory_capacity(self.memory_capacity)
            .with_notes_window(self.notes_window)
            .with_reflection(self.enable_reflection)
            .with_completion(completion)
    }
}
