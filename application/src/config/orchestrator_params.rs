//! Orchestrator parameters: static knobs for one run.
//!
//! [`OrchestratorParams`] groups the values that control concurrency, repair
//! attempts, plan size, and memory. Termination ceilings live in the domain's
//! `ExecutionPolicy` because crews may override them.

use crate::ports::llm_gateway::CompletionOptions;
use crew_domain::memory::DEFAULT_MEMORY_CAPACITY;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_MAX_PLAN_STEPS: usize = 12;

/// Run control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorParams {
    /// Ceiling on concurrently running units of work.
    pub max_concurrency: usize,
    /// Attempts allowed for the route decision, repairs included.
    pub route_max_attempts: usize,
    /// Attempts allowed for the planner, repairs included.
    pub planner_max_attempts: usize,
    /// Plans longer than this are truncated.
    pub planner_max_steps: usize,
    /// Short-term memory ring-buffer capacity.
    pub memory_capacity: usize,
    /// Run enabled reflection-role agents after execution.
    pub enable_reflection: bool,
    /// How many recent memory entries are fed back into prompts.
    pub notes_window: usize,
    /// Sampling options for route and plan requests.
    pub completion: CompletionOptions,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            route_max_attempts: DEFAULT_MAX_ATTEMPTS,
            planner_max_attempts: DEFAULT_MAX_ATTEMPTS,
            planner_max_steps: DEFAULT_MAX_PLAN_STEPS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            enable_reflection: false,
            notes_window: 10,
            completion: CompletionOptions::default(),
        }
    }
}

impl OrchestratorParams {
    // ==================== Builder Methods ====================

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_route_max_attempts(mut self, max: usize) -> Self {
        self.route_max_attempts = max;
        self
    }

    pub fn with_planner_max_attempts(mut self, max: usize) -> Self {
        self.planner_max_attempts = max;
        self
    }

    pub fn with_planner_max_steps(mut self, max: usize) -> Self {
        self.planner_max_steps = max;
        self
    }

    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    pub fn with_reflection(mut self, enabled: bool) -> Self {
        self.enable_reflection = enabled;
        self
    }

    pub fn with_notes_window(mut self, entries: usize) -> Self {
        self.notes_window = entries;
        self
    }

    pub fn with_completion(mut self, options: CompletionOptions) -> Self {
        self.completion = options;
        self
    }
}
