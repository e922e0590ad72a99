//! Termination latch for a run.
//!
//! [`TerminationState`] counts agent loops and reflection cycles and records
//! why a run stopped issuing work. Once latched it never un-latches, and the
//! first reason recorded wins.

use super::policy::ExecutionPolicy;
use crate::agent::value_objects::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxAgentLoops,
    MaxReflectionCycles,
    ManualAbort,
    ModelSignaledDone,
    PolicyDeny,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxAgentLoops => "max_agent_loops",
            TerminationReason::MaxReflectionCycles => "max_reflection_cycles",
            TerminationReason::ManualAbort => "manual_abort",
            TerminationReason::ModelSignaledDone => "model_signaled_done",
            TerminationReason::PolicyDeny => "policy_deny",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A latched termination: reason plus free-text detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub reason: TerminationReason,
    pub detail: String,
}

/// Per-run loop counters and the termination latch.
#[derive(Debug, Clone, Default)]
pub struct TerminationState {
    agent_loops: HashMap<AgentId, u32>,
    reflection_cycles: u32,
    latched: Option<Termination>,
}

impl TerminationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminated(&self) -> bool {
        self.latched.is_some()
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.latched.as_ref()
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.latched.as_ref().map(|t| t.reason)
    }

    pub fn detail(&self) -> Option<&str> {
        self.latched.as_ref().map(|t| t.detail.as_str())
    }

    pub fn agent_loops(&self, agent: &AgentId) -> u32 {
        self.agent_loops.get(agent).copied().unwrap_or(0)
    }

    pub fn reflection_cycles(&self) -> u32 {
        self.reflection_cycles
    }

    /// Latch termination. Returns `true` only for the call that latched.
    pub fn terminate(&mut self, reason: TerminationReason, detail: impl Into<String>) -> bool {
        if self.latched.is_some() {
            return false;
        }
        self.latched = Some(Termination {
            reason,
            detail: detail.into(),
        });
        true
    }

    /// Count one more loop for `agent`.
    ///
    /// Returns `true` if the caller may keep issuing work. Going past the
    /// policy ceiling latches [`TerminationReason::MaxAgentLoops`].
    pub fn record_agent_loop(&mut self, agent: &AgentId, policy: &ExecutionPolicy) -> bool {
        let count = self.agent_loops.entry(agent.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        if !ExecutionPolicy::within(policy.max_agent_loops, count) {
            self.terminate(
                TerminationReason::MaxAgentLoops,
                format!(
                    "agent '{}' exceeded {} loops",
                    agent,
                    policy.max_agent_loops.unwrap_or_default()
                ),
            );
        }
        !self.is_terminated()
    }

    /// Count one more reflection cycle.
    ///
    /// Returns `true` if the caller may continue. Going past the policy
    /// ceiling latches [`TerminationReason::MaxReflectionCycles`].
    pub fn record_reflection_cycle(&mut self, policy: &ExecutionPolicy) -> bool {
        self.reflection_cycles += 1;

        if !ExecutionPolicy::within(policy.max_reflection_cycles, self.reflection_cycles) {
            self.terminate(
                TerminationReason::MaxReflectionCycles,
                format!(
                    "exceeded {} reflection cycles",
                    policy.max_reflection_cycles.unwrap_or_default()
                ),
            );
        }
        !self.is_terminated()
    }
}
