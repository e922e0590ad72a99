//! Execution policy: per-run termination ceilings.
//!
//! [`ExecutionPolicy`] captures the static limits that govern how much work a
//! run may issue before it latches termination. A ceiling of `None` means
//! unlimited.

use serde::{Deserialize, Serialize};

/// Static termination ceilings for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Maximum units of work any single agent may be issued.
    #[serde(default)]
    pub max_agent_loops: Option<u32>,
    /// Maximum reflection cycles across the whole run.
    #[serde(default)]
    pub max_reflection_cycles: Option<u32>,
    /// Latch termination when a tool call is denied by the allowlist.
    #[serde(default)]
    pub halt_on_policy_deny: bool,
}

impl ExecutionPolicy {
    // ==================== Builder Methods ====================

    pub fn with_max_agent_loops(mut self, max: u32) -> Self {
        self.max_agent_loops = Some(max);
        self
    }

    pub fn with_max_reflection_cycles(mut self, max: u32) -> Self {
        self.max_reflection_cycles = Some(max);
        self
    }

    pub fn with_halt_on_policy_deny(mut self, halt: bool) -> Self {
        self.halt_on_policy_deny = halt;
        self
    }

    /// Whether `count` is still within `ceiling` (absent ceiling = unlimited).
    pub fn within(ceiling: Option<u32>, count: u32) -> bool {
        ceiling.is_none_or(|max| count <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let policy = ExecutionPolicy::default();
        assert!(policy.max_agent_loops.is_none());
        assert!(policy.max_reflection_cycles.is_none());
        assert!(!policy.halt_on_policy_deny);
    }

    #[test]
    fn test_builder() {
        let policy = ExecutionPolicy::default()
            .with_max_agent_loops(4)
            .with_max_reflection_cycles(1)
            .with_halt_on_policy_deny(true);
        assert_eq!(policy.max_agent_loops, Some(4));
        assert_eq!(policy.max_reflection_cycles, Some(1));
        assert!(policy.halt_on_policy_deny);
    }

    #[test]
    fn test_within() {
        assert!(ExecutionPolicy::within(None, 1_000));
        assert!(ExecutionPolicy::within(Some(2), 2));
        assert!(!ExecutionPolicy::within(Some(2), 3));
    }
}
