//! Per-agent tool allowlist
//!
//! An agent with no policy, or with an absent or empty list, is unrestricted.
//! A non-empty list permits exactly the tools it names.

use crate::agent::entities::Agent;
use crate::agent::value_objects::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Tool policy for a single agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tool_ids: Option<Vec<String>>,
}

impl ToolPolicy {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn allow(tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_tool_ids: Some(tools.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed_tool_ids
            .as_ref()
            .is_some_and(|tools| !tools.is_empty())
    }

    fn permits(&self, tool: &str) -> bool {
        match &self.allowed_tool_ids {
            Some(tools) if !tools.is_empty() => tools.iter().any(|t| t == tool),
            _ => true,
        }
    }
}

/// Outcome of an allowlist check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowDecision {
    pub allowed: bool,
    pub reason: String,
}

/// Raised by [`ToolAllowlist::enforce`] when a tool is not permitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ToolDenied {
    pub agent_id: AgentId,
    pub tool_id: String,
    pub reason: String,
}

/// Gate deciding whether an agent may invoke a named tool.
#[derive(Debug, Clone, Default)]
pub struct ToolAllowlist {
    policies: HashMap<AgentId, ToolPolicy>,
}

impl ToolAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build policies from agent definitions.
    pub fn from_agents<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let policies = agents
            .into_iter()
            .map(|agent| {
                (
                    agent.id.clone(),
                    ToolPolicy {
                        allowed_tool_ids: agent.allowed_tool_ids.clone(),
                    },
                )
            })
            .collect();
        Self { policies }
    }

    /// Insert or replace the policy for an agent.
    pub fn upsert(&mut self, agent: impl Into<AgentId>, policy: ToolPolicy) {
        self.policies.insert(agent.into(), policy);
    }

    /// Remove an agent's policy, leaving it unrestricted.
    pub fn remove(&mut self, agent: &AgentId) -> Option<ToolPolicy> {
        self.policies.remove(agent)
    }

    pub fn policy(&self, agent: &AgentId) -> Option<&ToolPolicy> {
        self.policies.get(agent)
    }

    pub fn check(&self, agent: &AgentId, tool: &str) -> AllowDecision {
        match self.policies.get(agent) {
            None => AllowDecision {
                allowed: true,
                reason: format!("Agent '{}' has no tool policy; '{}' is allowed", agent, tool),
            },
            Some(policy) if !policy.is_restricted() => AllowDecision {
                allowed: true,
                reason: format!(
                    "Agent '{}' has no tool allowlist; '{}' is allowed",
                    agent, tool
                ),
            },
            Some(policy) if policy.permits(tool) => AllowDecision {
                allowed: true,
                reason: format!("Tool '{}' is on the allowlist of agent '{}'", tool, agent),
            },
            Some(_) => AllowDecision {
                allowed: false,
                reason: format!(
                    "Tool '{}' is not on the allowlist of agent '{}'",
                    tool, agent
                ),
            },
        }
    }

    pub fn enforce(&self, agent: &AgentId, tool: &str) -> Result<(), ToolDenied> {
        let decision = self.check(agent, tool);
        if decision.allowed {
            Ok(())
        } else {
            Err(ToolDenied {
                agent_id: agent.clone(),
                tool_id: tool.to_string(),
                reason: decision.reason,
            })
        }
    }
}
