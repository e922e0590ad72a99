//! Agent domain entities: agents, crews and the resolved active roster.

use super::value_objects::AgentId;
use crate::core::error::DomainError;
use crate::orchestration::policy::ExecutionPolicy;
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// A specialized agent definition, as read from the configuration store.
///
/// Agents are immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Free-text role description, used in prompts and fallback plans.
    pub role: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the model/provider the language-model client should use.
    #[serde(default)]
    pub model_provider: Option<String>,
    /// Explicit tool allowlist. `None` or empty means unrestricted.
    #[serde(default)]
    pub allowed_tool_ids: Option<Vec<String>>,
    #[serde(default)]
    pub parallel_group: Option<String>,
    /// Reviewer-type agents are excluded from default work batches.
    #[serde(default)]
    pub reflection_role: bool,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            enabled: true,
            model_provider: None,
            allowed_tool_ids: None,
            parallel_group: None,
            reflection_role: false,
        }
    }

    // ==================== Builder Methods ====================

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_model_provider(mut self, provider: impl Into<String>) -> Self {
        self.model_provider = Some(provider.into());
        self
    }

    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tool_ids = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn as_reflector(mut self) -> Self {
        self.reflection_role = true;
        self
    }

    /// Enabled and not a reflection-role agent.
    pub fn is_worker(&self) -> bool {
        self.enabled && !self.reflection_role
    }

    /// Enabled reflection-role agent.
    pub fn is_reflector(&self) -> bool {
        self.enabled && self.reflection_role
    }

    /// One line describing this agent for model prompts.
    pub fn roster_line(&self) -> String {
        let mut line = format!("- {}: {}", self.id, self.role);
        if let Some(group) = &self.parallel_group {
            line.push_str(&format!(" (group: {})", group));
        }
        if self.reflection_role {
            line.push_str(" [reviewer]");
        }
        line
    }
}

/// A named roster of agents in the configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crew {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub agents: Vec<Agent>,
    /// Crew-specific execution policy; falls back to the global policy.
    #[serde(default)]
    pub policy: Option<ExecutionPolicy>,
}

impl Crew {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            is_default: false,
            agents: Vec::new(),
            policy: None,
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Resolve the active crew: the selected one, else the one flagged
    /// default, else the first available.
    ///
    /// A selection naming an unknown crew falls through to the default rule.
    pub fn resolve_active<'a>(crews: &'a [Crew], selected: Option<&str>) -> Option<&'a Crew> {
        selected
            .and_then(|id| crews.iter().find(|c| c.id == id))
            .or_else(|| crews.iter().find(|c| c.is_default))
            .or_else(|| crews.first())
    }
}

/// Immutable snapshot of the roster a run executes against.
///
/// Built once before orchestration starts; the engine never re-reads the
/// configuration store mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoster {
    pub crew_id: String,
    pub crew_name: String,
    pub agents: Vec<Agent>,
    pub policy: ExecutionPolicy,
}

impl ActiveRoster {
    /// Resolve the active roster from the configured crews.
    ///
    /// `global_policy` applies when the crew carries no policy of its own.
    pub fn resolve(
        crews: &[Crew],
        selected: Option<&str>,
        global_policy: ExecutionPolicy,
    ) -> Result<Self, DomainError> {
        let crew = Crew::resolve_active(crews, selected).ok_or(DomainError::NoActiveCrew)?;
        Ok(Self {
            crew_id: crew.id.clone(),
            crew_name: crew.display_name().to_string(),
            agents: crew.agents.clone(),
            policy: crew.policy.clone().unwrap_or(global_policy),
        })
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// Enabled, non-reflection agents in roster order.
    pub fn workers(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_worker())
    }

    /// Enabled reflection-role agents in roster order.
    pub fn reflectors(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_reflector())
    }

    /// Roster summary handed to the route and planning prompts.
    pub fn summary(&self) -> String {
        self.agents
            .iter()
            .filter(|a| a.enabled)
            .map(Agent::roster_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
