//! Memory entries: thoughts and observations recorded during a run.

use crate::agent::value_objects::AgentId;
use crate::orchestration::phase::ExecutionPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text reasoning recorded by the orchestrator or an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ExecutionPhase>,
}

impl Thought {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent_id: None,
            phase: None,
        }
    }

    pub fn by(mut self, agent: &AgentId) -> Self {
        self.agent_id = Some(agent.clone());
        self
    }

    pub fn in_phase(mut self, phase: ExecutionPhase) -> Self {
        self.phase = Some(phase);
        self
    }
}

/// Something that happened: a step outcome, a tool decision, a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Observation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent_id: None,
            tool_id: None,
            success: None,
            error: None,
        }
    }

    pub fn by(mut self, agent: &AgentId) -> Self {
        self.agent_id = Some(agent.clone());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_id = Some(tool.into());
        self
    }

    pub fn succeeded(mut self) -> Self {
        self.success = Some(true);
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = Some(false);
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryRecord {
    Thought(Thought),
    Observation(Observation),
}

impl From<Thought> for MemoryRecord {
    fn from(t: Thought) -> Self {
        MemoryRecord::Thought(t)
    }
}

impl From<Observation> for MemoryRecord {
    fn from(o: Observation) -> Self {
        MemoryRecord::Observation(o)
    }
}

/// A ledger entry with generated id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub record: MemoryRecord,
}

impl MemoryEntry {
    pub fn new(record: impl Into<MemoryRecord>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            record: record.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.record {
            MemoryRecord::Thought(_) => "thought",
            MemoryRecord::Observation(_) => "observation",
        }
    }

    pub fn text(&self) -> &str {
        match &self.record {
            MemoryRecord::Thought(t) => &t.text,
            MemoryRecord::Observation(o) => &o.text,
        }
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        match &self.record {
            MemoryRecord::Thought(t) => t.agent_id.as_ref(),
            MemoryRecord::Observation(o) => o.agent_id.as_ref(),
        }
    }

    pub fn as_observation(&self) -> Option<&Observation> {
        match &self.record {
            MemoryRecord::Observation(o) => Some(o),
            MemoryRecord::Thought(_) => None,
        }
    }

    /// One-line rendering used in prompt notes and console output.
    pub fn render(&self) -> String {
        let agent = self
            .agent_id()
            .map(|a| format!(" ({})", a))
            .unwrap_or_default();
        match &self.record {
            MemoryRecord::Observation(o) if o.success == Some(false) => format!(
                "[observation{}] {} (error: {})",
                agent,
                o.text,
                o.error.as_deref().unwrap_or("unknown")
            ),
            _ => format!("[{}{}] {}", self.kind(), agent, self.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_tagged() {
        let entry = MemoryEntry::new(
            Observation::new("step s1 failed")
                .by(&AgentId::new("coder"))
                .failed("boom"),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "observation");
        assert_eq!(json["agent_id"], "coder");
        assert_eq!(json["success"], false);
        assert!(json.get("tool_id").is_none());
    }

    #[test]
    fn test_render() {
        let thought =
            MemoryEntry::new(Thought::new("Routing: direct").in_phase(ExecutionPhase::Planning));
        assert_eq!(thought.render(), "[thought] Routing: direct");

        let failed = MemoryEntry::new(Observation::new("s2").by(&AgentId::new("a")).failed("x"));
        assert_eq!(failed.render(), "[observation (a)] s2 (error: x)");
    }
}
