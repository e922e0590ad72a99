//! Unit-of-work identity and result records.

use super::phase::ExecutionPhase;
use crate::agent::value_objects::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one dispatched unit of work.
///
/// `correlation_id` is unique per dispatch within a batch; plan steps use
/// their step id so results can be matched back without ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkLabel {
    pub agent_id: AgentId,
    pub phase: ExecutionPhase,
    pub correlation_id: String,
}

impl WorkLabel {
    pub fn new(
        agent_id: impl Into<AgentId>,
        phase: ExecutionPhase,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            phase,
            correlation_id: correlation_id.into(),
        }
    }
}

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    #[serde(flatten)]
    pub label: WorkLabel,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WorkResult {
    pub fn succeeded(
        label: WorkLabel,
        output: Option<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            label,
            success: true,
            output,
            error: None,
            started_at,
            finished_at,
        }
    }

    /// A failure caught at `at`; both timestamps are set to that instant.
    pub fn caught(label: WorkLabel, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            label,
            success: false,
            output: None,
            error: Some(error.into()),
            started_at: at,
            finished_at: at,
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.label.agent_id
    }

    pub fn correlation_id(&self) -> &str {
        &self.label.correlation_id
    }
}
