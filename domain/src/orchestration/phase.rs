//! Execution phase tag carried by every unit of work.

use serde::{Deserialize, Serialize};

/// Phase a unit of work belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Planning,
    Execution,
    Reflection,
}

impl ExecutionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPhase::Planning => "planning",
            ExecutionPhase::Execution => "execution",
            ExecutionPhase::Reflection => "reflection",
        }
    }
}

impl std::fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
