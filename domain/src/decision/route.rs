//! Route decision: the per-run choice of execution strategy.

use super::parser::{
    DecisionParseError, extract_object, json_type_name, require_keys, require_non_empty_str,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a run executes its agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    /// Produce a multi-step plan first, then execute it wave by wave.
    PlanThenParallel,
    /// Run every worker agent once, as a single flat batch.
    DirectExecution,
}

impl RouteStrategy {
    pub const ALL: [RouteStrategy; 2] = [
        RouteStrategy::PlanThenParallel,
        RouteStrategy::DirectExecution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStrategy::PlanThenParallel => "plan_then_parallel",
            RouteStrategy::DirectExecution => "direct_execution",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|strategy| strategy.as_str() == s)
    }
}

impl std::fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RouteStrategy {
    type Err = DecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| not_allowed(s))
    }
}

fn not_allowed(value: &str) -> DecisionParseError {
    let allowed = RouteStrategy::ALL
        .iter()
        .map(|s| format!("\"{}\"", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    DecisionParseError::invalid(
        "strategy",
        format!("\"{}\" is not one of {}", value, allowed),
    )
}

/// The validated route decision for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub strategy: RouteStrategy,
    pub rationale: String,
}

impl RouteDecision {
    pub const REQUIRED_KEYS: [&'static str; 2] = ["strategy", "rationale"];

    pub fn new(strategy: RouteStrategy, rationale: impl Into<String>) -> Self {
        Self {
            strategy,
            rationale: rationale.into(),
        }
    }

    /// Parse and validate a route decision from raw model text.
    pub fn parse(raw: &str) -> Result<Self, DecisionParseError> {
        let object = extract_object(raw)?;
        require_keys(&object, &Self::REQUIRED_KEYS)?;

        let strategy = match object.get("strategy") {
            Some(Value::String(s)) => s.parse::<RouteStrategy>()?,
            Some(other) => {
                return Err(DecisionParseError::invalid(
                    "strategy",
                    format!("expected a string, got {}", json_type_name(other)),
                ));
            }
            None => return Err(DecisionParseError::MissingKey("strategy".into())),
        };
        let rationale = require_non_empty_str(object.get("rationale"), "rationale")?;

        Ok(Self::new(strategy, rationale.trim()))
    }
}
