//! Plan drafts: the planner's raw output, validated and then normalized
//! into a [`Plan`].
//!
//! Expected schema:
//! ```json
//! {
//!   "rationale": "string (non-empty)",
//!   "steps": [
//!     {
//!       "id": "string (optional)",
//!       "description": "string (non-empty)",
//!       "agent_id": "string (optional)",
//!       "parallel_group": "string (optional)",
//!       "depends_on": ["step id", ...]
//!     }
//!   ]
//! }
//! ```

use super::parser::{
    DecisionParseError, extract_object, json_type_name, optional_str, optional_str_array,
    require_keys, require_non_empty_str,
};
use crate::agent::value_objects::{AgentId, StepId};
use crate::plan::entities::{Plan, PlanStep};
use serde_json::Value;
use std::collections::HashSet;

/// One raw step as the model described it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    pub id: Option<String>,
    pub description: String,
    pub agent_id: Option<String>,
    pub parallel_group: Option<String>,
    pub depends_on: Option<Vec<String>>,
}

/// A validated but not yet normalized plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub rationale: String,
    pub steps: Vec<StepDraft>,
}

/// What normalization had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Steps past the cap that were discarded.
    pub dropped_steps: usize,
    /// `(original id, assigned id)` for every step whose id was generated
    /// or reassigned. `None` means the model gave no id.
    pub reassigned: Vec<(Option<String>, StepId)>,
}

impl PlanDraft {
    pub const REQUIRED_KEYS: [&'static str; 2] = ["rationale", "steps"];

    /// Parse and validate a plan draft from raw model text.
    pub fn parse(raw: &str) -> Result<Self, DecisionParseError> {
        let object = extract_object(raw)?;
        require_keys(&object, &Self::REQUIRED_KEYS)?;

        let rationale = require_non_empty_str(object.get("rationale"), "rationale")?;

        let raw_steps = match object.get("steps") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(DecisionParseError::invalid(
                    "steps",
                    format!("expected an array, got {}", json_type_name(other)),
                ));
            }
            None => return Err(DecisionParseError::MissingKey("steps".into())),
        };
        if raw_steps.is_empty() {
            return Err(DecisionParseError::invalid(
                "steps",
                "must contain at least one step",
            ));
        }

        let steps = raw_steps
            .iter()
            .enumerate()
            .map(|(index, value)| parse_step(index, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rationale: rationale.trim().to_string(),
            steps,
        })
    }

    /// Normalize into a [`Plan`]: cap the step count, assign sequential ids
    /// to steps without one, and reassign duplicated ids (first occurrence
    /// wins). Every step starts pending.
    pub fn normalize(self, max_steps: usize) -> (Plan, NormalizationReport) {
        let mut report = NormalizationReport::default();
        let mut drafts = self.steps;
        if drafts.len() > max_steps {
            report.dropped_steps = drafts.len() - max_steps;
            drafts.truncate(max_steps);
        }

        let mut used: HashSet<StepId> = HashSet::new();
        let mut steps = Vec::with_capacity(drafts.len());

        for (index, draft) in drafts.into_iter().enumerate() {
            let id = match &draft.id {
                Some(id) if !used.contains(&StepId::new(id.as_str())) => StepId::new(id.as_str()),
                original => {
                    let assigned = next_free_id(index, &used);
                    report.reassigned.push((original.clone(), assigned.clone()));
                    assigned
                }
            };
            used.insert(id.clone());

            let mut step = PlanStep::new(id, draft.description);
            step.agent_id = draft.agent_id.map(AgentId::new);
            step.parallel_group = draft.parallel_group;
            step.depends_on = draft
                .depends_on
                .unwrap_or_default()
                .into_iter()
                .map(StepId::new)
                .collect();
            steps.push(step);
        }

        (Plan::new(Some(self.rationale), steps), report)
    }
}

/// The positional id for `index`, or the next free `sN` after it.
fn next_free_id(index: usize, used: &HashSet<StepId>) -> StepId {
    (index..)
        .map(StepId::sequential)
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| StepId::sequential(index))
}

fn parse_step(index: usize, value: &Value) -> Result<StepDraft, DecisionParseError> {
    let key = |field: &str| format!("steps[{}].{}", index, field);

    let Value::Object(step) = value else {
        return Err(DecisionParseError::invalid(
            format!("steps[{}]", index),
            format!("expected an object, got {}", json_type_name(value)),
        ));
    };

    Ok(StepDraft {
        id: optional_str(step.get("id"), &key("id"))?.map(str::to_string),
        description: require_non_empty_str(step.get("description"), &key("description"))?
            .trim()
            .to_string(),
        agent_id: optional_str(step.get("agent_id"), &key("agent_id"))?.map(str::to_string),
        parallel_group: optional_str(step.get("parallel_group"), &key("parallel_group"))?
            .map(str::to_string),
        depends_on: optional_str_array(step.get("depends_on"), &key("depends_on"))?,
    })
}
