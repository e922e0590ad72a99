//! Structured decisions recovered from model output.

pub mod parser;
pub mod plan_draft;
pub mod route;

pub use parser::{DecisionParseError, JsonObject, extract_object};
pub use plan_draft::{NormalizationReport, PlanDraft, StepDraft};
pub use route::{RouteDecision, RouteStrategy};
