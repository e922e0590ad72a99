//! Plan domain

pub mod entities;

pub use entities::{DEPENDENCIES_UNRESOLVED, FALLBACK_PLAN_RATIONALE, Plan, PlanStep, StepStatus};
