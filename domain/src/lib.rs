//! Domain layer for agent-crew
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Crew
//!
//! A crew is a named roster of agents. Each run executes against one
//! [`ActiveRoster`] snapshot resolved before the run starts.
//!
//! ## Route and Plan
//!
//! - **Route decision**: per-run choice between planning first and running
//!   every agent directly
//! - **Plan**: dependency-ordered steps, executed in waves
//!
//! ## Termination
//!
//! [`TerminationState`] latches the first reason a run stopped early.

pub mod agent;
pub mod core;
pub mod decision;
pub mod memory;
pub mod orchestration;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use agent::{ActiveRoster, Agent, AgentId, Crew, StepId};
pub use core::error::DomainError;
pub use decision::{
    DecisionParseError, NormalizationReport, PlanDraft, RouteDecision, RouteStrategy, StepDraft,
};
pub use memory::{MemoryEntry, MemoryRecord, Observation, ShortTermMemory, Thought};
pub use orchestration::{
    ExecutionPhase, ExecutionPolicy, Termination, TerminationReason, TerminationState, WorkLabel,
    WorkResult,
};
pub use plan::{DEPENDENCIES_UNRESOLVED, FALLBACK_PLAN_RATIONALE, Plan, PlanStep, StepStatus};
pub use prompt::CrewPromptTemplate;
pub use session::{Message, Role};
pub use tool::{AllowDecision, ToolAllowlist, ToolDenied, ToolPolicy};
