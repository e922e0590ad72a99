//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod batch_executor;
pub mod llm_worker;
pub mod orchestrator;
pub mod plan_executor;
pub mod planner;
pub mod structured_output;
