//! Application-level configuration.
//!
//! - [`OrchestratorParams`]: concurrency, repair attempts, plan size, memory

pub mod orchestrator_params;

pub use orchestrator_params::OrchestratorParams;
