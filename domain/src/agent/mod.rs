//! Agent domain module
//!
//! Agent definitions, crews, and the per-run roster snapshot.

pub mod entities;
pub mod value_objects;

pub use entities::{ActiveRoster, Agent, Crew};
pub use value_objects::{AgentId, StepId};
