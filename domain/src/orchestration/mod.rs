//! Orchestration domain
//!
//! Execution phases, execution policy, the termination latch, and
//! unit-of-work records.

pub mod phase;
pub mod policy;
pub mod termination;
pub mod work;

pub use phase::ExecutionPhase;
pub use policy::ExecutionPolicy;
pub use termination::{Termination, TerminationReason, TerminationState};
pub use work::{WorkLabel, WorkResult};
