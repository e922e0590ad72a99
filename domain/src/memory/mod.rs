//! Short-term memory for a single run

pub mod entry;
pub mod ledger;

pub use entry::{MemoryEntry, MemoryRecord, Observation, Thought};
pub use ledger::{DEFAULT_MEMORY_CAPACITY, ShortTermMemory};
