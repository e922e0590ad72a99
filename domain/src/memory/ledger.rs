//! Short-term memory: the capacity-bounded ledger of one run.
//!
//! Appends take `&self` so concurrently running units of work can record
//! entries through a shared reference. When full, the oldest entry is dropped.

use super::entry::{MemoryEntry, MemoryRecord, Observation, Thought};
use crate::agent::value_objects::AgentId;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_MEMORY_CAPACITY: usize = 200;

#[derive(Debug)]
pub struct ShortTermMemory {
    capacity: usize,
    entries: Mutex<VecDeque<MemoryEntry>>,
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl ShortTermMemory {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A poisoned lock still holds a consistent deque: every mutation is a
    // single push/pop.
    fn lock(&self) -> MutexGuard<'_, VecDeque<MemoryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, record: impl Into<MemoryRecord>) -> MemoryEntry {
        let entry = MemoryEntry::new(record);
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    pub fn thought(&self, thought: Thought) -> MemoryEntry {
        self.append(thought)
    }

    pub fn observe(&self, observation: Observation) -> MemoryEntry {
        self.append(observation)
    }

    /// All entries, oldest first.
    pub fn snapshot(&self) -> Vec<MemoryEntry> {
        self.lock().iter().cloned().collect()
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<MemoryEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn by_agent(&self, agent: &AgentId) -> Vec<MemoryEntry> {
        self.lock()
            .iter()
            .filter(|e| e.agent_id() == Some(agent))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The newest `n` entries as prompt-ready bullet lines. Empty when the
    /// ledger is empty.
    pub fn render_notes(&self, n: usize) -> String {
        self.recent(n)
            .iter()
            .map(|e| format!("- {}", e.render()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
