//! Checkpoint hook port
//!
//! An optional side effect invoked immediately around each unit of work's
//! action (for example, committing the working tree). Failures are logged
//! and counted by the batch executor but never abort the batch.

use async_trait::async_trait;
use crew_domain::{WorkLabel, WorkResult};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Checkpoint failed: {0}")]
pub struct CheckpointError(pub String);

#[async_trait]
pub trait CheckpointHook: Send + Sync {
    /// Runs right before the action starts.
    async fn before(&self, label: &WorkLabel) -> Result<(), CheckpointError>;

    /// Runs right after the action settles, including when it failed.
    async fn after(&self, label: &WorkLabel, result: &WorkResult) -> Result<(), CheckpointError>;
}
