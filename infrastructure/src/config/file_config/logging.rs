//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// telemetry_path = ".agent-crew/run.telemetry.jsonl"
/// log_dir = ".agent-crew/logs"   # daily-rotated trace log
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one object per run event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry_path: Option<PathBuf>,
    /// Directory for the rotating trace log; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}
