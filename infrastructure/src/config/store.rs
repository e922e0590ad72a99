//! File-backed configuration store
//!
//! Exposes a loaded [`FileConfig`] through the [`ConfigStorePort`] keys.

use super::file_config::FileConfig;
use crew_application::{ConfigKey, ConfigStorePort};
use serde_json::Value;
use tracing::warn;

/// Read-only view over the crews, selection and policy of a [`FileConfig`].
///
/// Values are serialized once at construction, so later edits to the source
/// config are not observed.
pub struct FileConfigStore {
    crews: Value,
    selected_crew_id: Value,
    execution_policy: Value,
}

impl FileConfigStore {
    pub fn new(config: &FileConfig) -> Self {
        Self {
            crews: to_value("crews", &config.crews),
            selected_crew_id: to_value("selected_crew", &config.selected_crew),
            execution_policy: to_value("execution", &config.execution.policy()),
        }
    }

    /// Store whose selection is replaced, e.g. by a `--crew` flag.
    pub fn with_selected_crew(mut self, crew_id: impl Into<String>) -> Self {
        self.selected_crew_id = Value::String(crew_id.into());
        self
    }
}

fn to_value(section: &str, value: &impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(section, error = %e, "Could not serialize config section");
        Value::Null
    })
}

impl ConfigStorePort for FileConfigStore {
    fn get(&self, key: ConfigKey) -> Option<Value> {
        let value = match key {
            ConfigKey::Crews => &self.crews,
            ConfigKey::SelectedCrewId => &self.selected_crew_id,
            ConfigKey::ExecutionPolicy => &self.execution_policy,
        };
        (!value.is_null()).then(|| value.clone())
    }
}
