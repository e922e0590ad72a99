//! Configuration store port.
//!
//! A read-only, key-based accessor over the crew configuration. The core
//! reads it once to build an [`ActiveRoster`] snapshot and never writes to it.

use crew_domain::{ActiveRoster, Crew, DomainError, ExecutionPolicy};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys the core reads from the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Array of crew definitions, each with its agents.
    Crews,
    /// Id of the crew selected by the user, if any.
    SelectedCrewId,
    /// Global execution policy applied to crews without their own.
    ExecutionPolicy,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Crews => "crews",
            ConfigKey::SelectedCrewId => "selected_crew_id",
            ConfigKey::ExecutionPolicy => "execution_policy",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Port for reading crew configuration.
pub trait ConfigStorePort: Send + Sync {
    /// Current value for `key`, or `None` when unset.
    fn get(&self, key: ConfigKey) -> Option<Value>;
}

fn read<T: DeserializeOwned>(
    store: &dyn ConfigStorePort,
    key: ConfigKey,
) -> Result<Option<T>, DomainError> {
    store
        .get(key)
        .filter(|v| !v.is_null())
        .map(|v| {
            serde_json::from_value(v).map_err(|e| {
                DomainError::InvalidConfiguration(format!("'{}': {}", key, e))
            })
        })
        .transpose()
}

/// Build the active roster snapshot from the store.
///
/// Selection order: the selected crew, else the crew flagged default, else
/// the first crew. Fails with [`DomainError::NoActiveCrew`] when none resolves.
pub fn load_active_roster(store: &dyn ConfigStorePort) -> Result<ActiveRoster, DomainError> {
    let crews: Vec<Crew> = read(store, ConfigKey::Crews)?.unwrap_or_default();
    let selected: Option<String> = read(store, ConfigKey::SelectedCrewId)?;
    let policy: ExecutionPolicy = read(store, ConfigKey::ExecutionPolicy)?.unwrap_or_default();

    ActiveRoster::resolve(&crews, selected.as_deref(), policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapStore(HashMap<&'static str, Value>);

    impl ConfigStorePort for MapStore {
        fn get(&self, key: ConfigKey) -> Option<Value> {
            self.0.get(key.as_str()).cloned()
        }
    }

    #[test]
    fn test_load_selected_crew() {
        let store = MapStore(HashMap::from([
            (
                "crews",
                json!([
                    {"id": "a", "agents": [{"id": "x", "role": "r"}]},
                    {"id": "b", "agents": [{"id": "y", "role": "r"}]}
                ]),
            ),
            ("selected_crew_id", json!("b")),
            ("execution_policy", json!({"max_agent_loops": 2})),
        ]));
        let roster = load_active_roster(&store).unwrap();
        assert_eq!(roster.crew_id, "b");
        assert_eq!(roster.policy.max_agent_loops, Some(2));
    }

    #[test]
    fn test_empty_store_has_no_roster() {
        let store = MapStore(HashMap::new());
        assert_eq!(load_active_roster(&store), Err(DomainError::NoActiveCrew));
    }

    #[test]
    fn test_malformed_crews_reported() {
        let store = MapStore(HashMap::from([("crews", json!({"not": "an array"}))]));
        let err = load_active_roster(&store).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("crews"));
    }
}
