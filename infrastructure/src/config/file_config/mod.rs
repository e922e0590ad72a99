//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Crews and agents deserialize straight into domain types.

mod execution;
mod llm;
mod logging;
mod output;

pub use execution::FileExecutionConfig;
pub use llm::FileLlmConfig;
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};

use crew_domain::Crew;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("execution.max_concurrency cannot be 0")]
    ZeroConcurrency,

    #[error("crew id cannot be empty")]
    EmptyCrewId,

    #[error("crew '{0}' is defined more than once; the first definition wins")]
    DuplicateCrewId(String),

    #[error("crew '{crew}' has an agent with an empty id")]
    EmptyAgentId { crew: String },

    #[error("crew '{crew}' defines agent '{agent}' more than once")]
    DuplicateAgentId { crew: String, agent: String },

    #[error("crew '{0}' has no enabled agents")]
    NoEnabledAgents(String),

    #[error("selected_crew '{0}' does not match any crew; falling back to the default crew")]
    UnknownSelectedCrew(String),

    #[error("llm.model cannot be empty")]
    EmptyModelName,

    #[error("llm.temperature {0} is outside 0.0..=2.0")]
    TemperatureOutOfRange(f32),
}

impl ConfigValidationError {
    /// Fatal issues stop the binary; the rest are reported as warnings.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConfigValidationError::ZeroConcurrency
                | ConfigValidationError::EmptyCrewId
                | ConfigValidationError::EmptyAgentId { .. }
                | ConfigValidationError::DuplicateAgentId { .. }
                | ConfigValidationError::EmptyModelName
        )
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Crew definitions, each with its agents
    pub crews: Vec<Crew>,
    /// Crew to run; falls back to the default crew, then the first one
    pub selected_crew: Option<String>,
    /// Concurrency, repair attempts and termination ceilings
    pub execution: FileExecutionConfig,
    /// Language-model endpoint settings
    pub llm: FileLlmConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log and telemetry file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.execution.max_concurrency == 0 {
            issues.push(ConfigValidationError::ZeroConcurrency);
        }

        let mut crew_ids = HashSet::new();
        for crew in &self.crews {
            if crew.id.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyCrewId);
                continue;
            }
            if !crew_ids.insert(crew.id.as_str()) {
                issues.push(ConfigValidationError::DuplicateCrewId(crew.id.clone()));
            }

            let mut agent_ids = HashSet::new();
            for agent in &crew.agents {
                if agent.id.as_str().trim().is_empty() {
                    issues.push(ConfigValidationError::EmptyAgentId {
                        crew: crew.id.clone(),
                    });
                } else if !agent_ids.insert(agent.id.as_str()) {
                    issues.push(ConfigValidationError::DuplicateAgentId {
                        crew: crew.id.clone(),
                        agent: agent.id.to_string(),
                    });
                }
            }
            if !crew.agents.iter().any(|a| a.enabled) {
                issues.push(ConfigValidationError::NoEnabledAgents(crew.id.clone()));
            }
        }

        if let Some(selected) = &self.selected_crew
            && !self.crews.iter().any(|c| &c.id == selected)
        {
            issues.push(ConfigValidationError::UnknownSelectedCrew(selected.clone()));
        }

        issues.extend(self.llm.validate());
        issues
    }

    /// The fatal subset of [`FileConfig::validate`].
    pub fn fatal_issues(&self) -> Vec<ConfigValidationError> {
        self.validate().into_iter().filter(|i| i.is_fatal()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
selected_crew = "core"

[execution]
max_concurrency = 2
max_agent_loops = 5
enable_reflection = true

[llm]
model = "gpt-4o"
temperature = 0.2

[output]
format = "json"

[[crews]]
id = "core"
name = "Core team"

[[crews.agents]]
id = "coder"
role = "Rust engineer"
allowed_tool_ids = ["read_file"]

[[crews.agents]]
id = "critic"
role = "Reviewer"
reflection_role = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.selected_crew.as_deref(), Some("core"));
        assert_eq!(config.execution.max_concurrency, 2);
        assert_eq!(config.execution.max_agent_loops, Some(5));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.output.format, Some(FileOutputFormat::Json));
        assert_eq!(config.crews[0].agents.len(), 2);
        assert!(config.crews[0].agents[1].reflection_role);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_config_is_valid_but_empty() {
        let config = FileConfig::default();
        assert!(config.crews.is_empty());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_duplicates_and_zero_concurrency() {
        let toml_str = r#"
selected_crew = "missing"

[execution]
max_concurrency = 0

[[crews]]
id = "core"

[[crews.agents]]
id = "a"
role = "r"

[[crews.agents]]
id = "a"
role = "r"
enabled = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        assert!(issues.contains(&ConfigValidationError::ZeroConcurrency));
        assert!(issues.contains(&ConfigValidationError::DuplicateAgentId {
            crew: "core".into(),
            agent: "a".into()
        }));
        assert!(issues.contains(&ConfigValidationError::UnknownSelectedCrew(
            "missing".into()
        )));
        assert_eq!(config.fatal_issues().len(), 2);
    }

    #[test]
    fn test_crew_without_enabled_agents_is_a_warning() {
        let toml_str = r#"
[[crews]]
id = "idle"

[[crews.agents]]
id = "a"
role = "r"
enabled = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(
            issues,
            vec![ConfigValidationError::NoEnabledAgents("idle".into())]
        );
        assert!(config.fatal_issues().is_empty());
    }
}
