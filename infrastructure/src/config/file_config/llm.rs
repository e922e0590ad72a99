//! Language-model configuration from TOML (`[llm]` section)

use super::ConfigValidationError;
use crew_application::CompletionOptions;
use serde::{Deserialize, Serialize};

/// Raw LLM configuration from TOML
///
/// # Example
///
/// ```toml
/// [llm]
/// endpoint = "https://api.openai.com/v1"   # any OpenAI-compatible server
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// temperature = 0.2
/// max_tokens = 2048
/// timeout_seconds = 120
/// ```
///
/// A non-empty `scripted_responses` list replaces the HTTP client with an
/// offline gateway that replays those replies in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    pub scripted_responses: Vec<String>,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: None,
            scripted_responses: Vec::new(),
        }
    }
}

impl FileLlmConfig {
    pub fn is_scripted(&self) -> bool {
        !self.scripted_responses.is_empty()
    }

    /// Per-request sampling options. The model itself is the gateway's default.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: None,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub(super) fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        if !self.is_scripted() && self.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModelName);
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            issues.push(ConfigValidationError::TemperatureOutOfRange(t));
        }
        issues
    }
}
