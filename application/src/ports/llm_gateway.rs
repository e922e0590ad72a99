//! LLM Gateway port
//!
//! Defines the interface for communicating with language-model providers.
//! The core imposes no schema on the model; all validation happens on the
//! returned text.

use async_trait::async_trait;
use crew_domain::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Optional sampling parameters for one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model/provider override. `None` uses the gateway's default model.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Copy of these options with the model replaced when `model` is set.
    pub fn overridden_by(&self, model: Option<&str>) -> Self {
        match model {
            Some(m) => self.clone().with_model(m),
            None => self.clone(),
        }
    }
}

/// Gateway for LLM communication
///
/// Accepts an ordered message sequence and returns the raw text of the
/// model's reply. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_keeps_sampling() {
        let base = CompletionOptions::default()
            .with_model("default")
            .with_temperature(0.2);
        let agent = base.overridden_by(Some("gpt-4o-mini"));
        assert_eq!(agent.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(agent.temperature, Some(0.2));
        assert_eq!(base.overridden_by(None), base);
    }
}
