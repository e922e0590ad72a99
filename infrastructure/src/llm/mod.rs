//! Language-model gateway adapters
//!
//! - [`ScriptedLlmGateway`]: offline replay of configured replies
//! - `OpenAiCompatibleGateway`: HTTP client, behind the `http-llm` feature

#[cfg(feature = "http-llm")]
mod openai;
mod scripted;

#[cfg(feature = "http-llm")]
pub use openai::OpenAiCompatibleGateway;
pub use scripted::ScriptedLlmGateway;

use crate::config::FileLlmConfig;
use crew_application::{GatewayError, LlmGateway};
use std::sync::Arc;

/// Build the gateway described by the `[llm]` section.
pub fn build_gateway(config: &FileLlmConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    if config.is_scripted() {
        return Ok(Arc::new(ScriptedLlmGateway::new(
            config.scripted_responses.iter().cloned(),
        )));
    }
    http_gateway(config)
}

#[cfg(feature = "http-llm")]
fn http_gateway(config: &FileLlmConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    let gateway = OpenAiCompatibleGateway::new(
        &config.endpoint,
        &config.model,
        config.api_key(),
        config.timeout_seconds.map(std::time::Duration::from_secs),
    )?;
    Ok(Arc::new(gateway))
}

#[cfg(not(feature = "http-llm"))]
fn http_gateway(_config: &FileLlmConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    Err(GatewayError::ModelNotAvailable(
        "built without the http-llm feature; set llm.scripted_responses for offline runs"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_application::CompletionOptions;
    use crew_domain::Message;

    #[tokio::test]
    async fn test_scripted_config_builds_offline_gateway() {
        let config = FileLlmConfig {
            scripted_responses: vec!["hello".into()],
            ..Default::default()
        };
        let gateway = build_gateway(&config).unwrap();
        let reply = gateway
            .complete(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "hello");
    }
}
