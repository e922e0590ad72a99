//! OpenAI-compatible chat-completions adapter
//!
//! Works against any server exposing `POST {endpoint}/chat/completions`
//! (OpenAI, vLLM, LM Studio, Ollama's compatibility layer).

use async_trait::async_trait;
use crew_application::{CompletionOptions, GatewayError, LlmGateway};
use crew_domain::Message;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleGateway {
    /// `model` is the default; per-request options may override it.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    fn request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a CompletionOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

fn first_content(response: ChatResponse) -> Result<String, GatewayError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".to_string()))
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let request = self.request(messages, options);
        let url = format!("{}/chat/completions", self.endpoint);
        debug!(model = request.model, messages = messages.len(), "Chat completion request");

        let mut http = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::ConnectionError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                404 => GatewayError::ModelNotAvailable(request.model.to_string()),
                401 | 403 => {
                    GatewayError::RequestFailed(format!("authentication failed: {}", body))
                }
                _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status, body)),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        first_content(parsed)
    }
}
