//! Offline gateway that replays configured replies.

use async_trait::async_trait;
use crew_application::{CompletionOptions, GatewayError, LlmGateway};
use crew_domain::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Returns the configured replies in order, then repeats the last one.
///
/// Used for dry runs and demos without network access.
pub struct ScriptedLlmGateway {
    replies: Vec<String>,
    cursor: AtomicUsize,
}

impl ScriptedLlmGateway {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Completions served so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmGateway for ScriptedLlmGateway {
    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        debug!(index, messages = messages.len(), "Scripted completion");

        self.replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or_else(|| {
                GatewayError::ModelNotAvailable("no scripted responses configured".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_repeats_last() {
        let gateway = ScriptedLlmGateway::new(["one", "two"]);
        let options = CompletionOptions::default();
        let messages = [Message::user("hi")];

        assert_eq!(gateway.complete(&messages, &options).await.unwrap(), "one");
        assert_eq!(gateway.complete(&messages, &options).await.unwrap(), "two");
        assert_eq!(gateway.complete(&messages, &options).await.unwrap(), "two");
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_is_unavailable() {
        let gateway = ScriptedLlmGateway::new(Vec::<String>::new());
        let err = gateway
            .complete(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(_)));
    }
}
