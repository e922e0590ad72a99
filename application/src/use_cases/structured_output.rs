//! Structured output use case
//!
//! Requests a JSON decision from the model and repairs it in conversation:
//! after an unusable answer, the raw answer and a repair instruction are
//! appended to the transcript and the model is asked again.

use crate::ports::llm_gateway::{CompletionOptions, GatewayError, LlmGateway};
use crate::ports::telemetry::{AttemptReport, DecisionKind};
use crew_domain::util::{single_line, truncate_chars};
use crew_domain::{CrewPromptTemplate, DecisionParseError, Message};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuredOutputError {
    #[error("no valid {kind} response after {attempts} attempt(s): {last_error}")]
    Exhausted {
        kind: &'static str,
        attempts: usize,
        last_error: DecisionParseError,
    },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl StructuredOutputError {
    /// Attempts consumed before giving up. Gateway failures abort on the
    /// attempt they occur in and report zero.
    pub fn attempts(&self) -> usize {
        match self {
            StructuredOutputError::Exhausted { attempts, .. } => *attempts,
            StructuredOutputError::Gateway(_) => 0,
        }
    }
}

/// A decision plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T> {
    pub value: T,
    pub attempts: usize,
}

/// Parse/validate/repair loop shared by routing and planning.
pub struct StructuredOutputRequest<'a> {
    gateway: &'a dyn LlmGateway,
    options: &'a CompletionOptions,
    kind: DecisionKind,
    max_attempts: usize,
}

impl<'a> StructuredOutputRequest<'a> {
    /// `max_attempts` of zero is treated as one.
    pub fn new(
        gateway: &'a dyn LlmGateway,
        options: &'a CompletionOptions,
        kind: DecisionKind,
        max_attempts: usize,
    ) -> Self {
        Self {
            gateway,
            options,
            kind,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn run<T>(
        &self,
        mut messages: Vec<Message>,
        parse: impl Fn(&str) -> Result<T, DecisionParseError>,
        mut on_attempt: impl FnMut(&AttemptReport),
    ) -> Result<Structured<T>, StructuredOutputError> {
        let kind = self.kind.as_str();
        let mut last_error = DecisionParseError::NoObjectFound;

        for attempt in 1..=self.max_attempts {
            let raw = self.gateway.complete(&messages, self.options).await?;

            match parse(&raw) {
                Ok(value) => {
                    debug!(kind, attempt, "Structured response accepted");
                    on_attempt(&self.report(attempt, None));
                    return Ok(Structured {
                        value,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(
                        kind,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        raw = %truncate_chars(&single_line(&raw), 200),
                        "Structured response rejected"
                    );
                    on_attempt(&self.report(attempt, Some(e.to_string())));

                    messages.push(Message::assistant(raw));
                    messages.push(Message::user(CrewPromptTemplate::repair_instruction(
                        &e.to_string(),
                    )));
                    last_error = e;
                }
            }
        }

        Err(StructuredOutputError::Exhausted {
            kind,
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn report(&self, attempt: usize, error: Option<String>) -> AttemptReport {
        AttemptReport {
            kind: self.kind,
            attempt,
            max_attempts: self.max_attempts,
            error,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_domain::{RouteDecision, RouteStrategy, Role};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Gateway returning scripted replies in order, repeating the last one.
    pub(crate) struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, GatewayError>>>,
        pub(crate) calls: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedGateway {
        pub(crate) fn new(replies: Vec<&str>) -> Self {
            Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
        }

        pub(crate) fn with_results(replies: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Err(GatewayError::Other("no scripted reply".into())))
            }
        }
    }

    fn request<'a>(
        gateway: &'a ScriptedGateway,
        options: &'a CompletionOptions,
        max: usize,
    ) -> StructuredOutputRequest<'a> {
        StructuredOutputRequest::new(gateway, options, DecisionKind::Route, max)
    }

    #[tokio::test]
    async fn test_valid_first_attempt_needs_no_repair() {
        let gateway = ScriptedGateway::new(vec![
            r#"{"strategy": "direct_execution", "rationale": "small"}"#,
        ]);
        let options = CompletionOptions::default();
        let mut reports = Vec::new();

        let result = request(&gateway, &options, 3)
            .run(vec![Message::user("route")], RouteDecision::parse, |r| {
                reports.push(r.clone())
            })
            .await
            .unwrap();

        assert_eq!(result.value.strategy, RouteStrategy::DirectExecution);
        assert_eq!(result.attempts, 1);
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].error.is_none());
    }

    #[tokio::test]
    async fn test_permanently_invalid_uses_exactly_max_attempts() {
        let gateway = ScriptedGateway::new(vec!["I refuse to answer in JSON"]);
        let options = CompletionOptions::default();

        let err = request(&gateway, &options, 3)
            .run(vec![Message::user("route")], RouteDecision::parse, |_| {})
            .await
            .unwrap_err();

        assert_eq!(gateway.call_count(), 3);
        assert_eq!(err.attempts(), 3);
        assert!(err.to_string().contains("no parseable object found"));
    }

    #[tokio::test]
    async fn test_repair_appends_raw_output_and_instruction() {
        let gateway = ScriptedGateway::new(vec![
            r#"{"strategy": "sideways", "rationale": "x"}"#,
            r#"{"strategy": "plan_then_parallel", "rationale": "fixed"}"#,
        ]);
        let options = CompletionOptions::default();

        let result = request(&gateway, &options, 3)
            .run(vec![Message::user("route")], RouteDecision::parse, |_| {})
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);

        let calls = gateway.calls.lock().unwrap();
        let second = &calls[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);
        assert!(second[1].content.contains("sideways"));
        assert_eq!(second[2].role, Role::User);
        assert!(second[2].content.contains("\"sideways\" is not one of"));
    }

    #[tokio::test]
    async fn test_gateway_error_aborts_immediately() {
        let gateway = ScriptedGateway::with_results(vec![Err(GatewayError::Timeout)]);
        let options = CompletionOptions::default();

        let err = request(&gateway, &options, 3)
            .run(vec![Message::user("route")], RouteDecision::parse, |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, StructuredOutputError::Gateway(GatewayError::Timeout));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_treated_as_one() {
        let gateway = ScriptedGateway::new(vec!["nope"]);
        let options = CompletionOptions::default();
        let err = request(&gateway, &options, 0)
            .run(vec![Message::user("route")], RouteDecision::parse, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.attempts(), 1);
    }
}
