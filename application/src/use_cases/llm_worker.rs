//! Agent worker backed by the LLM gateway.

use crate::ports::agent_worker::{AgentTask, AgentWorker, WorkerError};
use crate::ports::llm_gateway::{CompletionOptions, LlmGateway};
use async_trait::async_trait;
use crew_domain::{Agent, CrewPromptTemplate, ExecutionPhase, Message};
use std::sync::Arc;
use tracing::debug;

/// Sends the agent's role as system prompt and the task as user prompt.
/// The agent's model-provider override, when set, replaces the default model.
pub struct LlmAgentWorker {
    gateway: Arc<dyn LlmGateway>,
    options: CompletionOptions,
}

impl LlmAgentWorker {
    pub fn new(gateway: Arc<dyn LlmGateway>, options: CompletionOptions) -> Self {
        Self { gateway, options }
    }
}

#[async_trait]
impl AgentWorker for LlmAgentWorker {
    async fn perform(&self, agent: &Agent, task: &AgentTask) -> Result<String, WorkerError> {
        let user = match task.phase {
            ExecutionPhase::Reflection => {
                CrewPromptTemplate::reflection_task(&task.goal, &task.description)
            }
            _ => CrewPromptTemplate::agent_task(&task.goal, &task.description),
        };
        let messages = [
            Message::system(CrewPromptTemplate::agent_system(agent)),
            Message::user(user),
        ];
        let options = self.options.overridden_by(agent.model_provider.as_deref());

        debug!(agent = %agent.id, phase = %task.phase, model = ?options.model, "Agent request");
        let output = self.gateway.complete(&messages, &options).await?;

        if output.trim().is_empty() {
            return Err(WorkerError::Failed(format!(
                "agent '{}' returned an empty response",
                agent.id
            )));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        seen: Mutex<Vec<(Vec<Message>, CompletionOptions)>>,
        reply: String,
    }

    #[async_trait]
    impl LlmGateway for Capture {
        async fn complete(
            &self,
            messages: &[Message],
            options: &CompletionOptions,
        ) -> Result<String, GatewayError> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), options.clone()));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_uses_role_and_provider_override() {
        let gateway = Arc::new(Capture {
            reply: "done".into(),
            ..Default::default()
        });
        let worker = LlmAgentWorker::new(
            gateway.clone(),
            CompletionOptions::default().with_model("base"),
        );
        let agent = Agent::new("coder", "Rust engineer").with_model_provider("fast-model");
        let task = AgentTask::new("Build X", "write the parser", ExecutionPhase::Execution);

        assert_eq!(worker.perform(&agent, &task).await.unwrap(), "done");

        let seen = gateway.seen.lock().unwrap();
        let (messages, options) = &seen[0];
        assert!(messages[0].content.contains("Rust engineer"));
        assert!(messages[1].content.contains("write the parser"));
        assert_eq!(options.model.as_deref(), Some("fast-model"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_failure() {
        let gateway = Arc::new(Capture {
            reply: "   ".into(),
            ..Default::default()
        });
        let worker = LlmAgentWorker::new(gateway, CompletionOptions::default());
        let agent = Agent::new("reviewer", "Critic").as_reflector();
        let task = AgentTask::new("g", "results", ExecutionPhase::Reflection);

        let err = worker.perform(&agent, &task).await.unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }
}
