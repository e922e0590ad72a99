//! Planner use case
//!
//! Asks the model for a plan, validates it through the repair loop, and
//! normalizes step ids. It never falls back on its own; that decision
//! belongs to the orchestrator.

use super::structured_output::{StructuredOutputError, StructuredOutputRequest};
use crate::ports::llm_gateway::{CompletionOptions, LlmGateway};
use crate::ports::telemetry::{AttemptReport, DecisionKind};
use crew_domain::{CrewPromptTemplate, Message, Plan, PlanDraft};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("Planner failed: {0}")]
    Structured(#[from] StructuredOutputError),
}

/// Input for the planner
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub goal: &'a str,
    /// Prompt-ready roster summary, one agent per line.
    pub roster: &'a str,
    pub notes: Option<&'a str>,
}

pub struct Planner<'a> {
    gateway: &'a dyn LlmGateway,
    options: &'a CompletionOptions,
    max_attempts: usize,
    max_steps: usize,
}

impl<'a> Planner<'a> {
    pub fn new(
        gateway: &'a dyn LlmGateway,
        options: &'a CompletionOptions,
        max_attempts: usize,
        max_steps: usize,
    ) -> Self {
        Self {
            gateway,
            options,
            max_attempts,
            max_steps: max_steps.max(1),
        }
    }

    pub async fn plan(
        &self,
        request: PlanRequest<'_>,
        on_attempt: impl FnMut(&AttemptReport),
    ) -> Result<Plan, PlannerError> {
        let messages = vec![
            Message::system(CrewPromptTemplate::planner_system()),
            Message::user(CrewPromptTemplate::planner_prompt(
                request.goal,
                request.roster,
                request.notes,
                self.max_steps,
            )),
        ];

        let draft = StructuredOutputRequest::new(
            self.gateway,
            self.options,
            DecisionKind::Plan,
            self.max_attempts,
        )
        .run(messages, PlanDraft::parse, on_attempt)
        .await?;

        let (plan, report) = draft.value.normalize(self.max_steps);

        if report.dropped_steps > 0 {
            warn!(
                dropped = report.dropped_steps,
                max_steps = self.max_steps,
                "Plan exceeded the step cap; extra steps dropped"
            );
        }
        for (original, assigned) in &report.reassigned {
            if let Some(original) = original {
                warn!(original = %original, assigned = %assigned, "Duplicate step id reassigned");
            }
        }

        info!(
            steps = plan.steps.len(),
            attempts = draft.attempts,
            "Plan generated"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::structured_output::tests::ScriptedGateway;
    use crew_domain::{StepId, StepStatus};

    fn request() -> PlanRequest<'static> {
        PlanRequest {
            goal: "Build feature X",
            roster: "- a: coder\n- b: writer",
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_plan_normalizes_duplicate_ids() {
        let gateway = ScriptedGateway::new(vec![
            r#"{"rationale": "two parts", "steps": [
                {"id": "s1", "description": "code it", "agent_id": "a"},
                {"id": "s1", "description": "document it", "agent_id": "b"}
            ]}"#,
        ]);
        let options = CompletionOptions::default();
        let plan = Planner::new(&gateway, &options, 3, 12)
            .plan(request(), |_| {})
            .await
            .unwrap();

        assert_eq!(plan.steps[0].id, StepId::new("s1"));
        assert_eq!(plan.steps[1].id, StepId::new("s2"));
        assert!(plan.steps.iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(plan.rationale.as_deref(), Some("two parts"));
    }

    #[tokio::test]
    async fn test_plan_repairs_then_succeeds() {
        let gateway = ScriptedGateway::new(vec![
            r#"{"rationale": "r", "steps": [{"description": "x", "depends_on": "s1"}]}"#,
            r#"{"rationale": "r", "steps": [{"description": "x"}]}"#,
        ]);
        let options = CompletionOptions::default();
        let mut attempts = Vec::new();

        let plan = Planner::new(&gateway, &options, 3, 12)
            .plan(request(), |r| attempts.push(r.clone()))
            .await
            .unwrap();

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].kind, DecisionKind::Plan);
        assert!(attempts[0].error.as_deref().unwrap().contains("depends_on"));
        assert!(attempts[1].error.is_none());
    }

    #[tokio::test]
    async fn test_plan_fails_after_ceiling() {
        let gateway = ScriptedGateway::new(vec!["no plan today"]);
        let options = CompletionOptions::default();
        let err = Planner::new(&gateway, &options, 2, 12)
            .plan(request(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(gateway.call_count(), 2);
        assert!(err.to_string().contains("after 2 attempt(s)"));
    }

    #[tokio::test]
    async fn test_plan_is_capped() {
        let gateway = ScriptedGateway::new(vec![
            r#"{"rationale": "r", "steps": [{"description": "a"}, {"description": "b"}, {"description": "c"}]}"#,
        ]);
        let options = CompletionOptions::default();
        let plan = Planner::new(&gateway, &options, 1, 2)
            .plan(request(), |_| {})
            .await
            .unwrap();
        assert_eq!(plan.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_prompt_carries_goal_roster_and_notes() {
        let gateway =
            ScriptedGateway::new(vec![r#"{"rationale": "r", "steps": [{"description": "a"}]}"#]);
        let options = CompletionOptions::default();
        let req = PlanRequest {
            notes: Some("- [thought] earlier"),
            ..request()
        };
        Planner::new(&gateway, &options, 1, 5)
            .plan(req, |_| {})
            .await
            .unwrap();

        let calls = gateway.calls.lock().unwrap();
        let prompt = &calls[0][1].content;
        assert!(prompt.contains("Build feature X"));
        assert!(prompt.contains("- b: writer"));
        assert!(prompt.contains("- [thought] earlier"));
        assert!(prompt.contains("at most 5 steps"));
    }
}
