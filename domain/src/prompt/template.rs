//! Prompt templates for routing, planning, and agent work

use crate::agent::entities::Agent;
use crate::decision::route::RouteStrategy;

/// Templates for generating prompts at each stage
pub struct CrewPromptTemplate;

impl CrewPromptTemplate {
    /// System prompt for the route decision
    pub fn route_system() -> &'static str {
        r#"You are the coordinator of a crew of specialized agents.
Your task is to decide how the crew should approach a goal.
Answer with a single JSON object and nothing else."#
    }

    /// User prompt for the route decision
    pub fn route_prompt(goal: &str, roster: &str, notes: Option<&str>) -> String {
        let strategies = RouteStrategy::ALL
            .iter()
            .map(|s| format!("\"{}\"", s.as_str()))
            .collect::<Vec<_>>()
            .join(" or ");

        let mut prompt = format!(
            r#"Goal:
{}

Available agents:
{}
"#,
            goal, roster
        );

        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            prompt.push_str(&format!("\nRecent notes:\n{}\n", notes));
        }

        prompt.push_str(&format!(
            r#"
Choose "plan_then_parallel" when the goal needs several dependent steps.
Choose "direct_execution" when every agent can work on the goal as is.

Respond with exactly this object:
{{"strategy": {}, "rationale": "<one or two sentences>"}}"#,
            strategies
        ));

        prompt
    }

    /// System prompt for the planner
    pub fn planner_system() -> &'static str {
        r#"You are a planner that decomposes goals into small, dependency-ordered steps.
Assign each step to the agent best suited for it.
Answer with a single JSON object and nothing else."#
    }

    /// User prompt for the planner
    pub fn planner_prompt(
        goal: &str,
        roster: &str,
        notes: Option<&str>,
        max_steps: usize,
    ) -> String {
        let mut prompt = format!(
            r#"Goal:
{}

Available agents:
{}
"#,
            goal, roster
        );

        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            prompt.push_str(&format!("\nRecent notes:\n{}\n", notes));
        }

        prompt.push_str(&format!(
            r#"
Produce a plan with at most {} steps. Steps sharing a "parallel_group" may run together.
"depends_on" lists the ids of steps that must finish first.

Respond with exactly this object:
{{
  "rationale": "<why this plan>",
  "steps": [
    {{"id": "s1", "description": "<what to do>", "agent_id": "<agent id>", "parallel_group": "<label>", "depends_on": []}}
  ]
}}"#,
            max_steps
        ));

        prompt
    }

    /// Repair instruction appended after an unusable answer
    pub fn repair_instruction(error: &str) -> String {
        format!(
            r#"Your previous answer could not be used: {}
Reply again with only the corrected JSON object. No commentary, no code fences."#,
            error
        )
    }

    /// System prompt for an agent working on a step
    pub fn agent_system(agent: &Agent) -> String {
        format!(
            r#"You are {}, a member of an agent crew.
Your role: {}
Work only on the task you are given and report the result concisely."#,
            agent.id, agent.role
        )
    }

    /// User prompt for an agent working on a step
    pub fn agent_task(goal: &str, task: &str) -> String {
        format!(
            r#"Overall goal:
{}

Your task:
{}"#,
            goal, task
        )
    }

    /// User prompt for a reviewer agent
    pub fn reflection_task(goal: &str, results: &str) -> String {
        format!(
            r#"Overall goal:
{}

Results produced by the crew:
{}

Review these results. Point out gaps or mistakes, and say whether the goal is met."#,
            goal, results
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_prompt_lists_strategies() {
        let prompt = CrewPromptTemplate::route_prompt("Build X", "- a: coder", None);
        assert!(prompt.contains("Build X"));
        assert!(prompt.contains("\"plan_then_parallel\" or \"direct_execution\""));
        assert!(!prompt.contains("Recent notes"));
    }

    #[test]
    fn test_planner_prompt_includes_notes_and_cap() {
        let prompt =
            CrewPromptTemplate::planner_prompt("Build X", "- a: coder", Some("- [thought] hi"), 5);
        assert!(prompt.contains("at most 5 steps"));
        assert!(prompt.contains("Recent notes:\n- [thought] hi"));
        assert!(prompt.contains("\"depends_on\": []"));
    }

    #[test]
    fn test_blank_notes_omitted() {
        let prompt = CrewPromptTemplate::planner_prompt("g", "r", Some("  "), 3);
        assert!(!prompt.contains("Recent notes"));
    }

    #[test]
    fn test_repair_instruction_restates_error() {
        let text = CrewPromptTemplate::repair_instruction("missing required key 'steps'");
        assert!(text.contains("missing required key 'steps'"));
        assert!(text.contains("only the corrected JSON object"));
    }

    #[test]
    fn test_agent_prompts() {
        let agent = Agent::new("writer", "Technical writer");
        assert!(CrewPromptTemplate::agent_system(&agent).contains("Technical writer"));
        assert!(CrewPromptTemplate::agent_task("g", "t").contains("Your task:\nt"));
    }
}
