//! Console output formatter for run results

use colored::Colorize;
use crew_application::RunOutput;
use crew_domain::util::truncate_chars;
use crew_domain::{Crew, PlanStep, StepStatus, WorkResult};

const PREVIEW_CHARS: usize = 160;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Strategy, plan status and the run note
    pub fn format_summary(output: &RunOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Agent Crew Run"));
        out.push('\n');
        out.push_str(&Self::overview(output));

        if let Some(plan) = &output.plan {
            out.push_str(&Self::section_header(&format!(
                "Plan: {} steps in {} wave(s)",
                plan.steps.len(),
                output.waves
            )));
            for step in &plan.steps {
                out.push_str(&Self::step_line(step));
            }
        }

        if !output.results.is_empty() {
            out.push_str(&Self::section_header("Direct execution"));
            for result in &output.results {
                out.push_str(&Self::result_line(result, Some(PREVIEW_CHARS)));
            }
        }

        if !output.reflection.is_empty() {
            out.push_str(&Self::section_header("Reflection"));
            for result in &output.reflection {
                out.push_str(&Self::result_line(result, Some(PREVIEW_CHARS)));
            }
        }

        out.push_str(&Self::closing(output));
        out
    }

    /// Summary plus untruncated outputs and the memory ledger
    pub fn format_full(output: &RunOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Agent Crew Run"));
        out.push('\n');
        out.push_str(&Self::overview(output));

        if let Some(plan) = &output.plan {
            out.push_str(&Self::section_header(&format!(
                "Plan: {} steps in {} wave(s)",
                plan.steps.len(),
                output.waves
            )));
            if let Some(rationale) = &plan.rationale {
                out.push_str(&format!("{}\n", rationale.dimmed()));
            }
            for step in &plan.steps {
                out.push_str(&Self::step_line(step));
                if let Some(text) = step.output.as_deref().or(step.error.as_deref()) {
                    out.push_str(&Self::indent(text, "      "));
                    out.push('\n');
                }
            }
        }

        for (title, results) in [
            ("Direct execution", &output.results),
            ("Reflection", &output.reflection),
        ] {
            if results.is_empty() {
                continue;
            }
            out.push_str(&Self::section_header(title));
            for result in results {
                out.push_str(&Self::result_line(result, None));
            }
        }

        if !output.memory.is_empty() {
            out.push_str(&Self::section_header("Memory"));
            for entry in &output.memory {
                out.push_str(&format!(
                    "  {} {}\n",
                    entry.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
                    entry.render()
                ));
            }
        }

        out.push_str(&Self::closing(output));
        out
    }

    /// Format as JSON
    pub fn format_json(output: &RunOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    /// Configured crews, marking the one a run would use
    pub fn format_crews(crews: &[Crew], active: Option<&str>) -> String {
        if crews.is_empty() {
            return format!("{}\n", "No crews configured.".yellow());
        }

        let mut out = String::new();
        for crew in crews {
            let marker = if Some(crew.id.as_str()) == active {
                "*".green().bold()
            } else {
                " ".normal()
            };
            out.push_str(&format!(
                "{} {} {}\n",
                marker,
                crew.id.bold(),
                crew.name.as_deref().unwrap_or_default().dimmed()
            ));
            for agent in &crew.agents {
                let mut tags = Vec::new();
                if agent.reflection_role {
                    tags.push("reflection");
                }
                if !agent.enabled {
                    tags.push("disabled");
                }
                let tags = if tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", tags.join(", "))
                };
                out.push_str(&format!("    - {}: {}{}\n", agent.id, agent.role, tags.dimmed()));
            }
        }
        out
    }

    fn overview(output: &RunOutput) -> String {
        let mut out = format!("{} {}\n", "Crew:".cyan().bold(), output.crew_id);
        match &output.decision {
            Some(decision) => out.push_str(&format!(
                "{} {} ({})\n",
                "Strategy:".cyan().bold(),
                decision.strategy,
                truncate_chars(&decision.rationale, PREVIEW_CHARS)
            )),
            None => out.push_str(&format!("{} {}\n", "Strategy:".cyan().bold(), "none".dimmed())),
        }
        out
    }

    fn closing(output: &RunOutput) -> String {
        let mut out = format!("\n{} {}\n", "Result:".cyan().bold(), output.note);
        if output.terminated_early {
            out.push_str(&format!(
                "{} {}\n",
                "Terminated early:".red().bold(),
                output
                    .termination_reason
                    .map(|r| r.as_str())
                    .unwrap_or("unknown")
            ));
        }
        if output.swallowed_hook_errors > 0 {
            out.push_str(&format!(
                "{} {} hook failure(s) ignored\n",
                "Warning:".yellow().bold(),
                output.swallowed_hook_errors
            ));
        }
        out.push_str(&Self::footer());
        out
    }

    fn step_line(step: &PlanStep) -> String {
        let mark = match step.status {
            StepStatus::Done => "v".green(),
            StepStatus::Error => "x".red(),
            StepStatus::Running => "~".yellow(),
            StepStatus::Pending => "-".dimmed(),
        };
        let agent = step
            .agent_id
            .as_ref()
            .map(|a| a.as_str())
            .unwrap_or("unassigned");
        let mut line = format!(
            "  {} {} [{}] {}",
            mark,
            step.id.as_str().bold(),
            agent,
            truncate_chars(&step.description, PREVIEW_CHARS)
        );
        if step.status == StepStatus::Error
            && let Some(error) = &step.error
        {
            line.push_str(&format!(": {}", error.red()));
        }
        line.push('\n');
        line
    }

    fn result_line(result: &WorkResult, preview: Option<usize>) -> String {
        let (mark, body) = if result.success {
            ("v".green(), result.output.as_deref().unwrap_or(""))
        } else {
            ("x".red(), result.error.as_deref().unwrap_or("Unknown"))
        };
        let body = match preview {
            Some(max) => truncate_chars(body, max),
            None => body.to_string(),
        };
        format!(
            "  {} {}\n{}\n",
            mark,
            result.agent_id().as_str().yellow().bold(),
            Self::indent(&body, "      ")
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_domain::{
        Agent, ExecutionPhase, Plan, RouteDecision, RouteStrategy, TerminationReason,
        WorkLabel,
    };

    fn planned_output() -> RunOutput {
        let mut plan = Plan::new(
            Some("split work".into()),
            vec![
                PlanStep::new("s1", "write parser").with_agent("coder"),
                PlanStep::new("s2", "document parser").with_agent("writer"),
            ],
        );
        plan.steps[0].mark_running().unwrap();
        plan.steps[0].mark_done(Some("parser written".into())).unwrap();
        plan.steps[1].mark_running().unwrap();
        plan.steps[1].mark_error("writer is offline").unwrap();

        RunOutput {
            crew_id: "core".into(),
            strategy: Some(RouteStrategy::PlanThenParallel),
            decision: Some(RouteDecision::new(RouteStrategy::PlanThenParallel, "needs steps")),
            plan_generated: true,
            plan: Some(plan),
            parallel_batches: 1,
            waves: 1,
            note: "Executed 2-step plan in 1 wave(s): 1 done, 1 error.".into(),
            ..RunOutput::default()
        }
    }

    #[test]
    fn test_summary_lists_steps_and_note() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_summary(&planned_output());

        assert!(text.contains("Crew: core"));
        assert!(text.contains("Strategy: plan_then_parallel (needs steps)"));
        assert!(text.contains("v s1 [coder] write parser"));
        assert!(text.contains("x s2 [writer] document parser: writer is offline"));
        assert!(text.contains("Result: Executed 2-step plan"));
        assert!(!text.contains("Terminated early"));
    }

    #[test]
    fn test_full_includes_outputs_and_termination() {
        colored::control::set_override(false);
        let mut output = planned_output();
        output.terminated_early = true;
        output.termination_reason = Some(TerminationReason::MaxAgentLoops);

        let text = ConsoleFormatter::format_full(&output);

        assert!(text.contains("split work"));
        assert!(text.contains("      parser written"));
        assert!(text.contains("Terminated early: max_agent_loops"));
    }

    #[test]
    fn test_direct_results_are_previewed() {
        colored::control::set_override(false);
        let mut output = RunOutput {
            crew_id: "core".into(),
            strategy: Some(RouteStrategy::DirectExecution),
            ..RunOutput::default()
        };
        let label = WorkLabel::new("coder", ExecutionPhase::Execution, "direct-1-coder");
        let now = chrono::Utc::now();
        output.results.push(WorkResult::succeeded(
            label,
            Some("x".repeat(400)),
            now,
            now,
        ));

        let text = ConsoleFormatter::format_summary(&output);
        assert!(text.contains("Direct execution"));
        assert!(text.contains("..."));
        assert!(!text.contains(&"x".repeat(400)));
    }

    #[test]
    fn test_json_round_trips_key_fields() {
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&planned_output())).unwrap();
        assert_eq!(json["strategy"], "plan_then_parallel");
        assert_eq!(json["plan"]["steps"][1]["status"], "error");
    }

    #[test]
    fn test_crews_marks_active() {
        colored::control::set_override(false);
        let crews = vec![
            Crew::new("core")
                .with_agent(Agent::new("coder", "Rust engineer"))
                .with_agent(Agent::new("critic", "Reviewer").as_reflector()),
            Crew::new("docs"),
        ];
        let text = ConsoleFormatter::format_crews(&crews, Some("core"));
        assert!(text.contains("* core"));
        assert!(text.contains("- critic: Reviewer [reflection]"));
        assert!(text.contains("  docs"));
    }
}
