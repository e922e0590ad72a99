//! Progress reporting for crew runs

use colored::Colorize;
use crew_application::{AttemptReport, BatchSummary, RunTelemetry};
use crew_domain::{
    ExecutionPhase, Plan, PlanStep, RouteDecision, StepStatus, Termination, WorkResult,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reports progress during a run with progress bars
///
/// Plan steps drive one bar for the whole plan. Batches outside a running
/// plan (direct execution and reflection) get a bar of their own.
pub struct ProgressReporter {
    multi: MultiProgress,
    plan_bar: Mutex<Option<ProgressBar>>,
    batch_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            plan_bar: Mutex::new(None),
            batch_bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn new_bar(&self, len: usize, prefix: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(prefix.to_string());
        pb.set_message("Starting...");
        pb
    }

    fn plan_active(&self) -> bool {
        self.plan_bar
            .lock()
            .is_ok_and(|bar| bar.as_ref().is_some_and(|pb| !pb.is_finished()))
    }

    fn with_plan_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bar) = self.plan_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            f(pb);
        }
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn phase_label(phase: ExecutionPhase) -> &'static str {
    match phase {
        ExecutionPhase::Planning => "Planning",
        ExecutionPhase::Execution => "Execution",
        ExecutionPhase::Reflection => "Reflection",
    }
}

fn status_mark(success: bool) -> colored::ColoredString {
    if success { "v".green() } else { "x".red() }
}

impl RunTelemetry for ProgressReporter {
    fn on_run_start(&self, goal: &str, crew: &str) {
        self.println(format!("{} {} {}", "->".cyan(), "Crew".bold(), crew));
        self.println(format!("{} {} {}", "->".cyan(), "Goal".bold(), goal));
    }

    fn on_decision_attempt(&self, report: &AttemptReport) {
        if let Some(error) = &report.error {
            self.println(format!(
                "  {} {} attempt {}/{} rejected: {}",
                "!".yellow(),
                report.kind.as_str(),
                report.attempt,
                report.max_attempts,
                error
            ));
        }
    }

    fn on_route_decided(&self, decision: &RouteDecision) {
        self.println(format!(
            "{} {} {}",
            "->".cyan(),
            "Route".bold(),
            decision.strategy.as_str().cyan()
        ));
    }

    fn on_plan_generated(&self, plan: &Plan, fallback: bool) {
        let prefix = if fallback { "Plan (fallback)" } else { "Plan" };
        let pb = self.new_bar(plan.steps.len(), prefix);
        if let Ok(mut bar) = self.plan_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_step_start(&self, step: &PlanStep, wave: usize) {
        self.with_plan_bar(|pb| pb.set_message(format!("wave {}: {}", wave, step.id)));
    }

    fn on_step_complete(&self, step: &PlanStep, _wave: usize) {
        let success = step.status == StepStatus::Done;
        self.with_plan_bar(|pb| {
            pb.set_message(format!("{} {}", status_mark(success), step.id));
            pb.inc(1);
            if pb.length().is_some_and(|len| pb.position() >= len) {
                pb.finish_with_message(format!("{}", "complete!".green()));
            }
        });
    }

    fn on_wave_complete(&self, wave: usize, steps_in_wave: usize) {
        self.with_plan_bar(|pb| {
            pb.set_message(format!("wave {} complete ({} steps)", wave, steps_in_wave))
        });
    }

    fn on_batch_start(&self, size: usize) {
        if self.plan_active() {
            return;
        }
        let pb = self.new_bar(size, "Batch");
        if let Ok(mut bar) = self.batch_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_unit_complete(&self, result: &WorkResult) {
        if let Ok(bar) = self.batch_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_prefix(phase_label(result.label.phase));
            pb.set_message(format!("{} {}", status_mark(result.success), result.agent_id()));
            pb.inc(1);
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        if let Ok(mut bar) = self.batch_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!(
                "{} ({} failed)",
                "complete!".green(),
                summary.failed_count()
            ));
        }
    }

    fn on_terminated(&self, termination: &Termination) {
        self.println(format!(
            "{} {} {}: {}",
            "!!".red(),
            "Terminated".red().bold(),
            termination.reason.as_str(),
            termination.detail
        ));
    }

    fn on_run_complete(&self, _note: &str) {
        if let Ok(mut bar) = self.plan_bar.lock()
            && let Some(pb) = bar.take()
            && !pb.is_finished()
        {
            pb.abandon_with_message(format!("{}", "stopped".yellow()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
///
/// Plan steps are printed as they settle; units of batches outside a plan
/// are printed individually.
#[derive(Default)]
pub struct SimpleProgress {
    in_plan: AtomicBool,
}

impl SimpleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunTelemetry for SimpleProgress {
    fn on_route_decided(&self, decision: &RouteDecision) {
        println!("{} {} {}", "->".cyan(), "Route".bold(), decision.strategy);
    }

    fn on_plan_generated(&self, plan: &Plan, fallback: bool) {
        self.in_plan.store(true, Ordering::Relaxed);
        println!(
            "{} {} ({} steps{})",
            "->".cyan(),
            "Plan".bold(),
            plan.steps.len(),
            if fallback { ", fallback" } else { "" }
        );
    }

    fn on_step_complete(&self, step: &PlanStep, wave: usize) {
        match step.status {
            StepStatus::Done => println!("  {} [wave {}] {}", "v".green(), wave, step.id),
            _ => println!("  {} [wave {}] {} (failed)", "x".red(), wave, step.id),
        }
    }

    fn on_unit_complete(&self, result: &WorkResult) {
        if self.in_plan.load(Ordering::Relaxed)
            && result.label.phase == ExecutionPhase::Execution
        {
            return;
        }
        println!(
            "  {} {} {}",
            status_mark(result.success),
            phase_label(result.label.phase).dimmed(),
            result.agent_id()
        );
    }

    fn on_terminated(&self, termination: &Termination) {
        println!(
            "{} terminated ({}): {}",
            "!!".red(),
            termination.reason.as_str(),
            termination.detail
        );
    }
}
