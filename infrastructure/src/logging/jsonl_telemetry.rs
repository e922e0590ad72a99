//! JSONL file writer for run telemetry.
//!
//! Each event is serialized as a single JSON line with a `type` field and
//! `timestamp`, appended to the file via a buffered writer.

use crew_application::{AttemptReport, BatchSummary, RunTelemetry};
use crew_domain::{MemoryEntry, Plan, PlanStep, RouteDecision, Termination, WorkResult};
use serde_json::{Value, json};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Telemetry sink that writes one JSON object per run event.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on `Drop`.
pub struct JsonlTelemetry {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTelemetry {
    /// Create the file (and parent directories), truncating an existing one.
    ///
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create telemetry directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create telemetry file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, event_type: &str, payload: Value) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("type".to_string(), Value::String(event_type.to_string()));
        record.insert("timestamp".to_string(), Value::String(timestamp));

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl RunTelemetry for JsonlTelemetry {
    fn on_run_start(&self, goal: &str, crew: &str) {
        self.write("run_start", json!({ "goal": goal, "crew": crew }));
    }

    fn on_decision_attempt(&self, report: &AttemptReport) {
        self.write(
            "decision_attempt",
            json!({
                "kind": report.kind.as_str(),
                "attempt": report.attempt,
                "max_attempts": report.max_attempts,
                "error": report.error,
            }),
        );
    }

    fn on_route_decided(&self, decision: &RouteDecision) {
        self.write(
            "route_decided",
            json!({
                "strategy": decision.strategy.as_str(),
                "rationale": decision.rationale,
            }),
        );
    }

    fn on_plan_generated(&self, plan: &Plan, fallback: bool) {
        self.write(
            "plan_generated",
            json!({
                "plan_id": plan.id,
                "steps": plan.steps.len(),
                "fallback": fallback,
                "rationale": plan.rationale,
            }),
        );
    }

    fn on_step_start(&self, step: &PlanStep, wave: usize) {
        self.write(
            "step_start",
            json!({ "step_id": step.id, "agent_id": step.agent_id, "wave": wave }),
        );
    }

    fn on_step_complete(&self, step: &PlanStep, wave: usize) {
        self.write(
            "step_complete",
            json!({
                "step_id": step.id,
                "status": step.status.as_str(),
                "wave": wave,
                "error": step.error,
            }),
        );
    }

    fn on_wave_complete(&self, wave: usize, steps_in_wave: usize) {
        self.write("wave_complete", json!({ "wave": wave, "steps": steps_in_wave }));
    }

    fn on_batch_start(&self, size: usize) {
        self.write("batch_start", json!({ "size": size }));
    }

    fn on_unit_complete(&self, result: &WorkResult) {
        self.write(
            "unit_complete",
            json!({
                "agent_id": result.agent_id(),
                "phase": result.label.phase.as_str(),
                "correlation_id": result.correlation_id(),
                "success": result.success,
                "error": result.error,
            }),
        );
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.write(
            "batch_complete",
            json!({
                "succeeded": summary.succeeded_count(),
                "failed": summary.failed_count(),
                "elapsed_ms": summary.elapsed.as_millis() as u64,
                "swallowed_hook_errors": summary.swallowed_hook_errors,
            }),
        );
    }

    fn on_terminated(&self, termination: &Termination) {
        self.write(
            "terminated",
            json!({
                "reason": termination.reason.as_str(),
                "detail": termination.detail,
            }),
        );
    }

    fn on_memory_appended(&self, entry: &MemoryEntry) {
        self.write("memory_appended", json!({ "entry": entry }));
    }

    fn on_run_complete(&self, note: &str) {
        self.write("run_complete", json!({ "note": note }));
    }
}

impl Drop for JsonlTelemetry {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_domain::{Observation, PlanStep, RouteStrategy, Thought};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_typed_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.telemetry.jsonl");
        let sink = JsonlTelemetry::new(&path).unwrap();

        sink.on_run_start("Build X", "core");
        sink.on_route_decided(&RouteDecision::new(RouteStrategy::DirectExecution, "simple"));
        sink.on_step_start(&PlanStep::new("s1", "do it").with_agent("coder"), 0);
        sink.on_run_complete("done");
        drop(sink);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.get("timestamp").is_some()));
        assert_eq!(lines[0]["type"], "run_start");
        assert_eq!(lines[0]["goal"], "Build X");
        assert_eq!(lines[1]["strategy"], "direct_execution");
        assert_eq!(lines[2]["step_id"], "s1");
        assert_eq!(lines[2]["agent_id"], "coder");
        assert_eq!(lines[3]["note"], "done");
    }

    #[test]
    fn test_memory_entries_are_nested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.jsonl");
        let sink = JsonlTelemetry::new(&path).unwrap();

        sink.on_memory_appended(&MemoryEntry::new(Thought::new("planning")));
        sink.on_memory_appended(&MemoryEntry::new(
            Observation::new("s1 done").failed("boom"),
        ));
        drop(sink);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "memory_appended");
        assert_eq!(lines[0]["entry"]["kind"], "thought");
        assert_eq!(lines[1]["entry"]["error"], "boom");
    }
}
