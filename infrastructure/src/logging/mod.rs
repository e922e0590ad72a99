//! Logging infrastructure: structured run telemetry.
//!
//! Provides [`JsonlTelemetry`], a JSONL file writer that implements
//! the [`RunTelemetry`](crew_application::RunTelemetry) port.

mod jsonl_telemetry;

pub use jsonl_telemetry::JsonlTelemetry;
