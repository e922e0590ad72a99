//! Live run progress
//!
//! Both reporters implement the `RunTelemetry` port.

pub mod reporter;
