//! Infrastructure layer for agent-crew
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod llm;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileConfigStore, FileExecutionConfig,
    FileLlmConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat,
};
#[cfg(feature = "http-llm")]
pub use llm::OpenAiCompatibleGateway;
pub use llm::{ScriptedLlmGateway, build_gateway};
pub use logging::JsonlTelemetry;
