//! Configuration file loading for agent-crew
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGENT_CREW_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./crew.toml` or `./.crew.toml`
//! 4. Global: `$XDG_CONFIG_HOME/agent-crew/config.toml`
//! 5. Default values

mod file_config;
mod loader;
mod store;

pub use file_config::{
    ConfigValidationError, FileConfig, FileExecutionConfig, FileLlmConfig, FileLoggingConfig,
    FileOutputConfig, FileOutputFormat,
};
pub use loader::ConfigLoader;
pub use store::FileConfigStore;
