//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};

/// How the run result is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    /// Strategy, note and per-step status
    #[default]
    Summary,
    /// Summary plus step outputs and the memory ledger
    Full,
    Json,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FileOutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Show the live progress display
    pub show_progress: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_deserialize() {
        let toml_str = r#"
[output]
format = "full"
color = false
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, Some(FileOutputFormat::Full));
        assert!(!config.output.color);
        assert!(config.output.show_progress);
    }
}
