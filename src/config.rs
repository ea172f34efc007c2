use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Configuration for the sshd-lens CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input source configuration
    pub input: InputConfig,
    /// Output configuration
    pub output: OutputConfig,
    /// Report shaping
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the sshd log file to analyze
    pub file_path: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path (stdout if unset or format is "console")
    pub file_path: Option<PathBuf>,
}

/// Report shaping options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sort anomalies by IP before writing
    pub sort_anomalies: bool,
    /// Include unrecognized sshd lines in the report
    pub include_unparsed: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            sort_anomalies: true,
            include_unparsed: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: InputConfig {
                file_path: Some(PathBuf::from("/var/log/auth.log")),
            },
            output: OutputConfig {
                format: "console".to_string(),
                file_path: None,
            },
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
