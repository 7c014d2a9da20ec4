//! TOML configuration file format.

use super::PhotoCamConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration loading errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("widget id must not be empty")]
    EmptyId,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Widget identifier, used as request source and container id.
    #[serde(default = "default_id")]
    pub id: String,
    /// Widget options.
    #[serde(default)]
    pub photocam: PhotoCamConfig,
    /// Settings for the demonstration binary.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Runtime options of the `photocam` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of photos to capture before exiting.
    pub captures: u32,
    /// Delay between captures in milliseconds.
    pub capture_interval_ms: u64,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
    /// Endpoint that receives captured photos over HTTP.
    pub endpoint: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            captures: 3,
            capture_interval_ms: 1000,
            metrics_port: 0,
            endpoint: None,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            photocam: PhotoCamConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

fn default_id() -> String {
    "photoCam".to_string()
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the fields that normalization cannot repair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyId);
        }
        Ok(())
    }
}
