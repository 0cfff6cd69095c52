//! # Stagehand Configuration
//!
//! Threading options for a scheduler run, read from a JSON, YAML or TOML file
//! (format picked by extension). Missing keys fall back to defaults, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [threading]
//! parallel_initialization = true
//! worker_threads = 4
//! ```
pub mod error;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::queue::{default_worker_count, MAX_WORKER_THREADS};
use error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    fn label(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "YAML",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "TOML",
        }
    }
}

/// How component initialization uses threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadingConfig {
    /// Initialize worker-eligible components on a thread pool
    pub parallel_initialization: bool,
    /// Pool size override; `None` sizes the pool from the hardware
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

impl ThreadingConfig {
    /// Effective pool size, always within `1..=MAX_WORKER_THREADS`.
    pub fn worker_count(&self) -> usize {
        match self.worker_threads {
            Some(threads) => threads.clamp(1, MAX_WORKER_THREADS),
            None => default_worker_count(),
        }
    }
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            parallel_initialization: true,
            worker_threads: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub threading: ThreadingConfig,
}

impl SchedulerConfig {
    /// Loads a config file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&data, format)?;
        log::debug!("Loaded scheduler config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let parse_err = |message: String| ConfigError::Parse {
            format: format.label(),
            message,
        };
        // Empty JSON and YAML documents are not empty maps
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| parse_err(e.to_string())),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| parse_err(e.to_string())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| parse_err(e.to_string())),
        }
    }

    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let serialize_err = |message: String| ConfigError::Serialize {
            format: format.label(),
            message,
        };
        match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| serialize_err(e.to_string()))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| serialize_err(e.to_string())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| serialize_err(e.to_string()))
            }
        }
    }
}
