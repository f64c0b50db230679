//! Pipeline configuration loaded from YAML or JSON.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::{NormalizeOptions, DEFAULT_WRAPPER_CLASS};
use crate::services::orchestrator::OrchestratorOptions;

/// Default number of targets dispatched per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config format '{0}' (expected yaml, yml or json)")]
    UnsupportedFormat(String),
}

/// Serializable pipeline settings. Every field has a default, so a config
/// file only needs to mention what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker pool size; `None` means one worker per available CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Targets dispatched per chunk; also bounds the result queue.
    pub chunk_size: usize,
    /// Emit `identifier_scope` on every record.
    pub retain_scope: bool,
    /// Synthetic class name wrapped around bare Java methods.
    pub wrapper_class: String,
    /// Optional SQLite file recording run history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs_db: Option<String>,
    /// Tracing level for diagnostics (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retain_scope: true,
            wrapper_class: DEFAULT_WRAPPER_CLASS.to_string(),
            runs_db: None,
            log_level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&body)?),
            "json" => Ok(serde_json::from_str(&body)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Worker count, falling back to available parallelism.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            retain_scope: self.retain_scope,
            wrapper_class: self.wrapper_class.clone(),
        }
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            workers: self.effective_workers(),
            chunk_size: self.chunk_size.max(1),
            normalize: self.normalize_options(),
        }
    }
}
