//! Configuration loading for the pipeline.
//!
//! This module handles:
//! - Locating pipeline.json (CLI > env > XDG > /etc > defaults)
//! - Shape checking via serde
//! - Semantic validation
//! - A content hash for provenance in command output

pub use rota_config::validate::ValidationError;
pub use rota_config::{
    AnomalyConfig, ConfigSource, ForecastConfig, PipelineConfig, RecommendConfig,
    SchedulingRules, CONFIG_SCHEMA_VERSION,
};

use rota_config::{resolve_config, validate_pipeline};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for rota_common::Error {
    fn from(err: ConfigError) -> Self {
        rota_common::Error::Config(err.to_string())
    }
}

/// Loaded configuration with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config: PipelineConfig,
    /// File the configuration was read from (None for built-in defaults).
    pub path: Option<PathBuf>,
    #[serde(serialize_with = "serialize_source")]
    pub source: ConfigSource,
    /// SHA-256 of the file content (None for built-in defaults).
    pub hash: Option<String>,
}

fn serialize_source<S: serde::Serializer>(source: &ConfigSource, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(source)
}

/// Load and validate the pipeline configuration.
///
/// An explicit CLI path must exist; environment and directory candidates
/// fall through when missing.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }
    let resolved = resolve_config(cli_path);
    let Some(path) = resolved.path else {
        return Ok(ResolvedConfig {
            config: PipelineConfig::default(),
            path: None,
            source: resolved.source,
            hash: None,
        });
    };

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        source: e,
    })?;
    let config: PipelineConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
    validate_pipeline(&config)?;

    Ok(ResolvedConfig {
        config,
        path: Some(path),
        source: resolved.source,
        hash: Some(compute_hash(&content)),
    })
}

fn compute_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
