//! Error types for Rota.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for schedule administrators
//!
//! # Structured Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 30,
//!   "category": "model",
//!   "message": "forecast model has not been trained",
//!   "recoverable": true,
//!   "suggested_action": "train_model"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for Rota operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Pipeline configuration errors.
    Config,
    /// Scheduling store query errors.
    DataSource,
    /// Forecast model lifecycle errors.
    Model,
    /// Caller-supplied input that fails validation.
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::DataSource => write!(f, "data_source"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for callers to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation with backoff.
    Retry,
    /// Validate and fix the configuration.
    FixConfig,
    /// Train the forecast model before predicting.
    TrainModel,
    /// Correct the submitted input.
    FixInput,
    /// Wait for another writer to finish.
    Wait,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::FixConfig => write!(f, "fix_config"),
            SuggestedAction::TrainModel => write!(f, "train_model"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::Wait => write!(f, "wait"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for Rota.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Data source errors (20-29)
    #[error("scheduling store query failed: {0}")]
    DataSource(String),

    // Model errors (30-39)
    #[error("forecast model has not been trained")]
    ModelNotTrained,

    #[error("forecast features {expected:?} do not match {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("model artifact is locked by another writer: {path}")]
    ArtifactLocked { path: String },

    #[error("model artifact corrupted: {0}")]
    ArtifactCorrupted(String),

    // Input validation errors (40-49)
    #[error("training dataset is missing target column '{column}'")]
    MissingTargetColumn { column: String },

    #[error("invalid training dataset: {0}")]
    InvalidDataset(String),

    #[error("forecast horizon must be at least one day")]
    InvalidHorizon,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data source errors
    /// - 30-39: Model errors
    /// - 40-49: Input validation errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::DataSource(_) => 20,
            Error::ModelNotTrained => 30,
            Error::FeatureMismatch { .. } => 31,
            Error::ArtifactLocked { .. } => 32,
            Error::ArtifactCorrupted(_) => 33,
            Error::MissingTargetColumn { .. } => 40,
            Error::InvalidDataset(_) => 41,
            Error::InvalidHorizon => 42,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,

            Error::DataSource(_) => ErrorCategory::DataSource,

            Error::ModelNotTrained
            | Error::FeatureMismatch { .. }
            | Error::ArtifactLocked { .. }
            | Error::ArtifactCorrupted(_) => ErrorCategory::Model,

            Error::MissingTargetColumn { .. }
            | Error::InvalidDataset(_)
            | Error::InvalidHorizon => ErrorCategory::Input,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Store queries are read-only and idempotent, so data source failures
    /// are always safe to retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,

            Error::DataSource(_) => true,

            Error::ModelNotTrained => true,
            Error::FeatureMismatch { .. } => true, // retrain with forecast features
            Error::ArtifactLocked { .. } => true,
            Error::ArtifactCorrupted(_) => true,

            Error::MissingTargetColumn { .. } => false,
            Error::InvalidDataset(_) => false,
            Error::InvalidHorizon => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::FixConfig,

            Error::DataSource(_) => SuggestedAction::Retry,

            Error::ModelNotTrained => SuggestedAction::TrainModel,
            Error::FeatureMismatch { .. } => SuggestedAction::TrainModel,
            Error::ArtifactLocked { .. } => SuggestedAction::Wait,
            Error::ArtifactCorrupted(_) => SuggestedAction::TrainModel,

            Error::MissingTargetColumn { .. }
            | Error::InvalidDataset(_)
            | Error::InvalidHorizon => SuggestedAction::FixInput,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'rota config validate' to check pipeline.json, or remove it to use defaults."
            }
            Error::DataSource(_) => {
                "The scheduling store did not answer. Retry with backoff; queries are read-only."
            }
            Error::ModelNotTrained => {
                "Train the forecast model with 'rota train --dataset <file>' before forecasting."
            }
            Error::FeatureMismatch { .. } => {
                "Training tables and stored models must carry exactly the forecast feature \
                 columns. Retrain with them."
            }
            Error::ArtifactLocked { .. } => {
                "Another training run is writing the model. Wait for it to finish, or remove \
                 a stale .lock file."
            }
            Error::ArtifactCorrupted(_) => {
                "The model file failed its checksum. Retrain to overwrite it."
            }
            Error::MissingTargetColumn { .. } => {
                "Add the target column to the dataset, or set forecast.target_column in \
                 pipeline.json."
            }
            Error::InvalidDataset(_) => {
                "Every dataset row must have one numeric value per column and at least one \
                 row is required."
            }
            Error::InvalidHorizon => "Request a forecast horizon of one or more days.",
            Error::Io(_) => "Check disk space, permissions, and that the model directory exists.",
            Error::Json(_) => "Invalid JSON. Check the file syntax and field names.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::DataSource(_) => "Scheduling Store Unavailable",
            Error::ModelNotTrained => "Model Not Trained",
            Error::FeatureMismatch { .. } => "Model Feature Mismatch",
            Error::ArtifactLocked { .. } => "Model Artifact Locked",
            Error::ArtifactCorrupted(_) => "Model Artifact Corrupted",
            Error::MissingTargetColumn { .. } => "Missing Target Column",
            Error::InvalidDataset(_) => "Invalid Training Dataset",
            Error::InvalidHorizon => "Invalid Forecast Horizon",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for callers.
    pub suggested_action: SuggestedAction,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingTargetColumn { column } => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::ArtifactLocked { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::FeatureMismatch { expected, actual } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::DataSource("down".into()).code(), 20);
        assert_eq!(Error::ModelNotTrained.code(), 30);
        assert_eq!(
            Error::MissingTargetColumn {
                column: "target".into()
            }
            .code(),
            40
        );
        assert_eq!(Error::InvalidHorizon.category(), ErrorCategory::Input);
    }

    #[test]
    fn data_source_failures_are_retryable() {
        let err = Error::DataSource("timeout".into());
        assert!(err.is_recoverable());
        assert_eq!(err.suggested_action(), SuggestedAction::Retry);
        assert_eq!(err.category(), ErrorCategory::DataSource);
    }

    #[test]
    fn missing_target_is_fatal() {
        let err = Error::MissingTargetColumn {
            column: "target".into(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.suggested_action(), SuggestedAction::FixInput);
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::ArtifactLocked {
            path: "models/m.json".into(),
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 32);
        assert_eq!(structured.category, ErrorCategory::Model);
        assert_eq!(structured.context["path"], "models/m.json");

        let json = structured.to_json();
        assert!(json.contains("\"suggested_action\":\"wait\""));
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::DataSource.to_string(), "data_source");
        assert_eq!(SuggestedAction::TrainModel.to_string(), "train_model");
    }
}
