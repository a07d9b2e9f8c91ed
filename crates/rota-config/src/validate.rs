//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::pipeline::{AnomalyConfig, ForecastConfig, PipelineConfig, RecommendConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn check_unit_interval(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1], got {}", value)));
    }
    Ok(())
}

fn check_nonzero(field: &str, value: usize) -> ValidationResult<()> {
    if value == 0 {
        return Err(invalid(field, "Must be at least 1".to_string()));
    }
    Ok(())
}

/// Validate a pipeline configuration semantically.
pub fn validate_pipeline(config: &PipelineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_anomaly(&config.anomaly)?;
    validate_forecast(&config.forecast)?;
    validate_recommend(&config.recommend)?;
    Ok(())
}

fn validate_anomaly(anomaly: &AnomalyConfig) -> ValidationResult<()> {
    if !(anomaly.contamination > 0.0 && anomaly.contamination <= 0.5) {
        return Err(invalid(
            "anomaly.contamination",
            format!("Must be in (0, 0.5], got {}", anomaly.contamination),
        ));
    }
    check_nonzero("anomaly.n_estimators", anomaly.n_estimators)?;
    check_nonzero("anomaly.max_samples", anomaly.max_samples)?;

    let cut = &anomaly.severity;
    if !(cut.critical < cut.high && cut.high < cut.medium) {
        return Err(ValidationError::SemanticError(format!(
            "Severity cut-offs must be strictly increasing, got critical={}, high={}, medium={}",
            cut.critical, cut.high, cut.medium
        )));
    }
    Ok(())
}

fn validate_forecast(forecast: &ForecastConfig) -> ValidationResult<()> {
    check_unit_interval("forecast.recommend_threshold", forecast.recommend_threshold)?;
    check_unit_interval("forecast.confidence_cap", forecast.confidence_cap)?;
    check_unit_interval("forecast.confidence_bonus", forecast.confidence_bonus)?;
    check_nonzero("forecast.n_estimators", forecast.n_estimators)?;
    check_nonzero("forecast.max_depth", forecast.max_depth)?;
    check_nonzero("forecast.history_limit", forecast.history_limit)?;
    if forecast.default_days_since_last_call < 0.0 {
        return Err(invalid(
            "forecast.default_days_since_last_call",
            format!(
                "Must be non-negative, got {}",
                forecast.default_days_since_last_call
            ),
        ));
    }
    if forecast.target_column.trim().is_empty() {
        return Err(invalid(
            "forecast.target_column",
            "Must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Upper bound on the priority action list.
pub const MAX_PRIORITY_ACTIONS: usize = 3;

fn validate_recommend(recommend: &RecommendConfig) -> ValidationResult<()> {
    if recommend.imbalance_threshold < 0.0 {
        return Err(invalid(
            "recommend.imbalance_threshold",
            format!("Must be non-negative, got {}", recommend.imbalance_threshold),
        ));
    }
    if recommend.overload_factor <= recommend.underload_factor {
        return Err(ValidationError::SemanticError(format!(
            "overload_factor ({}) must exceed underload_factor ({})",
            recommend.overload_factor, recommend.underload_factor
        )));
    }
    if !(1..=MAX_PRIORITY_ACTIONS).contains(&recommend.priority_action_limit) {
        return Err(invalid(
            "recommend.priority_action_limit",
            format!(
                "Must be in 1..={}, got {}",
                MAX_PRIORITY_ACTIONS, recommend.priority_action_limit
            ),
        ));
    }
    check_unit_interval(
        "recommend.rules.fairness_threshold",
        recommend.rules.fairness_threshold,
    )?;

    let cap = recommend.improvement.cap;
    if !(cap > 0.0 && cap <= 100.0) {
        return Err(invalid(
            "recommend.improvement.cap",
            format!("Must be in (0, 100], got {}", cap),
        ));
    }
    Ok(())
}
