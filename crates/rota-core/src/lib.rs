//! Schedule Intelligence Core Library
//!
//! This library provides the analysis pipeline for residency on-call schedules:
//! - Feature extraction from schedule entries and resident history
//! - Per-batch anomaly scoring, classification and health reports
//! - Call-load forecasting with a persisted regression model
//! - Recommendation synthesis over a schedule snapshot
//! - Configuration loading, structured logging and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod anomaly;
pub mod config;
pub mod exit_codes;
pub mod features;
pub mod forecast;
pub mod logging;
pub mod recommend;
pub mod source;

pub use anomaly::{AnomalyDetector, HealthReport};
pub use forecast::{ForecastWindow, LoadForecaster};
pub use recommend::{RecommendationBundle, RecommendationEngine, ScheduleSnapshot};
pub use source::{InMemoryDataSource, ScheduleDataSource};

/// Numeric failures inside the math crate are malformed-input conditions.
pub(crate) fn math_error(err: rota_math::MathError) -> rota_common::Error {
    rota_common::Error::InvalidDataset(err.to_string())
}
