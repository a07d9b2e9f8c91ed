//! Rota pipeline configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for pipeline.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation

pub mod pipeline;
pub mod resolve;
pub mod validate;

pub use pipeline::{
    AnomalyConfig, ForecastConfig, ImpactWeights, ImprovementWeights, PipelineConfig,
    RecommendConfig, SchedulingRules, SeverityCutoffs,
};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use validate::{validate_pipeline, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
