//! Pipeline configuration types.
//!
//! Every section defaults independently, so a pipeline.json only needs the
//! keys it overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema_version: String,
    pub anomaly: AnomalyConfig,
    pub forecast: ForecastConfig,
    pub recommend: RecommendConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            anomaly: AnomalyConfig::default(),
            forecast: ForecastConfig::default(),
            recommend: RecommendConfig::default(),
            notes: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::validate::ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::validate::ValidationError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }
}

/// Severity tier boundaries on the outlier score.
///
/// Upper bounds are inclusive: `score <= critical` is Critical, `<= high` is
/// High, `<= medium` is Medium, anything else Low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCutoffs {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for SeverityCutoffs {
    fn default() -> Self {
        Self {
            critical: -0.5,
            high: -0.3,
            medium: -0.1,
        }
    }
}

/// Anomaly scoring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Expected fraction of anomalous entries.
    pub contamination: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub severity: SeverityCutoffs,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
            severity: SeverityCutoffs::default(),
        }
    }
}

/// Call-load forecasting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Residents are recommended for call when probability is strictly above this.
    pub recommend_threshold: f64,
    /// Most-recent call records fetched per resident.
    pub history_limit: usize,
    pub confidence_bonus: f64,
    pub confidence_cap: f64,
    pub default_days_since_last_call: f64,
    pub default_pgy_level: f64,
    pub default_team_size: f64,
    /// Column holding the training label.
    pub target_column: String,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub model_path: PathBuf,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            recommend_threshold: 0.7,
            history_limit: 100,
            confidence_bonus: 0.3,
            confidence_cap: 0.95,
            default_days_since_last_call: 30.0,
            default_pgy_level: 1.0,
            default_team_size: 10.0,
            target_column: "target".to_string(),
            n_estimators: 100,
            max_depth: 10,
            seed: 42,
            model_path: PathBuf::from("models/schedule_predictor.json"),
        }
    }
}

/// Duty-hour style rules checked during schedule analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingRules {
    pub max_consecutive_calls: u32,
    /// Minimum days off between two calls.
    pub min_rest_between_calls: u32,
    pub max_weekend_calls: u32,
    /// Fairness score below which a fairness recommendation is raised.
    pub fairness_threshold: f64,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            max_consecutive_calls: 2,
            min_rest_between_calls: 2,
            max_weekend_calls: 2,
            fairness_threshold: 0.7,
        }
    }
}

/// Increment added to each improvement bucket by one recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactWeights {
    pub coverage: f64,
    pub fairness: f64,
    pub efficiency: f64,
    pub satisfaction: f64,
}

/// Per-recommendation-type improvement weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementWeights {
    pub coverage_gaps: ImpactWeights,
    pub workload_balance: ImpactWeights,
    pub vacation_conflicts: ImpactWeights,
    pub fairness: ImpactWeights,
    pub predictive: ImpactWeights,
    /// Upper bound for every bucket.
    pub cap: f64,
}

impl Default for ImprovementWeights {
    fn default() -> Self {
        Self {
            coverage_gaps: ImpactWeights {
                coverage: 30.0,
                ..Default::default()
            },
            workload_balance: ImpactWeights {
                fairness: 25.0,
                satisfaction: 20.0,
                ..Default::default()
            },
            vacation_conflicts: ImpactWeights {
                satisfaction: 15.0,
                ..Default::default()
            },
            fairness: ImpactWeights {
                fairness: 20.0,
                satisfaction: 25.0,
                ..Default::default()
            },
            predictive: ImpactWeights::default(),
            cap: 100.0,
        }
    }
}

/// Recommendation synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Coefficient of variation above which workload balancing is suggested.
    pub imbalance_threshold: f64,
    /// Residents above `overload_factor × average` are overloaded.
    pub overload_factor: f64,
    /// Residents below `underload_factor × average` are underloaded.
    pub underload_factor: f64,
    pub max_swaps: usize,
    pub max_gap_options: usize,
    /// Length of the priority action list, 1 to 3.
    pub priority_action_limit: usize,
    pub rules: SchedulingRules,
    pub improvement: ImprovementWeights,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: 0.2,
            overload_factor: 1.2,
            underload_factor: 0.8,
            max_swaps: 5,
            max_gap_options: 3,
            priority_action_limit: 3,
            rules: SchedulingRules::default(),
            improvement: ImprovementWeights::default(),
        }
    }
}
