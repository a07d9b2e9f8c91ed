//! Call-load forecasting.
//!
//! A regression forest trained on historical coverage outcomes (1 = the
//! resident covered the call) is read as a call probability per resident per
//! day. Windows aggregate days; the window confidence is a directional
//! heuristic, not a calibrated interval.

pub mod dataset;
pub mod model_store;
pub mod predictor;

pub use dataset::{training_table_from_store, LabelledData, TrainingTable};
pub use model_store::{ArtifactInfo, ModelStore, TrainedModel};
pub use predictor::{ForecastModel, LoadForecaster};

use chrono::NaiveDate;
use rota_common::ResidentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAssignment {
    pub date: NaiveDate,
    pub resident_id: ResidentId,
    pub resident_name: String,
    /// In [0, 1].
    pub call_probability: f64,
    /// `call_probability` strictly above the recommend threshold.
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Residents recommended for call on this date.
    pub total_coverage_needed: usize,
    /// Sorted by descending probability.
    pub assignments: Vec<ForecastAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub period_start: NaiveDate,
    /// Last requested day, inclusive.
    pub period_end: NaiveDate,
    pub predictions: Vec<DailyForecast>,
    pub confidence: f64,
    /// False when the forecast was cancelled before the last day.
    pub complete: bool,
}

impl ForecastWindow {
    pub fn assignments(&self) -> impl Iterator<Item = &ForecastAssignment> {
        self.predictions.iter().flat_map(|d| d.assignments.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub status: String,
    /// In-sample R².
    pub accuracy: f64,
    pub features: Vec<String>,
}

/// Recommend for call only when strictly above the threshold.
pub fn is_recommended(call_probability: f64, threshold: f64) -> bool {
    call_probability > threshold
}

/// `min(cap, mean probability + bonus)` over every assignment; 0.0 when the
/// window has no assignments.
pub fn confidence_score(predictions: &[DailyForecast], bonus: f64, cap: f64) -> f64 {
    let probabilities: Vec<f64> = predictions
        .iter()
        .flat_map(|d| d.assignments.iter().map(|a| a.call_probability))
        .collect();
    if probabilities.is_empty() {
        return 0.0;
    }
    (rota_math::mean(&probabilities) + bonus).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(probabilities: &[f64]) -> DailyForecast {
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        DailyForecast {
            date,
            total_coverage_needed: 0,
            assignments: probabilities
                .iter()
                .map(|&p| ForecastAssignment {
                    date,
                    resident_id: ResidentId::from("r"),
                    resident_name: "R".to_string(),
                    call_probability: p,
                    recommended: p > 0.7,
                })
                .collect(),
        }
    }

    #[test]
    fn recommendation_threshold_is_strict() {
        assert!(!is_recommended(0.7, 0.7));
        assert!(is_recommended(0.70001, 0.7));
        assert!(!is_recommended(0.2, 0.7));
    }

    #[test]
    fn confidence_adds_bonus() {
        let c = confidence_score(&[daily(&[0.4, 0.6]), daily(&[0.5])], 0.3, 0.95);
        assert!((c - 0.8).abs() < 1e-12);
    }

    #[test]
    fn confidence_is_capped() {
        let c = confidence_score(&[daily(&[0.9, 0.9])], 0.3, 0.95);
        assert_eq!(c, 0.95);
    }

    #[test]
    fn empty_window_has_zero_confidence() {
        assert_eq!(confidence_score(&[], 0.3, 0.95), 0.0);
        assert_eq!(confidence_score(&[daily(&[])], 0.3, 0.95), 0.0);
    }
}
