//! Schedule anomaly detection.
//!
//! A batch of schedule entries is turned into feature vectors, scored by a
//! per-batch isolation forest, and every entry labelled anomalous becomes an
//! [`AnomalyRecord`] with a category, severity tier and remediation text.

pub mod classify;
pub mod scorer;

pub use classify::{classify, health_score, remediation_for, severity_for_score};
pub use scorer::{AnomalyScorer, EntryScore};

use rota_common::{DateRange, ScheduleEntry};
use rota_config::AnomalyConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::features::{extract_schedule_features, ScheduleFeatures};
use crate::logging::{event_names, Stage};

/// Closed set of anomaly categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyCategory {
    #[serde(rename = "Excessive Consecutive Calls")]
    ExcessiveConsecutiveCalls,
    #[serde(rename = "Coverage Gap Detected")]
    CoverageGap,
    #[serde(rename = "Unfair Distribution")]
    UnfairDistribution,
    #[serde(rename = "Vacation Conflict")]
    VacationConflict,
    #[serde(rename = "General Anomaly")]
    General,
}

impl AnomalyCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyCategory::ExcessiveConsecutiveCalls => "Excessive Consecutive Calls",
            AnomalyCategory::CoverageGap => "Coverage Gap Detected",
            AnomalyCategory::UnfairDistribution => "Unfair Distribution",
            AnomalyCategory::VacationConflict => "Vacation Conflict",
            AnomalyCategory::General => "General Anomaly",
        }
    }
}

impl std::fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity tier, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Context copied from the source entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetails {
    pub affected_residents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Raw (unscaled) feature values by name.
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Position of the entry in the submitted batch.
    pub index: usize,
    #[serde(rename = "type")]
    pub category: AnomalyCategory,
    pub severity: Severity,
    pub score: f64,
    pub details: AnomalyDetails,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub total_anomalies: usize,
    pub anomalies: Vec<AnomalyRecord>,
    /// Share of entries labelled normal, in [0, 100].
    pub health_score: f64,
}

impl HealthReport {
    pub fn empty() -> Self {
        Self {
            total_anomalies: 0,
            anomalies: Vec::new(),
            health_score: 0.0,
        }
    }
}

/// Scores a batch and builds the health report.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    scorer: AnomalyScorer,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        let scorer = AnomalyScorer::new(&config);
        Self { config, scorer }
    }

    pub fn detect(&self, batch: &[ScheduleEntry]) -> rota_common::Result<HealthReport> {
        info!(
            event = event_names::DETECT_STARTED,
            stage = %Stage::Detect,
            entries = batch.len(),
            "scoring schedule batch"
        );
        if batch.is_empty() {
            return Ok(HealthReport::empty());
        }

        let features: Vec<ScheduleFeatures> = batch.iter().map(extract_schedule_features).collect();
        debug!(stage = %Stage::Extract, rows = features.len(), "schedule features extracted");
        let scores = self.scorer.score(&features)?;

        let anomalies: Vec<AnomalyRecord> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.anomalous)
            .map(|(index, s)| self.record(index, &batch[index], &features[index], s.score))
            .collect();
        let labels: Vec<bool> = scores.iter().map(|s| !s.anomalous).collect();

        let report = HealthReport {
            total_anomalies: anomalies.len(),
            anomalies,
            health_score: health_score(&labels),
        };
        info!(
            event = event_names::DETECT_FINISHED,
            stage = %Stage::Detect,
            anomalies = report.total_anomalies,
            health_score = report.health_score,
            "anomaly detection complete"
        );
        Ok(report)
    }

    fn record(
        &self,
        index: usize,
        entry: &ScheduleEntry,
        features: &ScheduleFeatures,
        score: f64,
    ) -> AnomalyRecord {
        let category = classify(features);
        AnomalyRecord {
            index,
            category,
            severity: severity_for_score(score, &self.config.severity),
            score,
            details: AnomalyDetails {
                affected_residents: entry.residents.clone(),
                date_range: entry.date_range,
                metrics: features
                    .named()
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            },
            recommendation: remediation_for(category).to_string(),
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_not_an_error() {
        let report = AnomalyDetector::default().detect(&[]).unwrap();
        assert_eq!(report.total_anomalies, 0);
        assert_eq!(report.health_score, 0.0);
    }

    #[test]
    fn single_entry_is_healthy() {
        let report = AnomalyDetector::default()
            .detect(&[ScheduleEntry::default()])
            .unwrap();
        assert_eq!(report.total_anomalies, 0);
        assert_eq!(report.health_score, 100.0);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&AnomalyCategory::CoverageGap).unwrap();
        assert_eq!(json, "\"Coverage Gap Detected\"");
        assert_eq!(Severity::High.to_string(), "High");
    }
}
