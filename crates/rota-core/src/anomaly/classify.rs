//! Category, severity and remediation for anomalous entries.

use rota_config::pipeline::SeverityCutoffs;

use super::{AnomalyCategory, Severity};
use crate::features::ScheduleFeatures;

/// Category of an anomalous entry. Checks run in a fixed order and the first
/// match wins: consecutive calls, coverage gaps, fairness, vacation conflicts.
pub fn classify(features: &ScheduleFeatures) -> AnomalyCategory {
    if features.consecutive_calls > 2.0 {
        AnomalyCategory::ExcessiveConsecutiveCalls
    } else if features.coverage_gaps > 0.0 {
        AnomalyCategory::CoverageGap
    } else if features.fairness_index < 0.5 {
        AnomalyCategory::UnfairDistribution
    } else if features.vacation_conflicts > 0.0 {
        AnomalyCategory::VacationConflict
    } else {
        AnomalyCategory::General
    }
}

/// Severity tier for an outlier score. Each cut-off belongs to the more
/// severe tier.
pub fn severity_for_score(score: f64, cutoffs: &SeverityCutoffs) -> Severity {
    if score <= cutoffs.critical {
        Severity::Critical
    } else if score <= cutoffs.high {
        Severity::High
    } else if score <= cutoffs.medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub fn remediation_for(category: AnomalyCategory) -> &'static str {
    match category {
        AnomalyCategory::ExcessiveConsecutiveCalls => {
            "Redistribute calls to prevent burnout. Consider adding post-call days."
        }
        AnomalyCategory::CoverageGap => {
            "Fill coverage gaps by adjusting vacation approvals or adding backup residents."
        }
        AnomalyCategory::UnfairDistribution => {
            "Rebalance call distribution to ensure fairness across all residents."
        }
        AnomalyCategory::VacationConflict => {
            "Review and adjust vacation schedules to avoid conflicts."
        }
        AnomalyCategory::General => "Review schedule manually for optimization opportunities.",
    }
}

/// Percentage of entries labelled normal; 0.0 for an empty batch.
pub fn health_score(normal_labels: &[bool]) -> f64 {
    if normal_labels.is_empty() {
        return 0.0;
    }
    let normal = normal_labels.iter().filter(|&&n| n).count();
    normal as f64 / normal_labels.len() as f64 * 100.0
}
