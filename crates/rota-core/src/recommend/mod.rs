//! Recommendation synthesis.
//!
//! The engine analyses a [`ScheduleSnapshot`], emits independent
//! recommendations per detected condition, exposes the top priority actions
//! and estimates the aggregate improvement over four buckets.

pub mod analysis;
pub mod capabilities;
pub mod engine;

pub use analysis::{
    analyze, check_compliance, ComplianceIssue, ComplianceRule, CoverageGap, ResidentLoad,
    ScheduleAnalysis, ScheduleSnapshot, VacationConflict,
};
pub use capabilities::{
    AvailabilitySwapPolicy, CoverageFinder, CoverageOption, DemandPeriod, DemandPredictor,
    ForecastDemandPredictor, FutureConflict, NoDemandPrediction, RecommendContext,
    SnapshotCoverageFinder, SnapshotVacationPlanner, SwapPolicy, VacationPlanner,
};
pub use engine::RecommendationEngine;

use chrono::{DateTime, NaiveDate, Utc};
use rota_common::ResidentId;
use rota_config::{ImpactWeights, ImprovementWeights};
use serde::{Deserialize, Serialize};

/// Priority tier; unrecognised tiers sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Unknown => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    WorkloadBalance,
    CoverageGaps,
    VacationConflicts,
    Fairness,
    Predictive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapSuggestion {
    pub from: ResidentId,
    pub to: ResidentId,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapFix {
    pub gap_date: NaiveDate,
    #[serde(rename = "type")]
    pub gap_type: String,
    pub available_options: Vec<CoverageOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionKind {
    Reschedule,
    Coverage,
    Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionOption {
    #[serde(rename = "type")]
    pub kind: SolutionKind,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationSolution {
    pub conflict: VacationConflict,
    /// Always reschedule, coverage, split in that order.
    pub options: Vec<SolutionOption>,
}

/// Type-specific body, flattened into the recommendation under its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPayload {
    SuggestedSwaps(Vec<SwapSuggestion>),
    Fixes(Vec<GapFix>),
    Solutions(Vec<VacationSolution>),
    Suggestions(Vec<String>),
    HighDemandPeriods(Vec<DemandPeriod>),
    FutureConflicts(Vec<FutureConflict>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub description: String,
    #[serde(flatten)]
    pub payload: RecommendationPayload,
    pub impact: String,
}

/// Improvement estimate per bucket, each in [0, cap].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImprovementEstimate {
    pub coverage: f64,
    pub fairness: f64,
    pub efficiency: f64,
    pub satisfaction: f64,
}

impl ImprovementEstimate {
    fn add(&mut self, w: &ImpactWeights) {
        self.coverage += w.coverage;
        self.fairness += w.fairness;
        self.efficiency += w.efficiency;
        self.satisfaction += w.satisfaction;
    }

    fn capped(self, cap: f64) -> Self {
        Self {
            coverage: self.coverage.min(cap),
            fairness: self.fairness.min(cap),
            efficiency: self.efficiency.min(cap),
            satisfaction: self.satisfaction.min(cap),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub timestamp: DateTime<Utc>,
    pub analysis: ScheduleAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub priority_actions: Vec<Recommendation>,
    pub estimated_improvement: ImprovementEstimate,
}

/// Stable sort by priority tier, keeping at most `limit`.
pub fn prioritize(recommendations: &[Recommendation], limit: usize) -> Vec<Recommendation> {
    let mut sorted = recommendations.to_vec();
    sorted.sort_by_key(|r| r.priority.rank());
    sorted.truncate(limit);
    sorted
}

/// Sum per-type weights over every recommendation, capping each bucket.
pub fn estimate_improvement(
    recommendations: &[Recommendation],
    weights: &ImprovementWeights,
) -> ImprovementEstimate {
    let mut total = ImprovementEstimate::default();
    for rec in recommendations {
        let w = match rec.kind {
            RecommendationType::CoverageGaps => &weights.coverage_gaps,
            RecommendationType::WorkloadBalance => &weights.workload_balance,
            RecommendationType::VacationConflicts => &weights.vacation_conflicts,
            RecommendationType::Fairness => &weights.fairness,
            RecommendationType::Predictive => &weights.predictive,
        };
        total.add(w);
    }
    total.capped(weights.cap)
}
