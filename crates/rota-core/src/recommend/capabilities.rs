//! Pluggable scheduling capabilities consulted while building recommendations.
//!
//! The engine owns none of the domain constraints itself. Swap eligibility,
//! backup ranking, vacation alternatives and demand prediction are supplied
//! through these traits; the `Snapshot*`/`Availability*` implementations
//! answer from the snapshot alone.

use chrono::{Days, NaiveDate};
use rota_common::{DateRange, ResidentId};
use rota_config::SchedulingRules;
use serde::{Deserialize, Serialize};

use super::analysis::{CoverageGap, ResidentLoad, ScheduleSnapshot, VacationConflict};
use crate::forecast::ForecastWindow;

/// What capabilities see: the snapshot and the rules in force.
#[derive(Debug, Clone, Copy)]
pub struct RecommendContext<'a> {
    pub snapshot: &'a ScheduleSnapshot,
    pub rules: &'a SchedulingRules,
}

/// Ranked candidate for covering a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageOption {
    pub resident_id: ResidentId,
    pub resident_name: String,
    /// Higher is better, in [0, 1].
    pub suitability_score: f64,
}

/// Day expected to need more coverage than usual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPeriod {
    pub date: NaiveDate,
    pub expected_coverage: usize,
}

/// Resident likely to be needed on a date they cannot work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureConflict {
    pub date: NaiveDate,
    pub resident_id: ResidentId,
    pub call_probability: f64,
}

pub trait SwapPolicy: Send + Sync {
    /// Dates `from` could hand over to `to`; empty when no swap is possible.
    fn swappable_dates(
        &self,
        from: &ResidentLoad,
        to: &ResidentLoad,
        ctx: &RecommendContext<'_>,
    ) -> Vec<NaiveDate>;
}

pub trait CoverageFinder: Send + Sync {
    /// Residents able to cover `gap`, best first.
    fn candidates(&self, gap: &CoverageGap, ctx: &RecommendContext<'_>) -> Vec<CoverageOption>;
}

pub trait VacationPlanner: Send + Sync {
    /// Replacement leave window of the same length.
    fn alternative_dates(
        &self,
        conflict: &VacationConflict,
        ctx: &RecommendContext<'_>,
    ) -> Option<DateRange>;

    /// Resident who can absorb the calls during the leave.
    fn backup_resident(
        &self,
        conflict: &VacationConflict,
        ctx: &RecommendContext<'_>,
    ) -> Option<ResidentLoad>;
}

pub trait DemandPredictor: Send + Sync {
    fn high_demand_periods(&self, ctx: &RecommendContext<'_>) -> Vec<DemandPeriod>;

    fn future_conflicts(&self, ctx: &RecommendContext<'_>) -> Vec<FutureConflict>;
}

/// Swap dates the receiver is free on and that keep their rest rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilitySwapPolicy;

impl SwapPolicy for AvailabilitySwapPolicy {
    fn swappable_dates(
        &self,
        from: &ResidentLoad,
        to: &ResidentLoad,
        ctx: &RecommendContext<'_>,
    ) -> Vec<NaiveDate> {
        let min_rest = i64::from(ctx.rules.min_rest_between_calls);
        let mut dates: Vec<NaiveDate> = from
            .assigned_dates
            .iter()
            .copied()
            .filter(|date| to.is_available(*date))
            .filter(|date| {
                to.distance_to_nearest_call(*date)
                    .map_or(true, |gap| gap >= min_rest)
            })
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }
}

/// Ranks free residents by remaining headroom against the busiest resident.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotCoverageFinder;

impl CoverageFinder for SnapshotCoverageFinder {
    fn candidates(&self, gap: &CoverageGap, ctx: &RecommendContext<'_>) -> Vec<CoverageOption> {
        let max_calls = f64::from(ctx.snapshot.max_calls());
        let min_rest = i64::from(ctx.rules.min_rest_between_calls);
        let mut options: Vec<CoverageOption> = ctx
            .snapshot
            .residents
            .iter()
            .filter(|r| r.is_available(gap.date))
            .map(|r| {
                let headroom = if max_calls > 0.0 {
                    1.0 - f64::from(r.call_count) / max_calls
                } else {
                    1.0
                };
                let rested = r
                    .distance_to_nearest_call(gap.date)
                    .map_or(true, |d| d >= min_rest);
                let score = if rested { 0.5 + 0.5 * headroom } else { 0.5 * headroom };
                CoverageOption {
                    resident_id: r.id.clone(),
                    resident_name: r.name.clone(),
                    suitability_score: score,
                }
            })
            .collect();
        options.sort_by(|a, b| {
            b.suitability_score
                .total_cmp(&a.suitability_score)
                .then_with(|| a.resident_id.cmp(&b.resident_id))
        });
        options
    }
}

/// Shifts leave by whole weeks and picks the least loaded free backup.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotVacationPlanner {
    pub max_weeks_shift: u64,
}

impl Default for SnapshotVacationPlanner {
    fn default() -> Self {
        Self { max_weeks_shift: 8 }
    }
}

impl VacationPlanner for SnapshotVacationPlanner {
    fn alternative_dates(
        &self,
        conflict: &VacationConflict,
        ctx: &RecommendContext<'_>,
    ) -> Option<DateRange> {
        let owner = ctx.snapshot.resident(&conflict.resident_id);
        (1..=self.max_weeks_shift).find_map(|weeks| {
            let shift = Days::new(weeks * 7);
            let start = conflict.start_date.checked_add_days(shift)?;
            let end = conflict.end_date.checked_add_days(shift)?;
            let window = DateRange::new(start, end);
            let hits_gap = ctx.snapshot.coverage_gaps.iter().any(|g| window.contains(g.date));
            let hits_call = owner
                .map(|r| r.assigned_dates.iter().any(|d| window.contains(*d)))
                .unwrap_or(false);
            (!hits_gap && !hits_call).then_some(window)
        })
    }

    fn backup_resident(
        &self,
        conflict: &VacationConflict,
        ctx: &RecommendContext<'_>,
    ) -> Option<ResidentLoad> {
        let range = conflict.range();
        ctx.snapshot
            .residents
            .iter()
            .filter(|r| r.id != conflict.resident_id)
            .filter(|r| !r.unavailable_dates.iter().any(|d| range.contains(*d)))
            .min_by(|a, b| a.call_count.cmp(&b.call_count).then_with(|| a.id.cmp(&b.id)))
            .cloned()
    }
}

/// Reads demand from a computed forecast window.
///
/// A day is high-demand when its recommended head-count exceeds the window's
/// daily mean by [`SURGE_FACTOR`]. A future conflict is a recommended
/// assignment on a date the resident is marked unavailable in the snapshot.
#[derive(Debug, Clone)]
pub struct ForecastDemandPredictor {
    window: ForecastWindow,
}

pub const SURGE_FACTOR: f64 = 1.25;

impl ForecastDemandPredictor {
    pub fn new(window: ForecastWindow) -> Self {
        Self { window }
    }
}

impl DemandPredictor for ForecastDemandPredictor {
    fn high_demand_periods(&self, _ctx: &RecommendContext<'_>) -> Vec<DemandPeriod> {
        let needed: Vec<f64> = self
            .window
            .predictions
            .iter()
            .map(|d| d.total_coverage_needed as f64)
            .collect();
        let baseline = rota_math::mean(&needed);
        self.window
            .predictions
            .iter()
            .filter(|d| d.total_coverage_needed > 0)
            .filter(|d| d.total_coverage_needed as f64 > baseline * SURGE_FACTOR)
            .map(|d| DemandPeriod {
                date: d.date,
                expected_coverage: d.total_coverage_needed,
            })
            .collect()
    }

    fn future_conflicts(&self, ctx: &RecommendContext<'_>) -> Vec<FutureConflict> {
        self.window
            .assignments()
            .filter(|a| a.recommended)
            .filter(|a| {
                ctx.snapshot
                    .resident(&a.resident_id)
                    .map(|r| r.unavailable_dates.contains(&a.date))
                    .unwrap_or(false)
            })
            .map(|a| FutureConflict {
                date: a.date,
                resident_id: a.resident_id.clone(),
                call_probability: a.call_probability,
            })
            .collect()
    }
}

/// No forward-looking signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDemandPrediction;

impl DemandPredictor for NoDemandPrediction {
    fn high_demand_periods(&self, _ctx: &RecommendContext<'_>) -> Vec<DemandPeriod> {
        Vec::new()
    }

    fn future_conflicts(&self, _ctx: &RecommendContext<'_>) -> Vec<FutureConflict> {
        Vec::new()
    }
}
