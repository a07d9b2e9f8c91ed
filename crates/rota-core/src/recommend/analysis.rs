//! Schedule snapshot and the aggregate analysis the engine reasons over.

use chrono::{Datelike, NaiveDate, Weekday};
use rota_common::{DateRange, ResidentId};
use rota_config::SchedulingRules;
use serde::{Deserialize, Serialize};

/// One resident's load within the snapshot period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentLoad {
    pub id: ResidentId,
    pub name: String,
    pub call_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgy_level: Option<u8>,

    /// Precomputed longest run of back-to-back call days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_calls: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_calls: Option<u32>,

    /// Precomputed smallest number of days between two calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rest_days: Option<u32>,

    #[serde(default)]
    pub assigned_dates: Vec<NaiveDate>,

    /// Dates the resident cannot take call (leave, rotation off-site, ...).
    #[serde(default)]
    pub unavailable_dates: Vec<NaiveDate>,
}

impl ResidentLoad {
    pub fn is_assigned(&self, date: NaiveDate) -> bool {
        self.assigned_dates.contains(&date)
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.is_assigned(date) && !self.unavailable_dates.contains(&date)
    }

    /// Days to the nearest assigned call, ignoring `date` itself.
    pub fn distance_to_nearest_call(&self, date: NaiveDate) -> Option<i64> {
        self.assigned_dates
            .iter()
            .filter(|d| **d != date)
            .map(|d| (*d - date).num_days().abs())
            .min()
    }

    fn sorted_dates(&self) -> Vec<NaiveDate> {
        let mut dates = self.assigned_dates.clone();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Longest back-to-back run, from the precomputed field or the dates.
    pub fn longest_consecutive_run(&self) -> u32 {
        if let Some(n) = self.consecutive_calls {
            return n;
        }
        let dates = self.sorted_dates();
        let mut best = 0u32;
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;
        for date in dates {
            run = match prev {
                Some(p) if (date - p).num_days() == 1 => run + 1,
                _ => 1,
            };
            best = best.max(run);
            prev = Some(date);
        }
        best
    }

    pub fn weekend_call_count(&self) -> u32 {
        if let Some(n) = self.weekend_calls {
            return n;
        }
        self.sorted_dates()
            .iter()
            .filter(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .count() as u32
    }

    /// Smallest gap in days between successive calls; `None` with fewer
    /// than two calls.
    pub fn shortest_rest(&self) -> Option<u32> {
        if self.min_rest_days.is_some() {
            return self.min_rest_days;
        }
        self.sorted_dates()
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days().max(0) as u32)
            .min()
    }
}

/// Date with no resident assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub date: NaiveDate,
    #[serde(rename = "type", default = "default_gap_type")]
    pub gap_type: String,
}

fn default_gap_type() -> String {
    "call".to_string()
}

/// Approved leave that collides with required coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationConflict {
    pub resident_id: ResidentId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VacationConflict {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Current schedule as handed to the recommendation engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<DateRange>,
    pub residents: Vec<ResidentLoad>,
    /// Overrides the mean of `residents[].call_count` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_calls: Option<f64>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub vacation_conflicts: Vec<VacationConflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fairness_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_score: Option<f64>,
}

impl ScheduleSnapshot {
    pub fn from_file(path: &std::path::Path) -> rota_common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn call_counts(&self) -> Vec<f64> {
        self.residents.iter().map(|r| f64::from(r.call_count)).collect()
    }

    pub fn average_calls(&self) -> f64 {
        self.average_calls
            .unwrap_or_else(|| rota_math::mean(&self.call_counts()))
    }

    pub fn resident(&self, id: &ResidentId) -> Option<&ResidentLoad> {
        self.residents.iter().find(|r| &r.id == id)
    }

    pub fn max_calls(&self) -> u32 {
        self.residents.iter().map(|r| r.call_count).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    MaxConsecutiveCalls,
    MinRestBetweenCalls,
    MaxWeekendCalls,
}

/// One resident breaking one scheduling rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub resident_id: ResidentId,
    pub rule: ComplianceRule,
    pub observed: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAnalysis {
    /// Coefficient of variation of call counts.
    pub workload_imbalance: f64,
    pub coverage_gaps: Vec<CoverageGap>,
    pub vacation_conflicts: Vec<VacationConflict>,
    pub fairness_score: f64,
    pub efficiency_score: f64,
    pub compliance_issues: Vec<ComplianceIssue>,
}

/// Analyse a snapshot against the scheduling rules.
pub fn analyze(snapshot: &ScheduleSnapshot, rules: &SchedulingRules) -> ScheduleAnalysis {
    let counts = snapshot.call_counts();
    ScheduleAnalysis {
        workload_imbalance: rota_math::coefficient_of_variation(&counts),
        coverage_gaps: snapshot.coverage_gaps.clone(),
        vacation_conflicts: snapshot.vacation_conflicts.clone(),
        fairness_score: snapshot
            .fairness_score
            .unwrap_or_else(|| 1.0 - rota_math::gini(&counts)),
        efficiency_score: snapshot
            .efficiency_score
            .unwrap_or_else(|| efficiency(&counts)),
        compliance_issues: check_compliance(snapshot, rules),
    }
}

/// Mean load over peak load; 0.0 when nobody has calls.
fn efficiency(counts: &[f64]) -> f64 {
    let max = counts.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return 0.0;
    }
    rota_math::mean(counts) / max
}

pub fn check_compliance(
    snapshot: &ScheduleSnapshot,
    rules: &SchedulingRules,
) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();
    for resident in &snapshot.residents {
        let consecutive = resident.longest_consecutive_run();
        if consecutive > rules.max_consecutive_calls {
            issues.push(ComplianceIssue {
                resident_id: resident.id.clone(),
                rule: ComplianceRule::MaxConsecutiveCalls,
                observed: consecutive,
                limit: rules.max_consecutive_calls,
            });
        }
        if let Some(rest) = resident.shortest_rest() {
            if rest < rules.min_rest_between_calls {
                issues.push(ComplianceIssue {
                    resident_id: resident.id.clone(),
                    rule: ComplianceRule::MinRestBetweenCalls,
                    observed: rest,
                    limit: rules.min_rest_between_calls,
                });
            }
        }
        let weekend = resident.weekend_call_count();
        if weekend > rules.max_weekend_calls {
            issues.push(ComplianceIssue {
                resident_id: resident.id.clone(),
                rule: ComplianceRule::MaxWeekendCalls,
                observed: weekend,
                limit: rules.max_weekend_calls,
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn load(id: &str, calls: u32, dates: &[u32]) -> ResidentLoad {
        ResidentLoad {
            id: ResidentId::from(id),
            name: format!("Dr. {}", id),
            call_count: calls,
            pgy_level: None,
            consecutive_calls: None,
            weekend_calls: None,
            min_rest_days: None,
            assigned_dates: dates.iter().map(|&x| d(x)).collect(),
            unavailable_dates: Vec::new(),
        }
    }

    #[test]
    fn even_load_has_no_imbalance() {
        let snapshot = ScheduleSnapshot {
            residents: (0..4).map(|i| load(&format!("r{}", i), 4, &[])).collect(),
            ..Default::default()
        };
        let analysis = analyze(&snapshot, &SchedulingRules::default());
        assert_eq!(analysis.workload_imbalance, 0.0);
        assert!((analysis.fairness_score - 1.0).abs() < 1e-12);
        assert!((analysis.efficiency_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_snapshot_is_neutral() {
        let analysis = analyze(&ScheduleSnapshot::default(), &SchedulingRules::default());
        assert_eq!(analysis.workload_imbalance, 0.0);
        assert_eq!(analysis.efficiency_score, 0.0);
        assert!(analysis.compliance_issues.is_empty());
    }

    #[test]
    fn precomputed_scores_win() {
        let snapshot = ScheduleSnapshot {
            residents: vec![load("a", 2, &[]), load("b", 8, &[])],
            fairness_score: Some(0.75),
            efficiency_score: Some(0.8),
            ..Default::default()
        };
        let analysis = analyze(&snapshot, &SchedulingRules::default());
        assert_eq!(analysis.fairness_score, 0.75);
        assert_eq!(analysis.efficiency_score, 0.8);
        assert!((analysis.workload_imbalance - 0.6).abs() < 1e-12);
    }

    #[test]
    fn runs_and_rest_come_from_dates() {
        // 03-07/08 and 03-14/15 are weekends
        let r = load("a", 5, &[6, 7, 8, 14, 15]);
        assert_eq!(r.longest_consecutive_run(), 3);
        assert_eq!(r.weekend_call_count(), 4);
        assert_eq!(r.shortest_rest(), Some(1));
        assert_eq!(load("b", 1, &[3]).shortest_rest(), None);
    }

    #[test]
    fn compliance_flags_each_rule() {
        let snapshot = ScheduleSnapshot {
            residents: vec![load("a", 5, &[6, 7, 8, 14, 15]), load("b", 2, &[2, 10])],
            ..Default::default()
        };
        let issues = check_compliance(&snapshot, &SchedulingRules::default());
        let rules: Vec<ComplianceRule> = issues.iter().map(|i| i.rule).collect();
        assert_eq!(
            rules,
            vec![
                ComplianceRule::MaxConsecutiveCalls,
                ComplianceRule::MinRestBetweenCalls,
                ComplianceRule::MaxWeekendCalls,
            ]
        );
        assert!(issues.iter().all(|i| i.resident_id.as_str() == "a"));
        assert_eq!(issues[0].observed, 3);
        assert_eq!(issues[0].limit, 2);
    }

    #[test]
    fn snapshot_defaults_when_fields_absent() {
        let snapshot: ScheduleSnapshot = serde_json::from_str(
            r#"{"residents": [{"id": "a", "name": "A", "call_count": 3}],
                "coverage_gaps": [{"date": "2026-03-09"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.coverage_gaps[0].gap_type, "call");
        assert_eq!(snapshot.average_calls(), 3.0);
    }
}
