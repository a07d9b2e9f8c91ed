//! Feature extraction.
//!
//! Two fixed-width vectors: one per schedule entry for anomaly scoring, one
//! per (date, resident, history) triple for call-load forecasting. Field
//! order is part of the contract; scalers and models align positionally, so
//! the `*_FEATURE_NAMES` constants must stay in step with `to_array`.

use chrono::{Datelike, NaiveDate};
use rota_common::{CallRecord, LeaveRequest, Resident, ScheduleEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const SCHEDULE_FEATURE_NAMES: [&str; 8] = [
    "calls_per_resident",
    "consecutive_calls",
    "weekend_concentration",
    "coverage_gaps",
    "fairness_index",
    "pgy_distribution",
    "vacation_conflicts",
    "workload_variance",
];

pub const FORECAST_FEATURE_NAMES: [&str; 10] = [
    "day_of_week",
    "month",
    "is_weekend",
    "is_holiday",
    "days_since_last_call",
    "total_calls_this_month",
    "pgy_level",
    "historical_avg_calls",
    "team_size",
    "vacation_conflicts",
];

/// Fairness assumed when an entry carries no pre-computed index.
pub const DEFAULT_FAIRNESS_INDEX: f64 = 1.0;

/// Feature vector for one schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFeatures {
    pub calls_per_resident: f64,
    pub consecutive_calls: f64,
    pub weekend_concentration: f64,
    pub coverage_gaps: f64,
    pub fairness_index: f64,
    pub pgy_distribution: f64,
    pub vacation_conflicts: f64,
    pub workload_variance: f64,
}

impl ScheduleFeatures {
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.calls_per_resident,
            self.consecutive_calls,
            self.weekend_concentration,
            self.coverage_gaps,
            self.fairness_index,
            self.pgy_distribution,
            self.vacation_conflicts,
            self.workload_variance,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Named view used in anomaly detail payloads.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        SCHEDULE_FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.to_array())
            .collect()
    }
}

/// Build the anomaly feature vector. Missing fields default to 0, except the
/// fairness index which defaults to 1.
pub fn extract_schedule_features(entry: &ScheduleEntry) -> ScheduleFeatures {
    ScheduleFeatures {
        calls_per_resident: entry.calls_count.unwrap_or(0.0),
        consecutive_calls: entry.consecutive_calls.unwrap_or(0.0),
        weekend_concentration: entry.weekend_ratio.unwrap_or(0.0),
        coverage_gaps: entry.coverage_gaps.unwrap_or(0.0),
        fairness_index: entry.fairness_index.unwrap_or(DEFAULT_FAIRNESS_INDEX),
        pgy_distribution: entry.pgy_variance.unwrap_or(0.0),
        vacation_conflicts: entry.vacation_conflicts.unwrap_or(0.0),
        workload_variance: entry.workload_variance.unwrap_or(0.0),
    }
}

/// Feature vector for one resident on one forecast date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastFeatures {
    /// Monday = 0 .. Sunday = 6.
    pub day_of_week: f64,
    pub month: f64,
    pub is_weekend: f64,
    pub is_holiday: f64,
    pub days_since_last_call: f64,
    pub total_calls_this_month: f64,
    pub pgy_level: f64,
    pub historical_avg_calls: f64,
    pub team_size: f64,
    pub vacation_conflicts: f64,
}

impl ForecastFeatures {
    pub fn to_array(&self) -> [f64; 10] {
        [
            self.day_of_week,
            self.month,
            self.is_weekend,
            self.is_holiday,
            self.days_since_last_call,
            self.total_calls_this_month,
            self.pgy_level,
            self.historical_avg_calls,
            self.team_size,
            self.vacation_conflicts,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }
}

/// Fallbacks applied when a resident record lacks a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDefaults {
    pub days_since_last_call: f64,
    pub pgy_level: f64,
    pub team_size: f64,
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        Self {
            days_since_last_call: 30.0,
            pgy_level: 1.0,
            team_size: 10.0,
        }
    }
}

impl From<&rota_config::ForecastConfig> for ForecastDefaults {
    fn from(cfg: &rota_config::ForecastConfig) -> Self {
        Self {
            days_since_last_call: cfg.default_days_since_last_call,
            pgy_level: cfg.default_pgy_level,
            team_size: cfg.default_team_size,
        }
    }
}

/// Calendar context shared by every resident on a forecast date.
#[derive(Debug, Clone, Copy)]
pub struct CalendarContext<'a> {
    pub holidays: &'a HashSet<NaiveDate>,
    pub leave_requests: &'a [LeaveRequest],
}

impl CalendarContext<'_> {
    /// Approved leave requests overlapping `date`.
    pub fn vacation_conflicts_on(&self, date: NaiveDate) -> usize {
        self.leave_requests
            .iter()
            .filter(|leave| leave.conflicts_on(date))
            .count()
    }
}

/// Build the forecasting feature vector for `resident` on `date`.
pub fn extract_forecast_features(
    date: NaiveDate,
    resident: &Resident,
    history: &[CallRecord],
    calendar: &CalendarContext<'_>,
    defaults: &ForecastDefaults,
) -> ForecastFeatures {
    let weekday = date.weekday().num_days_from_monday();
    let days_since_last_call = resident
        .last_call_date
        .map(|last| (date - last).num_days().max(0) as f64)
        .unwrap_or(defaults.days_since_last_call);

    ForecastFeatures {
        day_of_week: weekday as f64,
        month: date.month() as f64,
        is_weekend: if weekday >= 5 { 1.0 } else { 0.0 },
        is_holiday: if calendar.holidays.contains(&date) {
            1.0
        } else {
            0.0
        },
        days_since_last_call,
        total_calls_this_month: resident.monthly_calls.unwrap_or(0) as f64,
        pgy_level: resident
            .pgy_level
            .map(f64::from)
            .unwrap_or(defaults.pgy_level),
        historical_avg_calls: historical_average(history),
        team_size: resident
            .team_size
            .map(f64::from)
            .unwrap_or(defaults.team_size),
        vacation_conflicts: calendar.vacation_conflicts_on(date) as f64,
    }
}

/// Calls per calendar month covered by the history (0 for no history).
pub fn historical_average(history: &[CallRecord]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let months: BTreeSet<(i32, u32)> = history
        .iter()
        .map(|record| (record.date.year(), record.date.month()))
        .collect();
    history.len() as f64 / months.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rota_common::{LeaveStatus, ResidentId};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn resident() -> Resident {
        Resident {
            id: ResidentId::from("r1"),
            name: "Dr. Ames".to_string(),
            pgy_level: None,
            monthly_calls: None,
            last_call_date: None,
            team_size: None,
            active: true,
        }
    }

    fn call(day: NaiveDate) -> CallRecord {
        CallRecord {
            resident_id: ResidentId::from("r1"),
            date: day,
            outcome: 1.0,
            call_type: None,
        }
    }

    #[test]
    fn empty_entry_uses_defaults() {
        let features = extract_schedule_features(&ScheduleEntry::default());
        assert_eq!(
            features.to_array(),
            [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn entry_fields_map_in_order() {
        let entry = ScheduleEntry {
            calls_count: Some(6.0),
            consecutive_calls: Some(3.0),
            weekend_ratio: Some(0.5),
            coverage_gaps: Some(1.0),
            fairness_index: Some(0.4),
            pgy_variance: Some(0.2),
            vacation_conflicts: Some(2.0),
            workload_variance: Some(1.5),
            ..Default::default()
        };
        let features = extract_schedule_features(&entry);
        assert_eq!(
            features.to_array(),
            [6.0, 3.0, 0.5, 1.0, 0.4, 0.2, 2.0, 1.5]
        );
        assert_eq!(features.named()[4], ("fairness_index", 0.4));
    }

    #[test]
    fn forecast_defaults_apply_for_sparse_resident() {
        let holidays = HashSet::new();
        let calendar = CalendarContext {
            holidays: &holidays,
            leave_requests: &[],
        };
        // 2026-03-07 is a Saturday
        let features = extract_forecast_features(
            d(2026, 3, 7),
            &resident(),
            &[],
            &calendar,
            &ForecastDefaults::default(),
        );
        assert_eq!(features.day_of_week, 5.0);
        assert_eq!(features.month, 3.0);
        assert_eq!(features.is_weekend, 1.0);
        assert_eq!(features.is_holiday, 0.0);
        assert_eq!(features.days_since_last_call, 30.0);
        assert_eq!(features.total_calls_this_month, 0.0);
        assert_eq!(features.pgy_level, 1.0);
        assert_eq!(features.historical_avg_calls, 0.0);
        assert_eq!(features.team_size, 10.0);
        assert_eq!(features.vacation_conflicts, 0.0);
    }

    #[test]
    fn forecast_features_use_calendar_and_history() {
        let date = d(2026, 1, 1);
        let holidays: HashSet<NaiveDate> = [date].into_iter().collect();
        let leave = vec![
            LeaveRequest {
                resident_id: None,
                status: LeaveStatus::Approved,
                start_date: d(2025, 12, 30),
                end_date: d(2026, 1, 2),
            },
            LeaveRequest {
                resident_id: None,
                status: LeaveStatus::Pending,
                start_date: d(2025, 12, 30),
                end_date: d(2026, 1, 2),
            },
        ];
        let calendar = CalendarContext {
            holidays: &holidays,
            leave_requests: &leave,
        };
        let mut res = resident();
        res.last_call_date = Some(d(2025, 12, 27));
        res.pgy_level = Some(3);
        res.monthly_calls = Some(4);
        res.team_size = Some(12);
        let history = vec![call(d(2025, 12, 27)), call(d(2025, 12, 20)), call(d(2025, 11, 3))];

        let f = extract_forecast_features(
            date,
            &res,
            &history,
            &calendar,
            &ForecastDefaults::default(),
        );
        assert_eq!(f.is_holiday, 1.0);
        assert_eq!(f.days_since_last_call, 5.0);
        assert_eq!(f.pgy_level, 3.0);
        assert_eq!(f.total_calls_this_month, 4.0);
        assert_eq!(f.team_size, 12.0);
        assert_eq!(f.historical_avg_calls, 1.5);
        assert_eq!(f.vacation_conflicts, 1.0);
    }

    #[test]
    fn future_last_call_clamps_to_zero() {
        let holidays = HashSet::new();
        let calendar = CalendarContext {
            holidays: &holidays,
            leave_requests: &[],
        };
        let mut res = resident();
        res.last_call_date = Some(d(2026, 5, 10));
        let f = extract_forecast_features(
            d(2026, 5, 1),
            &res,
            &[],
            &calendar,
            &ForecastDefaults::default(),
        );
        assert_eq!(f.days_since_last_call, 0.0);
    }
}
