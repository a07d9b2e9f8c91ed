//! Records exchanged with the scheduling store and the scoring pipeline.
//!
//! Field names follow the store's JSON documents so fixtures and store
//! exports deserialize without adapters. Optional numeric fields stay
//! optional here; defaults are applied by feature extraction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::ResidentId;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One scored unit of a schedule: a resident's monthly or rotation-level
/// assignment summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_id: Option<ResidentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    /// Residents affected by this entry.
    #[serde(default)]
    pub residents: Vec<String>,

    #[serde(default)]
    pub calls_count: Option<f64>,

    #[serde(default)]
    pub consecutive_calls: Option<f64>,

    /// Fraction of calls falling on weekends.
    #[serde(default)]
    pub weekend_ratio: Option<f64>,

    #[serde(default)]
    pub coverage_gaps: Option<f64>,

    /// Pre-computed evenness of call burden in [0, 1].
    #[serde(default)]
    pub fairness_index: Option<f64>,

    #[serde(default)]
    pub pgy_variance: Option<f64>,

    #[serde(default)]
    pub vacation_conflicts: Option<f64>,

    #[serde(default)]
    pub workload_variance: Option<f64>,
}

/// Resident record as returned by the active-residents query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub name: String,

    #[serde(default)]
    pub pgy_level: Option<u8>,

    #[serde(default)]
    pub monthly_calls: Option<u32>,

    #[serde(default)]
    pub last_call_date: Option<NaiveDate>,

    #[serde(default)]
    pub team_size: Option<u32>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// One historical call assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub resident_id: ResidentId,
    pub date: NaiveDate,

    /// Coverage outcome used as the training target (1.0 = covered the call).
    #[serde(alias = "target")]
    pub outcome: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
}

/// Leave request lifecycle state.
///
/// Only `Approved` leave blocks call; unrecognised states parse as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "denied")]
    Denied,
    #[serde(alias = "cancelled")]
    Cancelled,
    #[serde(other)]
    Other,
}

/// Leave (vacation) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_id: Option<ResidentId>,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl LeaveRequest {
    /// Whether the leave overlaps `date` (both ends inclusive).
    pub fn overlaps(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Only approved leave overlapping the date counts as a vacation conflict.
    pub fn conflicts_on(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.overlaps(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn only_approved_overlapping_leave_conflicts() {
        let mut leave = LeaveRequest {
            resident_id: Some("r1".into()),
            status: LeaveStatus::Approved,
            start_date: d(2026, 3, 2),
            end_date: d(2026, 3, 6),
        };
        assert!(leave.conflicts_on(d(2026, 3, 2)));
        assert!(leave.conflicts_on(d(2026, 3, 6)));
        assert!(!leave.conflicts_on(d(2026, 3, 7)));

        leave.status = LeaveStatus::Pending;
        assert!(!leave.conflicts_on(d(2026, 3, 4)));
    }

    #[test]
    fn entry_fields_default_to_none() {
        let entry: ScheduleEntry = serde_json::from_str(r#"{"calls_count": 6}"#).unwrap();
        assert_eq!(entry.calls_count, Some(6.0));
        assert!(entry.fairness_index.is_none());
        assert!(entry.residents.is_empty());
    }

    #[test]
    fn call_record_accepts_target_alias() {
        let rec: CallRecord =
            serde_json::from_str(r#"{"resident_id":"r1","date":"2026-01-04","target":1.0}"#)
                .unwrap();
        assert_eq!(rec.outcome, 1.0);
    }

    #[test]
    fn leave_status_uses_store_spelling() {
        let status: LeaveStatus = serde_json::from_str("\"Approved\"").unwrap();
        assert_eq!(status, LeaveStatus::Approved);
    }

    #[test]
    fn date_range_counts_both_ends() {
        let range = DateRange::new(d(2026, 1, 1), d(2026, 1, 31));
        assert_eq!(range.days(), 31);
        assert!(range.contains(d(2026, 1, 31)));
        assert_eq!(range.to_string(), "2026-01-01..2026-01-31");
    }

    #[test]
    fn resident_defaults_to_active() {
        let r: Resident = serde_json::from_str(r#"{"id":"r1","name":"A. Osei"}"#).unwrap();
        assert!(r.active);
        assert!(r.pgy_level.is_none());
    }
}
