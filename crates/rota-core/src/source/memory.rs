//! In-memory scheduling store, loadable from a JSON export.

use chrono::NaiveDate;
use rota_common::{CallRecord, LeaveRequest, Resident, ResidentId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::ScheduleDataSource;

/// Snapshot of the four store collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryDataSource {
    pub residents: Vec<Resident>,
    pub call_assignments: Vec<CallRecord>,
    pub holidays: Vec<NaiveDate>,
    pub leave_requests: Vec<LeaveRequest>,
}

impl InMemoryDataSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_json(&content)
    }

    pub fn parse_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every call record, for assembling a training table.
    pub fn all_calls(&self) -> &[CallRecord] {
        &self.call_assignments
    }
}

impl ScheduleDataSource for InMemoryDataSource {
    fn active_residents(&self, _date: NaiveDate) -> Result<Vec<Resident>> {
        Ok(self.residents.iter().filter(|r| r.active).cloned().collect())
    }

    fn call_history(&self, resident: &ResidentId, limit: usize) -> Result<Vec<CallRecord>> {
        let mut calls: Vec<CallRecord> = self
            .call_assignments
            .iter()
            .filter(|c| &c.resident_id == resident)
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.date.cmp(&a.date));
        calls.truncate(limit);
        Ok(calls)
    }

    fn holidays(&self) -> Result<HashSet<NaiveDate>> {
        Ok(self.holidays.iter().copied().collect())
    }

    fn leave_requests(&self) -> Result<Vec<LeaveRequest>> {
        Ok(self.leave_requests.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rota_common::LeaveStatus;

    const STORE: &str = r#"{
        "residents": [
            {"id": "r1", "name": "Dr. Ames", "pgy_level": 2},
            {"id": "r2", "name": "Dr. Brook", "active": false}
        ],
        "call_assignments": [
            {"resident_id": "r1", "date": "2026-01-03", "target": 1.0},
            {"resident_id": "r1", "date": "2026-01-09", "outcome": 0.0},
            {"resident_id": "r1", "date": "2026-01-06", "outcome": 1.0},
            {"resident_id": "r2", "date": "2026-01-04", "outcome": 1.0}
        ],
        "holidays": ["2026-01-01"]
    }"#;

    #[test]
    fn filters_inactive_residents() {
        let store = InMemoryDataSource::parse_json(STORE).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let active = store.active_residents(day).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "r1");
    }

    #[test]
    fn history_is_most_recent_first_and_bounded() {
        let store = InMemoryDataSource::parse_json(STORE).unwrap();
        let history = store.call_history(&ResidentId::from("r1"), 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date.to_string(), "2026-01-09");
        assert_eq!(history[1].date.to_string(), "2026-01-06");
    }

    #[test]
    fn unknown_leave_status_parses_and_never_conflicts() {
        let store = InMemoryDataSource::parse_json(
            r#"{
                "residents": [{"id": "r1", "name": "Dr. Ames"}],
                "leave_requests": [
                    {"resident_id": "r1", "status": "Rejected",
                     "start_date": "2026-04-06", "end_date": "2026-04-10"},
                    {"resident_id": "r1", "status": "approved",
                     "start_date": "2026-05-04", "end_date": "2026-05-05"}
                ]
            }"#,
        )
        .unwrap();
        let leave = store.leave_requests().unwrap();
        assert_eq!(leave[0].status, LeaveStatus::Other);
        assert!(!leave[0].conflicts_on(NaiveDate::from_ymd_opt(2026, 4, 7).unwrap()));
        assert_eq!(leave[1].status, LeaveStatus::Approved);
        assert!(leave[1].conflicts_on(NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()));
    }

    #[test]
    fn missing_collections_default_empty() {
        let store = InMemoryDataSource::parse_json(STORE).unwrap();
        assert!(store.leave_requests().unwrap().is_empty());
        assert_eq!(store.holidays().unwrap().len(), 1);
    }
}
