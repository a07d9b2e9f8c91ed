//! Labelled training tables.

use chrono::Datelike;
use rota_common::{Error, Resident, Result};
use rota_config::ForecastConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::features::{
    extract_forecast_features, CalendarContext, ForecastDefaults, FORECAST_FEATURE_NAMES,
};
use crate::source::{InMemoryDataSource, ScheduleDataSource};

/// Column-named numeric table; one column is the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Feature matrix and target split out of a [`TrainingTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledData {
    pub feature_names: Vec<String>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl TrainingTable {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Split off `target`, keeping the remaining columns in order.
    pub fn split_target(&self, target: &str) -> Result<LabelledData> {
        let target_idx = self
            .columns
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| Error::MissingTargetColumn {
                column: target.to_string(),
            })?;
        if self.rows.is_empty() {
            return Err(Error::InvalidDataset("dataset has no rows".to_string()));
        }
        if self.columns.len() < 2 {
            return Err(Error::InvalidDataset(
                "dataset needs at least one feature column".to_string(),
            ));
        }

        let mut x = Vec::with_capacity(self.rows.len());
        let mut y = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(Error::InvalidDataset(format!(
                    "row {} has {} values, expected {}",
                    r,
                    row.len(),
                    self.columns.len()
                )));
            }
            y.push(row[target_idx]);
            x.push(
                row.iter()
                    .enumerate()
                    .filter(|(c, _)| *c != target_idx)
                    .map(|(_, v)| *v)
                    .collect(),
            );
        }

        let feature_names = self
            .columns
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != target_idx)
            .map(|(_, name)| name.clone())
            .collect();
        Ok(LabelledData {
            feature_names,
            x,
            y,
        })
    }
}

impl LabelledData {
    /// Reorder feature columns by name into `names`.
    ///
    /// The table must carry exactly the named features; a missing or
    /// extra column is a [`Error::FeatureMismatch`].
    pub fn align_features(self, names: &[&str]) -> Result<LabelledData> {
        let mismatch = || Error::FeatureMismatch {
            expected: names.iter().map(|s| s.to_string()).collect(),
            actual: self.feature_names.clone(),
        };
        if self.feature_names.len() != names.len() {
            return Err(mismatch());
        }
        let order = names
            .iter()
            .map(|name| self.feature_names.iter().position(|c| c == name))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(mismatch)?;

        let x = self
            .x
            .iter()
            .map(|row| order.iter().map(|&i| row[i]).collect())
            .collect();
        Ok(LabelledData {
            feature_names: names.iter().map(|s| s.to_string()).collect(),
            x,
            y: self.y,
        })
    }
}

/// Build a training table from a store export: one row per historical call,
/// featurised with only the calls that preceded it and labelled with its
/// outcome.
pub fn training_table_from_store(
    store: &InMemoryDataSource,
    config: &ForecastConfig,
) -> Result<TrainingTable> {
    let residents: HashMap<&str, &Resident> = store
        .residents
        .iter()
        .map(|r| (r.id.as_str(), r))
        .collect();
    let holidays = store.holidays()?;
    let calendar = CalendarContext {
        holidays: &holidays,
        leave_requests: &store.leave_requests,
    };
    let defaults = ForecastDefaults::from(config);

    let mut columns: Vec<String> = FORECAST_FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    columns.push(config.target_column.clone());

    let mut rows = Vec::with_capacity(store.all_calls().len());
    for call in store.all_calls() {
        let Some(resident) = residents.get(call.resident_id.as_str()) else {
            continue;
        };
        let mut prior: Vec<_> = store
            .all_calls()
            .iter()
            .filter(|c| c.resident_id == call.resident_id && c.date < call.date)
            .cloned()
            .collect();
        prior.sort_by(|a, b| b.date.cmp(&a.date));
        prior.truncate(config.history_limit);

        let as_of = Resident {
            last_call_date: prior.first().map(|c| c.date),
            monthly_calls: Some(
                prior
                    .iter()
                    .filter(|c| {
                        (c.date.year(), c.date.month()) == (call.date.year(), call.date.month())
                    })
                    .count() as u32,
            ),
            ..(*resident).clone()
        };
        let features =
            extract_forecast_features(call.date, &as_of, &prior, &calendar, &defaults);
        let mut row = features.to_vec();
        row.push(call.outcome);
        rows.push(row);
    }

    Ok(TrainingTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TrainingTable {
        TrainingTable {
            columns: vec!["a".into(), "target".into(), "b".into()],
            rows: vec![vec![1.0, 0.0, 2.0], vec![3.0, 1.0, 4.0]],
        }
    }

    #[test]
    fn target_is_removed_and_order_kept() {
        let data = table().split_target("target").unwrap();
        assert_eq!(data.feature_names, vec!["a", "b"]);
        assert_eq!(data.x, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(data.y, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_target_is_fatal() {
        let err = table().split_target("label").unwrap_err();
        assert!(matches!(err, Error::MissingTargetColumn { column } if column == "label"));
    }

    #[test]
    fn features_are_aligned_by_name() {
        let data = table()
            .split_target("target")
            .unwrap()
            .align_features(&["b", "a"])
            .unwrap();
        assert_eq!(data.feature_names, vec!["b", "a"]);
        assert_eq!(data.x, vec![vec![2.0, 1.0], vec![4.0, 3.0]]);
        assert_eq!(data.y, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_or_extra_features_are_a_mismatch() {
        let data = table().split_target("target").unwrap();
        let err = data.clone().align_features(&["a", "c"]).unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureMismatch { expected, actual }
                if expected == vec!["a", "c"] && actual == vec!["a", "b"]
        ));
        assert!(matches!(
            data.align_features(&["a"]),
            Err(Error::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut t = table();
        t.rows.push(vec![1.0]);
        assert!(matches!(t.split_target("target"), Err(Error::InvalidDataset(_))));
    }

    #[test]
    fn store_rows_use_only_prior_calls() {
        let store = InMemoryDataSource::parse_json(
            r#"{
                "residents": [{"id": "r1", "name": "Dr. Ames", "pgy_level": 2}],
                "call_assignments": [
                    {"resident_id": "r1", "date": "2026-02-10", "outcome": 1.0},
                    {"resident_id": "r1", "date": "2026-02-03", "outcome": 0.0},
                    {"resident_id": "ghost", "date": "2026-02-04", "outcome": 1.0}
                ]
            }"#,
        )
        .unwrap();
        let table = training_table_from_store(&store, &ForecastConfig::default()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns.last().map(String::as_str), Some("target"));

        let days_idx = table
            .columns
            .iter()
            .position(|c| c == "days_since_last_call")
            .unwrap();
        let month_calls_idx = table
            .columns
            .iter()
            .position(|c| c == "total_calls_this_month")
            .unwrap();
        // 2026-02-10 follows the 02-03 call
        assert_eq!(table.rows[0][days_idx], 7.0);
        assert_eq!(table.rows[0][month_calls_idx], 1.0);
        // first call has no history
        assert_eq!(table.rows[1][days_idx], 30.0);
        assert_eq!(table.rows[1][10], 0.0);
    }
}
