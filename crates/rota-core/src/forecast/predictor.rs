//! Rolling-horizon call-load forecasting.

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use rota_common::{Error, Resident, Result};
use rota_config::ForecastConfig;
use rota_math::{ForestConfig, RandomForestRegressor, StandardScaler};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::dataset::TrainingTable;
use super::model_store::{ArtifactInfo, ModelStore, TrainedModel};
use super::{
    confidence_score, is_recommended, DailyForecast, ForecastAssignment, ForecastWindow,
    TrainingSummary,
};
use crate::features::{
    extract_forecast_features, CalendarContext, ForecastDefaults, FORECAST_FEATURE_NAMES,
};
use crate::logging::{event_names, Stage};
use crate::math_error;
use crate::source::ScheduleDataSource;

/// Model state owned by one forecaster.
#[derive(Debug, Clone)]
pub enum ForecastModel {
    Trained {
        model: Box<TrainedModel>,
        info: Option<ArtifactInfo>,
    },
    /// Fresh model with fixed hyperparameters; must be trained before use.
    Untrained(ForestConfig),
}

/// Predicts per-resident call probability over a horizon.
///
/// The forecaster is the single owner of its model; training takes `&mut self`.
pub struct LoadForecaster<S> {
    source: S,
    config: ForecastConfig,
    store: ModelStore,
    model: ForecastModel,
}

impl<S: ScheduleDataSource> LoadForecaster<S> {
    /// Load the artifact at `config.model_path`, falling back to an untrained
    /// model when it is missing or corrupt.
    pub fn open(source: S, config: ForecastConfig) -> Self {
        let store = ModelStore::new(&config.model_path);
        let model = match store.load_or_fallback() {
            Some((model, info)) => ForecastModel::Trained {
                model: Box::new(model),
                info: Some(info),
            },
            None => ForecastModel::Untrained(forest_config(&config)),
        };
        Self {
            source,
            config,
            store,
            model,
        }
    }

    /// Start untrained without touching the artifact.
    pub fn untrained(source: S, config: ForecastConfig) -> Self {
        let store = ModelStore::new(&config.model_path);
        let model = ForecastModel::Untrained(forest_config(&config));
        Self {
            source,
            config,
            store,
            model,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.model, ForecastModel::Trained { .. })
    }

    pub fn model(&self) -> &ForecastModel {
        &self.model
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn predict_call_load(&self, start: NaiveDate, days: u32) -> Result<ForecastWindow> {
        self.predict_call_load_cancellable(start, days, &AtomicBool::new(false))
    }

    /// Forecast `days` days from `start`. `cancel` is checked between days;
    /// a cancelled window holds only fully computed days and is marked
    /// incomplete.
    pub fn predict_call_load_cancellable(
        &self,
        start: NaiveDate,
        days: u32,
        cancel: &AtomicBool,
    ) -> Result<ForecastWindow> {
        if days == 0 {
            return Err(Error::InvalidHorizon);
        }
        let period_end = start
            .checked_add_days(Days::new(u64::from(days) - 1))
            .ok_or(Error::InvalidHorizon)?;
        let model = self.trained_model()?;

        info!(
            event = event_names::FORECAST_STARTED,
            stage = %Stage::Forecast,
            start = %start,
            days,
            "forecasting call load"
        );

        let holidays = self.source.holidays()?;
        let leave_requests = self.source.leave_requests()?;
        let calendar = CalendarContext {
            holidays: &holidays,
            leave_requests: &leave_requests,
        };
        let defaults = ForecastDefaults::from(&self.config);

        let mut predictions = Vec::with_capacity(days as usize);
        let mut complete = true;
        for date in start.iter_days().take(days as usize) {
            if cancel.load(Ordering::Relaxed) {
                complete = false;
                info!(
                    event = event_names::FORECAST_CANCELLED,
                    stage = %Stage::Forecast,
                    completed_days = predictions.len(),
                    "forecast cancelled between days"
                );
                break;
            }
            let day = self.forecast_day(date, model, &calendar, &defaults)?;
            debug!(
                event = event_names::FORECAST_DAY_DONE,
                stage = %Stage::Forecast,
                date = %date,
                residents = day.assignments.len(),
                recommended = day.total_coverage_needed,
                "forecast day complete"
            );
            predictions.push(day);
        }

        let confidence = confidence_score(
            &predictions,
            self.config.confidence_bonus,
            self.config.confidence_cap,
        );
        info!(
            event = event_names::FORECAST_FINISHED,
            stage = %Stage::Forecast,
            days = predictions.len(),
            confidence,
            "forecast window complete"
        );
        Ok(ForecastWindow {
            period_start: start,
            period_end,
            predictions,
            confidence,
            complete,
        })
    }

    fn forecast_day(
        &self,
        date: NaiveDate,
        model: &TrainedModel,
        calendar: &CalendarContext<'_>,
        defaults: &ForecastDefaults,
    ) -> Result<DailyForecast> {
        let residents = self.source.active_residents(date)?;
        let mut assignments = residents
            .par_iter()
            .map(|resident| self.assign(date, resident, model, calendar, defaults))
            .collect::<Result<Vec<_>>>()?;
        assignments.sort_by(|a, b| b.call_probability.total_cmp(&a.call_probability));

        Ok(DailyForecast {
            date,
            total_coverage_needed: assignments.iter().filter(|a| a.recommended).count(),
            assignments,
        })
    }

    fn assign(
        &self,
        date: NaiveDate,
        resident: &Resident,
        model: &TrainedModel,
        calendar: &CalendarContext<'_>,
        defaults: &ForecastDefaults,
    ) -> Result<ForecastAssignment> {
        let history = self
            .source
            .call_history(&resident.id, self.config.history_limit)?;
        let features = extract_forecast_features(date, resident, &history, calendar, defaults);
        let call_probability = model.predict_probability(&features.to_array())?;
        Ok(ForecastAssignment {
            date,
            resident_id: resident.id.clone(),
            resident_name: resident.name.clone(),
            call_probability,
            recommended: is_recommended(call_probability, self.config.recommend_threshold),
        })
    }

    fn trained_model(&self) -> Result<&TrainedModel> {
        let ForecastModel::Trained { model, .. } = &self.model else {
            return Err(Error::ModelNotTrained);
        };
        if model.feature_names != FORECAST_FEATURE_NAMES {
            return Err(Error::FeatureMismatch {
                expected: FORECAST_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                actual: model.feature_names.clone(),
            });
        }
        Ok(model)
    }

    /// Fit on a labelled table, persist the artifact and swap the model in.
    ///
    /// Feature columns are matched to the forecast columns by name, in any
    /// order. A table with a different feature set is rejected before the
    /// artifact is touched.
    pub fn train(&mut self, table: &TrainingTable) -> Result<TrainingSummary> {
        info!(
            event = event_names::TRAIN_STARTED,
            stage = %Stage::Train,
            rows = table.rows.len(),
            "training forecast model"
        );
        let data = table
            .split_target(&self.config.target_column)?
            .align_features(&FORECAST_FEATURE_NAMES)?;
        let (scaler, scaled) = StandardScaler::fit_transform(&data.x).map_err(math_error)?;
        let forest = RandomForestRegressor::fit(&scaled, &data.y, &forest_config(&self.config))
            .map_err(math_error)?;
        let accuracy = forest.score(&scaled, &data.y).map_err(math_error)?;

        let model = TrainedModel {
            feature_names: data.feature_names.clone(),
            target_column: self.config.target_column.clone(),
            scaler,
            forest,
        };
        let info = self.store.save(&model, accuracy)?;
        self.model = ForecastModel::Trained {
            model: Box::new(model),
            info: Some(info),
        };

        info!(
            event = event_names::TRAIN_FINISHED,
            stage = %Stage::Train,
            accuracy,
            features = data.feature_names.len(),
            "forecast model trained"
        );
        Ok(TrainingSummary {
            status: "trained".to_string(),
            accuracy,
            features: data.feature_names,
        })
    }
}

fn forest_config(config: &ForecastConfig) -> ForestConfig {
    ForestConfig {
        n_estimators: config.n_estimators,
        max_depth: Some(config.max_depth),
        seed: config.seed,
        ..ForestConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryDataSource;
    use tempfile::tempdir;

    fn store() -> InMemoryDataSource {
        InMemoryDataSource::parse_json(
            r#"{
                "residents": [
                    {"id": "r1", "name": "Dr. Ames", "pgy_level": 1},
                    {"id": "r2", "name": "Dr. Brook", "pgy_level": 3}
                ]
            }"#,
        )
        .unwrap()
    }

    fn config(dir: &std::path::Path) -> ForecastConfig {
        ForecastConfig {
            n_estimators: 10,
            model_path: dir.join("model.json"),
            ..Default::default()
        }
    }

    /// Target depends on PGY level only.
    fn table() -> TrainingTable {
        let mut columns: Vec<String> =
            FORECAST_FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        columns.push("target".to_string());
        let rows = (0..40)
            .map(|i| {
                let pgy = (i % 4 + 1) as f64;
                let target = if pgy >= 3.0 { 1.0 } else { 0.0 };
                vec![
                    (i % 7) as f64,
                    (i % 12 + 1) as f64,
                    if i % 7 >= 5 { 1.0 } else { 0.0 },
                    0.0,
                    (i % 9) as f64,
                    (i % 5) as f64,
                    pgy,
                    2.0,
                    10.0,
                    0.0,
                    target,
                ]
            })
            .collect();
        TrainingTable { columns, rows }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    #[test]
    fn untrained_model_fails_fast() {
        let dir = tempdir().unwrap();
        let forecaster = LoadForecaster::open(store(), config(dir.path()));
        assert!(!forecaster.is_trained());
        assert!(matches!(
            forecaster.predict_call_load(day(1), 3),
            Err(Error::ModelNotTrained)
        ));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let dir = tempdir().unwrap();
        let forecaster = LoadForecaster::untrained(store(), config(dir.path()));
        assert!(matches!(
            forecaster.predict_call_load(day(1), 0),
            Err(Error::InvalidHorizon)
        ));
    }

    #[test]
    fn train_then_predict_round_trip() {
        let dir = tempdir().unwrap();
        let mut forecaster = LoadForecaster::open(store(), config(dir.path()));
        let summary = forecaster.train(&table()).unwrap();
        assert_eq!(summary.status, "trained");
        assert_eq!(summary.features.len(), 10);
        assert!(summary.accuracy > 0.9);

        let window = forecaster.predict_call_load(day(1), 5).unwrap();
        assert!(window.complete);
        assert_eq!(window.predictions.len(), 5);
        assert_eq!(window.period_end, day(5));
        for daily in &window.predictions {
            assert_eq!(daily.assignments.len(), 2);
            assert!(daily.assignments[0].call_probability >= daily.assignments[1].call_probability);
            // PGY-3 resident is the likely one
            assert_eq!(daily.assignments[0].resident_id.as_str(), "r2");
        }

        let reopened = LoadForecaster::open(store(), config(dir.path()));
        assert!(reopened.is_trained());
    }

    #[test]
    fn column_order_does_not_matter() {
        let dir = tempdir().unwrap();
        let mut reversed = table();
        reversed.columns.reverse();
        for row in &mut reversed.rows {
            row.reverse();
        }

        let mut forecaster = LoadForecaster::untrained(store(), config(dir.path()));
        let summary = forecaster.train(&reversed).unwrap();
        assert_eq!(summary.features, FORECAST_FEATURE_NAMES);

        let window = forecaster.predict_call_load(day(1), 2).unwrap();
        assert_eq!(window.predictions.len(), 2);
        for daily in &window.predictions {
            assert_eq!(daily.assignments[0].resident_id.as_str(), "r2");
        }
        assert!(LoadForecaster::open(store(), config(dir.path()))
            .predict_call_load(day(1), 1)
            .is_ok());
    }

    #[test]
    fn foreign_feature_set_keeps_previous_artifact() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        let mut forecaster = LoadForecaster::untrained(store(), cfg.clone());
        forecaster.train(&table()).unwrap();
        let before = std::fs::read_to_string(&cfg.model_path).unwrap();

        let foreign = TrainingTable {
            columns: vec!["x".into(), "target".into()],
            rows: (0..10).map(|i| vec![i as f64, (i % 2) as f64]).collect(),
        };
        match forecaster.train(&foreign) {
            Err(Error::FeatureMismatch { expected, actual }) => {
                assert_eq!(expected, FORECAST_FEATURE_NAMES);
                assert_eq!(actual, vec!["x"]);
            }
            other => panic!("expected FeatureMismatch, got {:?}", other),
        }

        assert_eq!(std::fs::read_to_string(&cfg.model_path).unwrap(), before);
        assert!(forecaster.predict_call_load(day(1), 1).is_ok());
        assert!(LoadForecaster::open(store(), cfg)
            .predict_call_load(day(1), 1)
            .is_ok());
    }

    #[test]
    fn cancellation_keeps_completed_days() {
        let dir = tempdir().unwrap();
        let mut forecaster = LoadForecaster::open(store(), config(dir.path()));
        forecaster.train(&table()).unwrap();
        let cancel = AtomicBool::new(true);
        let window = forecaster
            .predict_call_load_cancellable(day(1), 7, &cancel)
            .unwrap();
        assert!(!window.complete);
        assert!(window.predictions.is_empty());
        assert_eq!(window.confidence, 0.0);
    }
}
