//! Pipeline stages and stable event names.

use serde::{Deserialize, Serialize};

/// Processing stages in the schedule pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Feature extraction.
    Extract,
    /// Anomaly scoring and classification.
    Detect,
    /// Call-load forecasting.
    Forecast,
    /// Forecast model training.
    Train,
    /// Recommendation synthesis.
    Recommend,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Extract => "extract",
            Stage::Detect => "detect",
            Stage::Forecast => "forecast",
            Stage::Train => "train",
            Stage::Recommend => "recommend",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Detect stage
    pub const DETECT_STARTED: &str = "detect.started";
    pub const DETECT_FINISHED: &str = "detect.finished";

    // Forecast stage
    pub const FORECAST_STARTED: &str = "forecast.started";
    pub const FORECAST_DAY_DONE: &str = "forecast.day_done";
    pub const FORECAST_CANCELLED: &str = "forecast.cancelled";
    pub const FORECAST_FINISHED: &str = "forecast.finished";

    // Train stage / model lifecycle
    pub const TRAIN_STARTED: &str = "train.started";
    pub const TRAIN_FINISHED: &str = "train.finished";
    pub const MODEL_LOADED: &str = "model.loaded";
    pub const MODEL_FALLBACK_USED: &str = "model.fallback_used";
    pub const MODEL_SAVED: &str = "model.saved";

    // Recommend stage
    pub const RECOMMEND_STARTED: &str = "recommend.started";
    pub const RECOMMEND_FINISHED: &str = "recommend.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
}

/// Correlation context attached to every structured event of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Detect).unwrap(), "\"detect\"");
        assert_eq!(Stage::Forecast.to_string(), "forecast");
    }

    #[test]
    fn test_event_names_are_stage_prefixed() {
        assert!(event_names::DETECT_FINISHED.starts_with("detect."));
        assert!(event_names::FORECAST_DAY_DONE.starts_with("forecast."));
        assert!(event_names::RECOMMEND_FINISHED.starts_with("recommend."));
    }
}
