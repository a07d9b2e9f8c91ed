//! Per-batch outlier scoring.
//!
//! Normalisation and the isolation forest are both fit on the batch being
//! scored; nothing carries over between calls.

use rota_config::AnomalyConfig;
use rota_math::{IsolationForest, IsolationForestConfig, StandardScaler};

use crate::features::ScheduleFeatures;
use crate::math_error;

/// Outlier verdict for one entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryScore {
    pub anomalous: bool,
    /// More negative is more anomalous.
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    forest: IsolationForestConfig,
}

impl AnomalyScorer {
    pub fn new(config: &AnomalyConfig) -> Self {
        Self {
            forest: IsolationForestConfig {
                n_estimators: config.n_estimators,
                max_samples: config.max_samples,
                contamination: config.contamination,
                seed: config.seed,
            },
        }
    }

    /// Score every entry of the batch. An empty batch scores to an empty list.
    pub fn score(&self, batch: &[ScheduleFeatures]) -> rota_common::Result<Vec<EntryScore>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Vec<f64>> = batch.iter().map(ScheduleFeatures::to_vec).collect();
        let (_, scaled) = StandardScaler::fit_transform(&rows).map_err(math_error)?;
        let results = IsolationForest::fit_score(&scaled, &self.forest).map_err(math_error)?;
        Ok(results
            .into_iter()
            .map(|(anomalous, score)| EntryScore { anomalous, score })
            .collect())
    }
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new(&AnomalyConfig::default())
    }
}
