//! Per-column standardisation (zero mean, unit variance).

use serde::{Deserialize, Serialize};

use super::{check_matrix, MathError};

/// Column-wise centre/scale transform.
///
/// Columns with zero variance keep a scale of 1.0 so they map to 0.0
/// instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, MathError> {
        let width = check_matrix(rows)?;
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|acc| {
                let std = (acc / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardise a single row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, MathError> {
        if row.len() != self.n_features() {
            return Err(MathError::DimensionMismatch {
                row: 0,
                expected: self.n_features(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, MathError> {
        rows.iter()
            .enumerate()
            .map(|(r, row)| {
                self.transform_row(row).map_err(|err| match err {
                    MathError::DimensionMismatch {
                        expected, actual, ..
                    } => MathError::DimensionMismatch {
                        row: r,
                        expected,
                        actual,
                    },
                    other => other,
                })
            })
            .collect()
    }

    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), MathError> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }
}
