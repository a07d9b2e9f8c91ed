//! Core math modules.

pub mod forest;
pub mod isolation;
pub mod scaler;
pub mod stats;

use thiserror::Error;

/// Errors raised by fitting and inference routines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MathError {
    #[error("cannot fit on an empty sample")]
    EmptyInput,
    #[error("row {row} has {actual} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("feature matrix has {rows} rows but target has {targets} values")]
    TargetLengthMismatch { rows: usize, targets: usize },
    #[error("non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
}

/// Check that every row has `expected` finite columns.
pub(crate) fn check_matrix(rows: &[Vec<f64>]) -> Result<usize, MathError> {
    let first = rows.first().ok_or(MathError::EmptyInput)?;
    let width = first.len();
    for (r, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(MathError::DimensionMismatch {
                row: r,
                expected: width,
                actual: row.len(),
            });
        }
        if let Some(c) = row.iter().position(|v| !v.is_finite()) {
            return Err(MathError::NonFinite { row: r, column: c });
        }
    }
    Ok(width)
}
