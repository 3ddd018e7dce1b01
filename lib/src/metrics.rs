//! Regression metrics.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: y_true.len(),
            got: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::EmptyData(
            "metrics need at least one sample".to_string(),
        ));
    }
    Ok(())
}

/// Mean Squared Error: `mean((y_true - y_pred)^2)`.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let sum_sq: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();
    Ok(sum_sq / y_true.len() as f64)
}

/// Coefficient of determination: `1 - SS_res / SS_tot`.
///
/// For a constant target (`SS_tot = 0`) the score is 1.0 when every
/// prediction is exact and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|&t| (t - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Evaluation summary of a pipeline on one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub r2: f64,
    pub mse: f64,
    pub n_samples: usize,
}

impl RegressionReport {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        Ok(Self {
            r2: r2_score(y_true, y_pred)?,
            mse: mean_squared_error(y_true, y_pred)?,
            n_samples: y_true.len(),
        })
    }
}
