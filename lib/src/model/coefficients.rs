//! Import of externally estimated linear coefficients.
//!
//! The training step exports a JSON document:
//!
//! ```json
//! {
//!   "intercept": 4.21,
//!   "coefficients": [0.12, -0.03, 0.88],
//!   "feature_names": ["state_CA", "state_OH", "year"]
//! }
//! ```
//!
//! `feature_names` is optional; when present it pins the column order the
//! coefficients were estimated against.

use crate::error::{PipelineError, Result};
use crate::model::LinearModel;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoefficientFile {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl CoefficientFile {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::serialization::read_json(path)
    }

    /// Check the coefficients against the encoded column layout.
    ///
    /// # Errors
    /// - [`PipelineError::DimensionMismatch`] if the counts differ
    /// - [`PipelineError::FeatureOrderMismatch`] at the first name that differs
    pub fn check_layout(&self, expected: &[String]) -> Result<()> {
        if self.coefficients.len() != expected.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: expected.len(),
                got: self.coefficients.len(),
            });
        }

        if let Some(names) = &self.feature_names {
            if names.len() != expected.len() {
                return Err(PipelineError::DimensionMismatch {
                    expected: expected.len(),
                    got: names.len(),
                });
            }
            if let Some((position, (want, got))) = expected
                .iter()
                .zip(names)
                .enumerate()
                .find(|(_, (want, got))| want != got)
            {
                return Err(PipelineError::FeatureOrderMismatch {
                    position,
                    expected: want.clone(),
                    got: got.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn into_model(self) -> Result<LinearModel> {
        LinearModel::new(Array1::from(self.coefficients), self.intercept)
    }
}
