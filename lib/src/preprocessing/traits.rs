//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; ready for inference and serialization.
//!
//! Both operate on column blocks: an `(n_samples, n_columns)` array of raw
//! values (`String` labels for encoders, `f64` for scalers). A fitted
//! transformer also encodes a single row in place, which is the per-request
//! path used by the prediction pipeline.

use crate::error::{PipelineError, Result};
use crate::serialization::SerializableParams;
use ndarray::Array2;
use std::path::Path;

/// Trait for unfitted transformers with hyperparameters.
///
/// # Example
/// ```ignore
/// use crimecast::preprocessing::{Transformer, StandardScaler};
///
/// let scaler = StandardScaler::new();
/// let fitted = scaler.fit(&data)?;
/// let transformed = fitted.transform(&new_data)?;
/// ```
pub trait Transformer: Clone {
    /// Raw value type of one cell.
    type Value: Clone;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Value = Self::Value, Params = Self::Params>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if:
    /// - Data is empty
    /// - Data contains invalid values (NaN, Inf)
    fn fit(&self, data: &Array2<Self::Value>) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the data in one step.
    fn fit_transform(&self, data: &Array2<Self::Value>) -> Result<Array2<f64>> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` reproduce the same transform.
/// - Output columns always come in the same order for a given fitted state.
pub trait FittedTransformer: Clone {
    /// Raw value type of one cell.
    type Value: Clone;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Encode one row of `n_features_in()` values, appending
    /// `n_features_out()` numbers to `out`.
    fn transform_row(&self, row: &[Self::Value], out: &mut Vec<f64>) -> Result<()>;

    /// Transform a block of rows.
    fn transform(&self, data: &Array2<Self::Value>) -> Result<Array2<f64>> {
        let (rows, cols) = data.dim();
        if cols != self.n_features_in() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features_in(),
                got: cols,
            });
        }

        let width = self.n_features_out();
        let mut out = Vec::with_capacity(rows * width);
        for row in data.rows() {
            self.transform_row(&row.to_vec(), &mut out)?;
        }

        Array2::from_shape_vec((rows, width), out)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }

    /// Reverse the transformation.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if the data cannot be mapped back.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<Self::Value>>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters, validating them.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Number of input columns seen during fit.
    fn n_features_in(&self) -> usize;

    /// Number of encoded output columns.
    fn n_features_out(&self) -> usize;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let params = self.extract_params();
        let bytes = params
            .to_bytes()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}

/// Check the width of a single row against the fitted width.
pub(crate) fn check_row_width(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(PipelineError::DimensionMismatch { expected, got });
    }
    Ok(())
}
