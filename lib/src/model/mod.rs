//! Fitted models for inference.
//!
//! Models here are produced by an external training step and are immutable
//! once built: they only predict, and can be saved and loaded.

pub mod coefficients;
pub mod linear;

pub use coefficients::CoefficientFile;
pub use linear::{LinearModel, SerializableLinearParams};

use crate::error::{PipelineError, Result};
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2};
use std::path::Path;

/// A fitted model that maps encoded feature vectors to predictions.
pub trait InferenceModel: Sized {
    /// Serializable representation of the model parameters.
    type ParamsRepr: SerializableParams;

    /// Number of features the model expects.
    fn n_features(&self) -> usize;

    /// Predict on a single encoded vector.
    ///
    /// # Errors
    /// [`PipelineError::DimensionMismatch`] if the vector length differs from
    /// [`InferenceModel::n_features`].
    fn predict(&self, input: &Array1<f64>) -> Result<f64>;

    /// Predict on every row of an `(n_samples, n_features)` matrix.
    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>>;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>;

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let params = Self::ParamsRepr::from_bytes(&bytes)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}
