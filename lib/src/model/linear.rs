//! Linear regression model for inference.
//!
//! A [`LinearModel`] is the pair `(weights, bias)` and predicts
//! `y = w^T x + b`. It is built from externally estimated coefficients and
//! never mutated afterwards.

use crate::error::{PipelineError, Result};
use crate::model::InferenceModel;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Serializable representation of linear model parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializableLinearParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// Fitted linear model: `y = w^T x + b`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearModel {
    /// Build a model from coefficients and intercept.
    ///
    /// # Errors
    /// [`PipelineError::InvalidParameter`] if there are no weights or any
    /// parameter is not finite.
    pub fn new(weights: Array1<f64>, bias: f64) -> Result<Self> {
        if weights.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "linear model needs at least one coefficient".to_string(),
            ));
        }
        if let Some((i, w)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite()) {
            return Err(PipelineError::InvalidParameter(format!(
                "coefficient {} is not finite: {}",
                i, w
            )));
        }
        if !bias.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "intercept is not finite: {}",
                bias
            )));
        }
        Ok(Self { weights, bias })
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl InferenceModel for LinearModel {
    type ParamsRepr = SerializableLinearParams;

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, input: &Array1<f64>) -> Result<f64> {
        if input.len() != self.weights.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.weights.len(),
                got: input.len(),
            });
        }
        Ok(self.weights.dot(input) + self.bias)
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>> {
        if input.ncols() != self.weights.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.weights.len(),
                got: input.ncols(),
            });
        }
        Ok(input.dot(&self.weights) + self.bias)
    }

    fn extract_params(&self) -> SerializableLinearParams {
        SerializableLinearParams {
            weights: self.weights.to_vec(),
            bias: self.bias,
        }
    }

    fn from_params(params: SerializableLinearParams) -> Result<Self> {
        Self::new(Array1::from(params.weights), params.bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_model_predict() {
        let model = LinearModel::new(array![3.0], 1.0).unwrap();
        assert_eq!(model.predict(&array![2.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_linear_model_predict_with_bias_only_input() {
        let model = LinearModel::new(array![0.5, -2.0, 4.0], 0.25).unwrap();
        assert_eq!(model.predict(&array![0.0, 0.0, 0.0]).unwrap(), 0.25);
    }

    #[test]
    fn test_linear_model_predict_is_deterministic() {
        let model = LinearModel::new(array![0.1, 0.2, 0.3], -0.7).unwrap();
        let x = array![1.5, -2.5, 3.25];
        let first = model.predict(&x).unwrap();
        for _ in 0..10 {
            assert_eq!(model.predict(&x).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_linear_model_dimension_mismatch() {
        let model = LinearModel::new(array![1.0, 2.0], 0.0).unwrap();
        assert!(matches!(
            model.predict(&array![1.0, 2.0, 3.0]),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
        assert!(matches!(
            model.predict_batch(&Array2::zeros((4, 1))),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_linear_model_predict_batch() {
        // y = 2*x0 - x1 + 1
        let model = LinearModel::new(array![2.0, -1.0], 1.0).unwrap();
        let x = array![[0.0, 0.0], [1.0, 0.0], [1.0, 3.0]];
        let y = model.predict_batch(&x).unwrap();
        assert_eq!(y.to_vec(), vec![1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_linear_model_rejects_non_finite() {
        assert!(LinearModel::new(array![f64::NAN], 0.0).is_err());
        assert!(LinearModel::new(array![1.0], f64::INFINITY).is_err());
        assert!(LinearModel::new(Array1::zeros(0), 0.0).is_err());
    }

    #[test]
    fn test_linear_model_save_load_file() {
        let model = LinearModel::new(array![0.5, -1.5], 2.0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.bin");
        model.save_to_file(&path).unwrap();

        let loaded = LinearModel::load_from_file(&path).unwrap();
        assert_eq!(loaded, model);
    }
}
