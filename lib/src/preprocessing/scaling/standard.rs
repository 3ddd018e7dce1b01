//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation (ddof = 0). A constant column has `s = 0`; it is stored
//! as `s = 1` so the column is only centered.
//!
//! # Example
//! ```ignore
//! use crimecast::preprocessing::{Transformer, StandardScaler};
//!
//! let fitted = StandardScaler::new().fit(&data)?;
//! let scaled = fitted.transform(&data)?;
//!
//! // Later, for inference:
//! let loaded = FittedStandardScaler::load_from_file("scaler.bin")?;
//! let new_scaled = loaded.transform(&new_data)?;
//! ```

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::resolve_feature_names;
use crate::preprocessing::traits::{check_row_width, FittedTransformer, Transformer};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for StandardScaler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If True, center the data before scaling.
    pub with_mean: bool,
    /// If True, scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Configuration options.
    pub config: StandardScalerConfig,
    /// Input column names.
    pub feature_names: Vec<String>,
    /// Mean of each feature (zeros if with_mean=false).
    pub mean: Vec<f64>,
    /// Standard deviation of each feature (ones if with_std=false).
    pub std: Vec<f64>,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Create a new StandardScaler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }

    /// Name the input columns; used in error messages and output names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
}

impl Transformer for StandardScaler {
    type Value = f64;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler> {
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(PipelineError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let feature_names = resolve_feature_names(&self.feature_names, cols)?;
        if let Some(((row, col), v)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PipelineError::InvalidValue {
                feature: feature_names[col].clone(),
                message: format!("non-finite value {} at row {}", v, row),
            });
        }

        let mean = if self.config.with_mean {
            data.mean_axis(Axis(0))
                .map(|m| m.to_vec())
                .unwrap_or_else(|| vec![0.0; cols])
        } else {
            vec![0.0; cols]
        };

        let std: Vec<f64> = if self.config.with_std {
            // population std (ddof=0), zero for constant columns
            data.std_axis(Axis(0), 0.0)
                .iter()
                .map(|&s| if s == 0.0 { 1.0 } else { s })
                .collect()
        } else {
            vec![1.0; cols]
        };

        tracing::debug!(features = cols, rows, "fitted standard scaler");

        FittedStandardScaler::from_params(StandardScalerParams {
            config: self.config.clone(),
            feature_names,
            mean,
            std,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    config: StandardScalerConfig,
    feature_names: Vec<String>,
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Get the standard deviation values for each feature.
    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.feature_names.clone()
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Value = f64;
    type Params = StandardScalerParams;

    fn transform_row(&self, row: &[f64], out: &mut Vec<f64>) -> Result<()> {
        check_row_width(self.mean.len(), row.len())?;

        for ((&x, &mean), &std) in row.iter().zip(&self.mean).zip(&self.std) {
            let mut z = x;
            if self.config.with_mean {
                z -= mean;
            }
            if self.config.with_std {
                z /= std;
            }
            out.push(z);
        }
        Ok(())
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let (_, cols) = data.dim();
        if cols != self.mean.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.mean.len(),
                got: cols,
            });
        }

        let mut result = data.clone();
        for mut row in result.rows_mut() {
            for ((x, &mean), &std) in row.iter_mut().zip(&self.mean).zip(&self.std) {
                if self.config.with_std {
                    *x *= std;
                }
                if self.config.with_mean {
                    *x += mean;
                }
            }
        }
        Ok(result)
    }

    fn extract_params(&self) -> StandardScalerParams {
        StandardScalerParams {
            config: self.config.clone(),
            feature_names: self.feature_names.clone(),
            mean: self.mean.clone(),
            std: self.std.clone(),
        }
    }

    fn from_params(params: StandardScalerParams) -> Result<Self> {
        let n = params.feature_names.len();
        if params.mean.len() != n || params.std.len() != n {
            return Err(PipelineError::DimensionMismatch {
                expected: n,
                got: params.mean.len().max(params.std.len()),
            });
        }

        for ((name, &mean), &std) in params.feature_names.iter().zip(&params.mean).zip(&params.std) {
            if !mean.is_finite() {
                return Err(PipelineError::InvalidParameter(format!(
                    "mean of {} is not finite",
                    name
                )));
            }
            if !(std.is_finite() && std > 0.0) {
                return Err(PipelineError::InvalidParameter(format!(
                    "std of {} must be positive and finite, got {}",
                    name, std
                )));
            }
        }

        Ok(Self {
            config: params.config,
            feature_names: params.feature_names,
            mean: params.mean,
            std: params.std,
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    fn n_features_out(&self) -> usize {
        self.mean.len()
    }
}
