//! One-hot encoding for categorical features.
//!
//! Transforms category labels to one-hot (dummy) encoded vectors.

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::{resolve_feature_names, sorted_categories, HandleUnknown};
use crate::preprocessing::traits::{check_row_width, FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One-hot encoder for categorical features.
///
/// Each input column is treated as a categorical feature, and the encoder
/// learns the unique labels present in each column during fitting.
///
/// # Example
/// ```ignore
/// use crimecast::preprocessing::{OneHotEncoder, Transformer};
///
/// let data = Array2::from_shape_vec((3, 1), vec!["OH".into(), "TX".into(), "CA".into()])?;
/// let fitted = OneHotEncoder::new().fit(&data)?;
///
/// // Categories are sorted: [CA, OH, TX]
/// let encoded = fitted.transform(&data)?;
/// // [[0, 1, 0],
/// //  [0, 0, 1],
/// //  [1, 0, 0]]
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    /// How to handle unknown categories during transform.
    handle_unknown: HandleUnknown,
    feature_names: Option<Vec<String>>,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    /// Name the input columns; used in error messages and output names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Input column names.
    pub feature_names: Vec<String>,
    /// Categories (sorted unique labels) for each input column.
    pub categories: Vec<Vec<String>>,
    /// Handle unknown strategy.
    pub handle_unknown: HandleUnknown,
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    feature_names: Vec<String>,
    categories: Vec<Vec<String>>,
    /// Total number of output features (sum of category counts).
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    /// Get the categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Get the number of categories per input feature.
    pub fn n_values(&self) -> Vec<usize> {
        self.categories.iter().map(Vec::len).collect()
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    /// Output column names, `<feature>_<category>`.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.feature_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
    }
}

impl Transformer for OneHotEncoder {
    type Value = String;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Array2<String>) -> Result<FittedOneHotEncoder> {
        let categories = sorted_categories(data, "OneHotEncoder")?;
        let feature_names = resolve_feature_names(&self.feature_names, categories.len())?;

        tracing::debug!(
            features = ?feature_names,
            n_values = ?categories.iter().map(Vec::len).collect::<Vec<_>>(),
            "fitted one-hot encoder"
        );

        FittedOneHotEncoder::from_params(OneHotEncoderParams {
            feature_names,
            categories,
            handle_unknown: self.handle_unknown,
        })
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Value = String;
    type Params = OneHotEncoderParams;

    fn transform_row(&self, row: &[String], out: &mut Vec<f64>) -> Result<()> {
        check_row_width(self.categories.len(), row.len())?;

        for ((value, cats), name) in row.iter().zip(&self.categories).zip(&self.feature_names) {
            let start = out.len();
            out.resize(start + cats.len(), 0.0);

            match cats.iter().position(|c| c == value) {
                Some(idx) => out[start + idx] = 1.0,
                None => {
                    if self.handle_unknown == HandleUnknown::Error {
                        out.truncate(start);
                        return Err(PipelineError::SchemaMismatch {
                            feature: name.clone(),
                            category: value.clone(),
                        });
                    }
                    // With Ignore, leave as zeros
                    tracing::trace!(feature = %name, category = %value, "unknown category encoded as zeros");
                }
            }
        }
        Ok(())
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<String>> {
        let (rows, cols) = data.dim();
        if cols != self.n_features_out {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features_out,
                got: cols,
            });
        }

        let mut result = Vec::with_capacity(rows * self.categories.len());
        for row in data.rows() {
            let mut offset = 0;
            for (cats, name) in self.categories.iter().zip(&self.feature_names) {
                let block = row.slice(ndarray::s![offset..offset + cats.len()]);
                let active = block.iter().position(|&v| v > 0.5).ok_or_else(|| {
                    PipelineError::InvalidValue {
                        feature: name.clone(),
                        message: "no active category in one-hot block".to_string(),
                    }
                })?;
                result.push(cats[active].clone());
                offset += cats.len();
            }
        }

        Array2::from_shape_vec((rows, self.categories.len()), result)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }

    fn extract_params(&self) -> OneHotEncoderParams {
        OneHotEncoderParams {
            feature_names: self.feature_names.clone(),
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: OneHotEncoderParams) -> Result<Self> {
        if params.feature_names.len() != params.categories.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: params.categories.len(),
                got: params.feature_names.len(),
            });
        }
        if let Some(idx) = params.categories.iter().position(Vec::is_empty) {
            return Err(PipelineError::InvalidParameter(format!(
                "one-hot vocabulary for {} is empty",
                params.feature_names[idx]
            )));
        }
        for (cats, name) in params.categories.iter().zip(&params.feature_names) {
            let unique: HashSet<&String> = cats.iter().collect();
            if unique.len() != cats.len() {
                return Err(PipelineError::InvalidParameter(format!(
                    "one-hot vocabulary for {} contains duplicates",
                    name
                )));
            }
        }

        let n_features_out = params.categories.iter().map(Vec::len).sum();
        Ok(Self {
            feature_names: params.feature_names,
            categories: params.categories,
            n_features_out,
            handle_unknown: params.handle_unknown,
        })
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}
