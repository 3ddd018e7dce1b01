//! Ordinal encoding for categorical features.
//!
//! Maps category labels to their integer rank (0, 1, 2, ...).

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::{resolve_feature_names, sorted_categories};
use crate::preprocessing::traits::{check_row_width, FittedTransformer, Transformer};
use crate::record::normalize_label;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Ordinal encoder for categorical features.
///
/// The ordering is either learned from the training data (sorted unique
/// labels) or fixed up front with [`OrdinalEncoder::with_categories`].
/// An unseen label has no rank, so it is always rejected with
/// [`PipelineError::SchemaMismatch`].
///
/// # Example
/// ```ignore
/// use crimecast::preprocessing::{OrdinalEncoder, Transformer};
///
/// // Years 2012, 2010, 2011 -> ranks 2, 0, 1
/// let fitted = OrdinalEncoder::new().fit(&years)?;
/// let encoded = fitted.transform(&years)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct OrdinalEncoder {
    categories: Option<Vec<Vec<String>>>,
    feature_names: Option<Vec<String>>,
}

impl OrdinalEncoder {
    /// Create a new OrdinalEncoder that learns its ordering from data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed, pre-established ordering per column instead of learning one.
    ///
    /// Labels are normalized the way ordinal record values are, so `"2015.0"`
    /// and `"2015"` name the same rank.
    pub fn with_categories(mut self, categories: Vec<Vec<String>>) -> Self {
        let normalized: Vec<Vec<String>> = categories
            .iter()
            .map(|cats| cats.iter().map(|label| normalize_label(label)).collect())
            .collect();
        self.categories = Some(normalized);
        self
    }

    /// Name the input columns; used in error messages and output names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
}

/// Serializable parameters for a fitted OrdinalEncoder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrdinalEncoderParams {
    /// Input column names.
    pub feature_names: Vec<String>,
    /// Ordered categories for each input column; the rank is the index.
    pub categories: Vec<Vec<String>>,
}

/// Fitted OrdinalEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOrdinalEncoder {
    feature_names: Vec<String>,
    categories: Vec<Vec<String>>,
    /// Mapping from category label to rank for each column.
    mappings: Vec<HashMap<String, usize>>,
}

impl FittedOrdinalEncoder {
    /// Get the ordered categories for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Rank of `label` in column `feature_idx`.
    pub fn rank(&self, feature_idx: usize, label: &str) -> Option<usize> {
        self.mappings.get(feature_idx)?.get(label).copied()
    }

    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names
    }

    /// Output column names (the input names, one slot each).
    pub fn feature_names_out(&self) -> Vec<String> {
        self.feature_names.clone()
    }
}

impl Transformer for OrdinalEncoder {
    type Value = String;
    type Params = OrdinalEncoderParams;
    type Fitted = FittedOrdinalEncoder;

    fn fit(&self, data: &Array2<String>) -> Result<FittedOrdinalEncoder> {
        let categories = match &self.categories {
            Some(fixed) => {
                if data.nrows() == 0 {
                    return Err(PipelineError::EmptyData(
                        "Cannot fit OrdinalEncoder on empty data".to_string(),
                    ));
                }
                if fixed.len() != data.ncols() {
                    return Err(PipelineError::DimensionMismatch {
                        expected: fixed.len(),
                        got: data.ncols(),
                    });
                }
                fixed.clone()
            }
            None => sorted_categories(data, "OrdinalEncoder")?,
        };
        let feature_names = resolve_feature_names(&self.feature_names, categories.len())?;

        let fitted = FittedOrdinalEncoder::from_params(OrdinalEncoderParams {
            feature_names,
            categories,
        })?;

        // A fixed ordering must cover every label seen in training.
        if self.categories.is_some() {
            let mut scratch = Vec::with_capacity(fitted.n_features_in());
            for row in data.rows() {
                scratch.clear();
                fitted.transform_row(&row.to_vec(), &mut scratch)?;
            }
        }

        tracing::debug!(features = ?fitted.feature_names, "fitted ordinal encoder");
        Ok(fitted)
    }
}

impl FittedTransformer for FittedOrdinalEncoder {
    type Value = String;
    type Params = OrdinalEncoderParams;

    fn transform_row(&self, row: &[String], out: &mut Vec<f64>) -> Result<()> {
        check_row_width(self.mappings.len(), row.len())?;

        let start = out.len();
        for ((value, mapping), name) in row.iter().zip(&self.mappings).zip(&self.feature_names) {
            match mapping.get(value) {
                Some(&rank) => out.push(rank as f64),
                None => {
                    out.truncate(start);
                    return Err(PipelineError::SchemaMismatch {
                        feature: name.clone(),
                        category: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<String>> {
        let (rows, cols) = data.dim();
        if cols != self.categories.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.categories.len(),
                got: cols,
            });
        }

        let mut result = Vec::with_capacity(rows * cols);
        for row in data.rows() {
            for ((&rank, cats), name) in row.iter().zip(&self.categories).zip(&self.feature_names) {
                if rank < 0.0 || rank.fract() != 0.0 || rank as usize >= cats.len() {
                    return Err(PipelineError::InvalidValue {
                        feature: name.clone(),
                        message: format!("{} is not a valid rank", rank),
                    });
                }
                result.push(cats[rank as usize].clone());
            }
        }

        Array2::from_shape_vec((rows, cols), result)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }

    fn extract_params(&self) -> OrdinalEncoderParams {
        OrdinalEncoderParams {
            feature_names: self.feature_names.clone(),
            categories: self.categories.clone(),
        }
    }

    fn from_params(params: OrdinalEncoderParams) -> Result<Self> {
        if params.feature_names.len() != params.categories.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: params.categories.len(),
                got: params.feature_names.len(),
            });
        }

        let mut mappings = Vec::with_capacity(params.categories.len());
        for (cats, name) in params.categories.iter().zip(&params.feature_names) {
            if cats.is_empty() {
                return Err(PipelineError::InvalidParameter(format!(
                    "ordinal categories for {} are empty",
                    name
                )));
            }
            let unique: HashSet<&String> = cats.iter().collect();
            if unique.len() != cats.len() {
                return Err(PipelineError::InvalidParameter(format!(
                    "ordinal categories for {} contain duplicates",
                    name
                )));
            }
            mappings.push(
                cats.iter()
                    .enumerate()
                    .map(|(rank, label)| (label.clone(), rank))
                    .collect(),
            );
        }

        Ok(Self {
            feature_names: params.feature_names,
            categories: params.categories,
            mappings,
        })
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    fn n_features_out(&self) -> usize {
        self.categories.len()
    }
}
