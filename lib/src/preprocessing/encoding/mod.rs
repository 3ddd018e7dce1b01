//! Categorical feature encoding transformers.
//!
//! # Available Encoders
//!
//! ## OneHotEncoder
//! Converts category labels to one-hot (dummy) encoding.
//!
//! ```ignore
//! // Input: [["OH"], ["TX"], ["CA"]]  (3 samples, 1 categorical feature)
//! // Categories: ["CA", "OH", "TX"]
//! // Output: [[0,1,0], [0,0,1], [1,0,0]]
//! ```
//!
//! ## OrdinalEncoder
//! Maps category labels to their rank (0, 1, 2, ...) in a fixed ordering.
//!
//! Labels that all parse as numbers are ordered numerically, so `"2009"`
//! ranks before `"2010"` and `"9"` before `"10"`.

mod one_hot;
mod ordinal;

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
pub use ordinal::{FittedOrdinalEncoder, OrdinalEncoder, OrdinalEncoderParams};

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use std::collections::BTreeSet;

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Raise [`PipelineError::SchemaMismatch`] when unknown categories are encountered.
    #[default]
    Error,
    /// Encode unknown categories as an all-zero one-hot block.
    ///
    /// Ordinal encoding has no neutral rank and still fails.
    Ignore,
}

/// Sort and deduplicate one column's labels.
///
/// The column is ordered numerically only when every label parses as a
/// finite number; otherwise the whole column is ordered lexicographically.
pub fn sort_labels(labels: &mut Vec<String>) {
    let numeric: Option<Vec<f64>> = labels
        .iter()
        .map(|l| l.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();

    match numeric {
        Some(values) => {
            let mut keyed: Vec<(f64, String)> = values.into_iter().zip(labels.drain(..)).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            labels.extend(keyed.into_iter().map(|(_, label)| label));
        }
        None => labels.sort(),
    }
    labels.dedup();
}

/// Sorted unique labels of each column.
pub(crate) fn sorted_categories(data: &Array2<String>, encoder: &str) -> Result<Vec<Vec<String>>> {
    let (rows, cols) = data.dim();
    if rows == 0 {
        return Err(PipelineError::EmptyData(format!(
            "Cannot fit {} on empty data",
            encoder
        )));
    }

    let mut categories = Vec::with_capacity(cols);
    for column in data.columns() {
        let unique: BTreeSet<&str> = column.iter().map(String::as_str).collect();
        let mut sorted: Vec<String> = unique.into_iter().map(str::to_string).collect();
        sort_labels(&mut sorted);
        categories.push(sorted);
    }
    Ok(categories)
}

/// Feature names for `n` columns: the configured names or `x0, x1, ...`.
pub(crate) fn resolve_feature_names(names: &Option<Vec<String>>, n: usize) -> Result<Vec<String>> {
    match names {
        Some(names) if names.len() != n => Err(PipelineError::DimensionMismatch {
            expected: names.len(),
            got: n,
        }),
        Some(names) => Ok(names.clone()),
        None => Ok((0..n).map(|i| format!("x{}", i)).collect()),
    }
}
