//! Target transforms and their inverse links.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the regression target was transformed before the model was fitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    /// Target used as-is.
    Identity,
    /// Target is `log10(count)`.
    #[default]
    Log10,
}

impl TargetTransform {
    /// Map a model-scale prediction back to the original unit.
    ///
    /// For `Log10` this is `10^p`. Very large `p` overflows to `+inf`;
    /// check `is_finite()` on the result if that matters.
    pub fn inverse(self, prediction: f64) -> f64 {
        match self {
            TargetTransform::Identity => prediction,
            TargetTransform::Log10 => 10f64.powf(prediction),
        }
    }
}

impl fmt::Display for TargetTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetTransform::Identity => f.write_str("identity"),
            TargetTransform::Log10 => f.write_str("log10"),
        }
    }
}
