//! Runtime configuration.

use crate::domain::TARGET;
use crate::error::{PipelineError, Result};
use crate::link::TargetTransform;
use crate::preprocessing::HandleUnknown;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by bundling, evaluation and the CLI.
///
/// Missing keys in a JSON file fall back to [`PipelineConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target column in training CSVs.
    pub target_column: String,
    pub target_transform: TargetTransform,
    /// Unseen-category policy for the one-hot step.
    pub handle_unknown: HandleUnknown,
    /// Share of rows held out by `train_test_split`, in `(0, 1)`.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: TARGET.to_string(),
            target_transform: TargetTransform::Log10,
            handle_unknown: HandleUnknown::Error,
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn with_target_transform(mut self, target_transform: TargetTransform) -> Self {
        self.target_transform = target_transform;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = crate::serialization::read_json(path)?;
        config.validate()?;
        tracing::debug!(?config, "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PipelineError::InvalidParameter(
                "target_column must not be empty".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}
