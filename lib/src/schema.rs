//! Feature schema: the ordered list of named, typed model inputs.
//!
//! The schema is fixed when the column transformer is fitted and is persisted
//! with the pipeline. Every inference-time record must supply exactly these
//! fields.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How a feature is encoded before it reaches the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Free-form category, one-hot encoded.
    Categorical,
    /// Category with a fixed rank order, encoded as its rank.
    Ordinal,
    /// Real-valued feature, standardized.
    Numeric,
}

impl FeatureKind {
    /// Whether values of this kind are category labels.
    pub fn is_categorical(self) -> bool {
        matches!(self, FeatureKind::Categorical | FeatureKind::Ordinal)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureKind::Categorical => "categorical",
            FeatureKind::Ordinal => "ordinal",
            FeatureKind::Numeric => "numeric",
        };
        f.write_str(name)
    }
}

/// A single (name, kind) entry of a [`FeatureSchema`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered list of model features.
///
/// Names are unique; construction fails with
/// [`PipelineError::InvalidParameter`] on duplicates or an empty list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    /// Build a schema from an ordered list of feature specs.
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self> {
        if features.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "schema must declare at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(features.len());
        for spec in &features {
            if spec.name.is_empty() {
                return Err(PipelineError::InvalidParameter(
                    "feature names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(PipelineError::InvalidParameter(format!(
                    "duplicate feature name {:?}",
                    spec.name
                )));
            }
        }

        Ok(Self { features })
    }

    /// Start a builder for a schema.
    pub fn builder() -> FeatureSchemaBuilder {
        FeatureSchemaBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter()
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Position of a feature in schema order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    /// Names of all features of the given kind, in schema order.
    pub fn names_of_kind(&self, kind: FeatureKind) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.name.clone())
            .collect()
    }

    /// All feature names in schema order.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Builder for [`FeatureSchema`].
#[derive(Clone, Debug, Default)]
pub struct FeatureSchemaBuilder {
    features: Vec<FeatureSpec>,
}

impl FeatureSchemaBuilder {
    pub fn categorical(mut self, name: impl Into<String>) -> Self {
        self.features
            .push(FeatureSpec::new(name, FeatureKind::Categorical));
        self
    }

    pub fn ordinal(mut self, name: impl Into<String>) -> Self {
        self.features.push(FeatureSpec::new(name, FeatureKind::Ordinal));
        self
    }

    pub fn numeric(mut self, name: impl Into<String>) -> Self {
        self.features.push(FeatureSpec::new(name, FeatureKind::Numeric));
        self
    }

    pub fn build(self) -> Result<FeatureSchema> {
        FeatureSchema::new(self.features)
    }
}
