//! Raw input values and schema-validated input records.

use crate::error::{PipelineError, Result};
use crate::schema::{FeatureKind, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw feature value before encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    fn type_name(&self) -> String {
        match self {
            FeatureValue::Number(n) => format!("number {}", n),
            FeatureValue::Category(s) => format!("category {:?}", s),
        }
    }

    /// The numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Category(_) => None,
        }
    }

    /// The category payload, if any.
    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }

    /// Parse command-line or form text for a feature of `kind`.
    ///
    /// Numeric features must parse as a number; other kinds keep the
    /// trimmed text as a label.
    pub fn parse(name: &str, kind: FeatureKind, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match kind {
            FeatureKind::Categorical | FeatureKind::Ordinal => {
                Ok(FeatureValue::Category(trimmed.to_string()))
            }
            FeatureKind::Numeric => trimmed
                .parse::<f64>()
                .map(FeatureValue::Number)
                .map_err(|_| PipelineError::InvalidValue {
                    feature: name.to_string(),
                    message: format!("cannot parse {:?} as a number", raw),
                }),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Category(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Category(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Category(value)
    }
}

/// Canonical label for a numeric category: `2015.0` becomes `"2015"`.
pub fn canonical_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Normalize an ordinal label so that `"2015"`, `" 2015 "` and `"2015.0"` agree.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => canonical_label(v),
        _ => trimmed.to_string(),
    }
}

/// Coerce a raw value to the representation stored for a feature of `kind`.
pub(crate) fn coerce(name: &str, kind: FeatureKind, value: FeatureValue) -> Result<FeatureValue> {
    match (kind, value) {
        (FeatureKind::Categorical, FeatureValue::Category(s)) => Ok(FeatureValue::Category(s)),
        (FeatureKind::Ordinal, FeatureValue::Category(s)) => {
            Ok(FeatureValue::Category(normalize_label(&s)))
        }
        (FeatureKind::Ordinal, FeatureValue::Number(n)) | (FeatureKind::Numeric, FeatureValue::Number(n))
            if !n.is_finite() =>
        {
            Err(PipelineError::InvalidValue {
                feature: name.to_string(),
                message: format!("{} is not finite", n),
            })
        }
        (FeatureKind::Ordinal, FeatureValue::Number(n)) => {
            Ok(FeatureValue::Category(canonical_label(n)))
        }
        (FeatureKind::Numeric, FeatureValue::Number(n)) => Ok(FeatureValue::Number(n)),
        (kind, other) => Err(PipelineError::TypeMismatch {
            feature: name.to_string(),
            expected: kind,
            got: other.type_name(),
        }),
    }
}

/// A single inference request, validated against a [`FeatureSchema`].
///
/// A record holds exactly the schema's fields. Ordinal values are stored as
/// canonical labels and numeric values are finite.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl InputRecord {
    /// Validate raw `(name, value)` pairs against `schema`.
    ///
    /// # Errors
    /// - [`PipelineError::UnknownFeature`] for a name outside the schema
    /// - [`PipelineError::MissingFeature`] for a schema field with no value
    /// - [`PipelineError::TypeMismatch`] / [`PipelineError::InvalidValue`] for bad values
    pub fn new<I, K>(schema: &FeatureSchema, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FeatureValue)>,
        K: Into<String>,
    {
        let mut raw: BTreeMap<String, FeatureValue> = BTreeMap::new();
        for (name, value) in values {
            let name = name.into();
            if schema.get(&name).is_none() {
                return Err(PipelineError::UnknownFeature { name });
            }
            if raw.insert(name.clone(), value).is_some() {
                return Err(PipelineError::InvalidParameter(format!(
                    "feature {} supplied more than once",
                    name
                )));
            }
        }

        let mut validated = BTreeMap::new();
        for spec in schema.iter() {
            let value = raw
                .remove(&spec.name)
                .ok_or_else(|| PipelineError::MissingFeature {
                    name: spec.name.clone(),
                })?;
            validated.insert(spec.name.clone(), coerce(&spec.name, spec.kind, value)?);
        }

        Ok(Self { values: validated })
    }

    /// Start a builder bound to `schema`.
    pub fn builder(schema: &FeatureSchema) -> InputRecordBuilder<'_> {
        InputRecordBuilder {
            schema,
            values: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    /// Category label of a categorical or ordinal field.
    pub fn category(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(FeatureValue::Category(s)) => Ok(s),
            Some(other) => Err(PipelineError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Categorical,
                got: other.type_name(),
            }),
            None => Err(PipelineError::MissingFeature {
                name: name.to_string(),
            }),
        }
    }

    /// Value of a numeric field.
    pub fn number(&self, name: &str) -> Result<f64> {
        match self.values.get(name) {
            Some(FeatureValue::Number(n)) => Ok(*n),
            Some(other) => Err(PipelineError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Numeric,
                got: other.type_name(),
            }),
            None => Err(PipelineError::MissingFeature {
                name: name.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the record, returning its raw values.
    pub fn into_values(self) -> BTreeMap<String, FeatureValue> {
        self.values
    }
}

/// Builder for [`InputRecord`]; validation happens in [`InputRecordBuilder::build`].
pub struct InputRecordBuilder<'a> {
    schema: &'a FeatureSchema,
    values: Vec<(String, FeatureValue)>,
}

impl InputRecordBuilder<'_> {
    pub fn category(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .push((name.into(), FeatureValue::Category(value.into())));
        self
    }

    pub fn number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.push((name.into(), FeatureValue::Number(value)));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn build(self) -> Result<InputRecord> {
        InputRecord::new(self.schema, self.values)
    }
}
