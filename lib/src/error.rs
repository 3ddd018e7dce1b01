//! Error type shared by every stage of the prediction pipeline.

use crate::schema::FeatureKind;

/// Error type for schema validation, encoding, prediction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A field required by the schema was not supplied.
    #[error("missing feature: {name}")]
    MissingFeature { name: String },

    /// A field was supplied that the schema does not declare.
    #[error("unknown feature: {name}")]
    UnknownFeature { name: String },

    /// A value of the wrong type was supplied for a feature.
    #[error("type mismatch for {feature}: expected {expected} value, got {got}")]
    TypeMismatch {
        feature: String,
        expected: FeatureKind,
        got: String,
    },

    /// A category that was not seen while fitting the encoder.
    #[error("schema mismatch: category {category:?} was not seen for feature {feature}")]
    SchemaMismatch { feature: String, category: String },

    /// Encoded vector and model disagree on the number of features.
    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Encoded feature names do not line up with imported coefficients.
    #[error("feature order mismatch at position {position}: expected {expected:?}, got {got:?}")]
    FeatureOrderMismatch {
        position: usize,
        expected: String,
        got: String,
    },

    /// A value could not be parsed or is not finite.
    #[error("invalid value for {feature}: {message}")]
    InvalidValue { feature: String, message: String },

    /// A value lies outside the declared domain of a form field.
    #[error("{feature} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        feature: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Invalid hyperparameter or inconsistent fitted parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Empty data provided where non-empty was required.
    #[error("empty data: {0}")]
    EmptyData(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
