//! # crimecast
//!
//! Schema-checked feature encoding and linear prediction of yearly crime
//! counts per US state.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: transformers are split into an unfitted builder
//!   and a fitted counterpart, so `transform` only exists after `fit`.
//! - **Explicit pipeline object**: the fitted preprocessor, the linear model and
//!   the target link travel together in an owned [`PredictionPipeline`] that is
//!   built once and passed to every prediction.
//! - **Validated inputs**: every record is checked against the
//!   [`FeatureSchema`] before it reaches the encoder, and the model's coefficient
//!   layout is checked against the encoder's output when the bundle is built.
//!
//! ## Quick Start
//!
//! ```ignore
//! use crimecast::dataset::Frame;
//! use crimecast::domain::{crime_schema, field_labels, TARGET};
//! use crimecast::form::Form;
//! use crimecast::model::CoefficientFile;
//! use crimecast::preprocessing::{ColumnTransformer, HandleUnknown};
//! use crimecast::{PredictionPipeline, TargetTransform};
//!
//! let schema = crime_schema()?;
//! let frame = Frame::from_csv_path("data/data.csv", &schema, Some(TARGET))?;
//!
//! let preprocessor = ColumnTransformer::from_schema(&schema, HandleUnknown::Error)
//!     .fit(&frame)?;
//! let coefficients = CoefficientFile::from_json_path("coefficients.json")?;
//! let pipeline =
//!     PredictionPipeline::bundle(schema, preprocessor, coefficients, TargetTransform::Log10)?;
//!
//! let form = Form::from_frame(&frame, &field_labels())?;
//! let record = form.fill([("state", "Ohio".into())])?;
//! let crimes = pipeline.predict_count(&record)?;
//! ```
//!
//! ## Module Structure
//!
//! - `schema`, `record`: feature declarations and validated input records
//! - `dataset`: CSV loading, column statistics and train/test splitting
//! - `preprocessing`: one-hot, ordinal and standard-scaling steps and the
//!   column transformer that concatenates them
//! - `model`: the linear model and coefficient import
//! - `link`: target transforms and their inverses
//! - `pipeline`: the bundled, persistable prediction pipeline
//! - `form`: per-feature input domains and defaults
//! - `domain`: the state-year crime feature set
//! - `metrics`, `config`, `serialization`

/// Runtime configuration.
pub mod config;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// The crime feature set.
pub mod domain;

pub mod error;

/// Input forms derived from training data.
pub mod form;

pub mod link;

pub mod metrics;

/// Fitted models for inference.
pub mod model;

pub mod pipeline;

/// Data preprocessing transformers.
pub mod preprocessing;

pub mod record;

pub mod schema;

/// Model persistence.
pub mod serialization;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use link::TargetTransform;
pub use pipeline::PredictionPipeline;
pub use record::{FeatureValue, InputRecord};
pub use schema::{FeatureKind, FeatureSchema, FeatureSpec};
