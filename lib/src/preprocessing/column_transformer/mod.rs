//! ColumnTransformer for applying different transformers to different columns.
//!
//! This module provides the `ColumnTransformer` which maps a schema-validated
//! record (or a whole frame) onto one concatenated numeric vector.

#[allow(clippy::module_inception)]
mod column_transformer;

pub use column_transformer::{
    ColumnSpec, ColumnTransformer, ColumnTransformerParams, ColumnTransformerStep,
    FittedColumnTransformer, FittedColumnTransformerStep, StepParams,
};
