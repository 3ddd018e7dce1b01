//! Data preprocessing transformers.
//!
//! Transformers follow a type-state pattern: an unfitted transformer holds
//! hyperparameters, and `fit` returns a separate fitted type that holds the
//! learned parameters and does the encoding.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! ## Encoding
//! - [`OneHotEncoder`]: One slot per category, exactly one set
//! - [`OrdinalEncoder`]: Category rank in a fixed ordering
//!
//! ## Scaling
//! - [`StandardScaler`]: Z-score normalization
//!
//! ## Composition
//! - [`ColumnTransformer`]: Route schema columns to transformers and
//!   concatenate their outputs
//!
//! # Example
//!
//! ```ignore
//! use crimecast::preprocessing::{Transformer, StandardScaler};
//!
//! let scaler = StandardScaler::new()
//!     .with_mean(true)
//!     .with_std(true);
//!
//! let fitted = scaler.fit(&training_data)?;
//! let scaled_train = fitted.transform(&training_data)?;
//!
//! // Save for later use
//! fitted.save_to_file("scaler.bin")?;
//!
//! // Later, load and transform new data
//! let loaded = FittedStandardScaler::load_from_file("scaler.bin")?;
//! let scaled_test = loaded.transform(&test_data)?;
//! ```

pub mod column_transformer;
pub mod encoding;
pub mod scaling;
pub mod traits;

// Re-export main types
pub use column_transformer::{
    ColumnSpec, ColumnTransformer, ColumnTransformerParams, FittedColumnTransformer, StepParams,
};
pub use encoding::{
    FittedOneHotEncoder, FittedOrdinalEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams,
    OrdinalEncoder, OrdinalEncoderParams,
};
pub use scaling::{
    FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams,
};
pub use traits::{FittedTransformer, Transformer};
