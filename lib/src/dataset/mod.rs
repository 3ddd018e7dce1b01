//! Tabular datasets.
//!
//! A [`Frame`] holds the columns of a [`FeatureSchema`](crate::schema::FeatureSchema)
//! plus an optional regression target. It is loaded once from CSV and used to
//! fit the column transformer, derive form defaults and evaluate a pipeline.
//!
//! # Example
//!
//! ```ignore
//! use crimecast::dataset::Frame;
//! use crimecast::domain::{crime_schema, TARGET};
//!
//! let schema = crime_schema()?;
//! let frame = Frame::from_csv_path("data/data.csv", &schema, Some(TARGET))?;
//! let (train, test) = frame.train_test_split(0.2, 42)?;
//! ```

mod loader;
mod frame;

pub use self::frame::{Column, Frame, Target};
