//! Serialization of fitted parameters.
//!
//! Fitted transformers, the linear model and the whole pipeline expose a plain
//! parameter struct (`*Params`) holding only numeric data and labels. Anything
//! that is `Serialize + Deserialize` gets byte encoding through bincode.

use std::error::Error;
use std::path::Path;

/// A trait for parameter representations that can be serialized to and from bytes.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Read a JSON document into `T`.
pub fn read_json<T, P>(path: P) -> crate::Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
    P: AsRef<Path>,
{
    let file = std::fs::File::open(path)?;
    let value = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        weights: Vec<f64>,
        label: String,
    }

    #[test]
    fn test_bincode_bytes_preserve_values() {
        let sample = Sample {
            weights: vec![0.1, -2.5, 1e-300],
            label: "state".to_string(),
        };
        let bytes = sample.to_bytes().unwrap();
        let restored = Sample::from_bytes(&bytes).unwrap();
        assert_eq!(restored, sample);
    }

    #[test]
    fn test_from_bytes_truncated() {
        let sample = Sample {
            weights: vec![1.0, 2.0],
            label: "x".to_string(),
        };
        let bytes = sample.to_bytes().unwrap();
        assert!(Sample::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, r#"{"weights": [1.5], "label": "year"}"#).unwrap();

        let sample: Sample = read_json(&path).unwrap();
        assert_eq!(sample.weights, vec![1.5]);
        assert_eq!(sample.label, "year");
    }
}
