//! Delimited-text loading for [`Frame`].

use super::frame::{Column, Frame};
use crate::error::{PipelineError, Result};
use crate::schema::{FeatureKind, FeatureSchema};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

impl Frame {
    /// Load a frame from a CSV file with a header row.
    ///
    /// Only the schema columns and `target` are kept; other columns are
    /// ignored.
    ///
    /// # Errors
    /// - [`PipelineError::MissingFeature`] if a schema column or the target is absent
    /// - [`PipelineError::InvalidValue`] for an unparseable or empty cell
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        schema: &FeatureSchema,
        target: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let frame = Self::from_csv_reader(BufReader::new(file), schema, target)?;
        tracing::info!(path = %path.display(), rows = frame.n_rows(), "loaded dataset");
        Ok(frame)
    }

    /// Load a frame from any CSV source with a header row.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        schema: &FeatureSchema,
        target: Option<&str>,
    ) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let locate = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::MissingFeature {
                    name: name.to_string(),
                })
        };
        let feature_idx = schema
            .iter()
            .map(|spec| locate(&spec.name))
            .collect::<Result<Vec<_>>>()?;
        let target_idx = target.map(locate).transpose()?;

        let mut columns: Vec<Column> = schema
            .iter()
            .map(|spec| match spec.kind {
                FeatureKind::Numeric => Column::Numeric(Vec::new()),
                FeatureKind::Categorical | FeatureKind::Ordinal => Column::Categorical(Vec::new()),
            })
            .collect();
        let mut target_values = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            for ((spec, &idx), column) in schema.iter().zip(&feature_idx).zip(columns.iter_mut()) {
                let raw = cell(&record, idx, &spec.name, line)?;
                match column {
                    Column::Numeric(values) => values.push(parse_number(raw, &spec.name, line)?),
                    Column::Categorical(values) => values.push(raw.to_string()),
                }
            }
            if let (Some(idx), Some(name)) = (target_idx, target) {
                let raw = cell(&record, idx, name, line)?;
                target_values.push(parse_number(raw, name, line)?);
            }
        }

        let frame = Frame::new(schema.clone(), columns)?;
        match target {
            Some(name) => frame.with_target(name, target_values),
            None => Ok(frame),
        }
    }
}

fn cell<'r>(record: &'r StringRecord, idx: usize, name: &str, line: u64) -> Result<&'r str> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PipelineError::InvalidValue {
            feature: name.to_string(),
            message: format!("empty cell on line {}", line),
        }),
    }
}

fn parse_number(cell: &str, name: &str, line: u64) -> Result<f64> {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PipelineError::InvalidValue {
            feature: name.to_string(),
            message: format!("cannot parse {:?} as a number on line {}", cell, line),
        }),
    }
}
