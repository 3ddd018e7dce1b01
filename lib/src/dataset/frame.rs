//! Column-oriented in-memory table.

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::sort_labels;
use crate::record::{normalize_label, FeatureValue, InputRecord};
use crate::schema::{FeatureKind, FeatureSchema};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Values of one schema column.
///
/// Categorical and ordinal features are stored as labels, numeric features
/// as finite `f64`.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Categorical(Vec<String>),
    Numeric(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Regression target attached to a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub name: String,
    pub values: Vec<f64>,
}

/// A table holding one column per schema feature, in schema order, plus an
/// optional target column.
///
/// # Example
/// ```ignore
/// let frame = Frame::from_csv_path("data/data.csv", &schema, Some("log_total_crime_count"))?;
/// let (train, test) = frame.train_test_split(0.2, 42)?;
/// ```
#[derive(Clone, Debug)]
pub struct Frame {
    schema: FeatureSchema,
    columns: Vec<Column>,
    target: Option<Target>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame from columns given in schema order.
    ///
    /// Ordinal labels are normalized so that `"2015.0"` and `"2015"` agree.
    ///
    /// # Errors
    /// - [`PipelineError::DimensionMismatch`] if the column count or a column length is off
    /// - [`PipelineError::TypeMismatch`] if a column's storage does not fit its feature kind
    /// - [`PipelineError::InvalidValue`] for non-finite numbers
    pub fn new(schema: FeatureSchema, columns: Vec<Column>) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: schema.len(),
                got: columns.len(),
            });
        }
        let n_rows = columns.first().map(Column::len).unwrap_or(0);

        let mut normalized = Vec::with_capacity(columns.len());
        for (spec, column) in schema.iter().zip(columns) {
            if column.len() != n_rows {
                return Err(PipelineError::DimensionMismatch {
                    expected: n_rows,
                    got: column.len(),
                });
            }
            let column = match (spec.kind, column) {
                (FeatureKind::Categorical, Column::Categorical(v)) => Column::Categorical(v),
                (FeatureKind::Ordinal, Column::Categorical(v)) => {
                    Column::Categorical(v.iter().map(|s| normalize_label(s)).collect())
                }
                (FeatureKind::Numeric, Column::Numeric(v)) => {
                    if let Some((row, x)) = v.iter().enumerate().find(|(_, x)| !x.is_finite()) {
                        return Err(PipelineError::InvalidValue {
                            feature: spec.name.clone(),
                            message: format!("non-finite value {} at row {}", x, row),
                        });
                    }
                    Column::Numeric(v)
                }
                (kind, other) => {
                    return Err(PipelineError::TypeMismatch {
                        feature: spec.name.clone(),
                        expected: kind,
                        got: match other {
                            Column::Categorical(_) => "label column".to_string(),
                            Column::Numeric(_) => "numeric column".to_string(),
                        },
                    })
                }
            };
            normalized.push(column);
        }

        Ok(Self {
            schema,
            columns: normalized,
            target: None,
            n_rows,
        })
    }

    /// Stack validated records into a frame.
    pub fn from_records(schema: FeatureSchema, records: &[InputRecord]) -> Result<Self> {
        let mut columns = Vec::with_capacity(schema.len());
        for spec in schema.iter() {
            let column = if spec.kind == FeatureKind::Numeric {
                Column::Numeric(
                    records
                        .iter()
                        .map(|r| r.number(&spec.name))
                        .collect::<Result<_>>()?,
                )
            } else {
                Column::Categorical(
                    records
                        .iter()
                        .map(|r| r.category(&spec.name).map(str::to_string))
                        .collect::<Result<_>>()?,
                )
            };
            columns.push(column);
        }

        Self::new(schema, columns)
    }

    /// Attach a target column.
    pub fn with_target(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.n_rows {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_rows,
                got: values.len(),
            });
        }
        if let Some((row, y)) = values.iter().enumerate().find(|(_, y)| !y.is_finite()) {
            return Err(PipelineError::InvalidValue {
                feature: name,
                message: format!("non-finite target {} at row {}", y, row),
            });
        }
        self.target = Some(Target { name, values });
        Ok(self)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.position(name).map(|i| &self.columns[i])
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Labels of a categorical or ordinal column.
    pub fn labels(&self, name: &str) -> Result<&[String]> {
        match self.column(name) {
            Some(Column::Categorical(v)) => Ok(v),
            Some(Column::Numeric(_)) => Err(PipelineError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Categorical,
                got: "numeric column".to_string(),
            }),
            None => Err(PipelineError::UnknownFeature {
                name: name.to_string(),
            }),
        }
    }

    /// Values of a numeric column.
    pub fn numbers(&self, name: &str) -> Result<&[f64]> {
        match self.column(name) {
            Some(Column::Numeric(v)) => Ok(v),
            Some(Column::Categorical(_)) => Err(PipelineError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Numeric,
                got: "label column".to_string(),
            }),
            None => Err(PipelineError::UnknownFeature {
                name: name.to_string(),
            }),
        }
    }

    /// `(n_rows, names.len())` block of label columns.
    pub fn categorical_block(&self, names: &[String]) -> Result<Array2<String>> {
        let columns = names
            .iter()
            .map(|n| self.labels(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.n_rows, names.len()), |(i, j)| {
            columns[j][i].clone()
        }))
    }

    /// `(n_rows, names.len())` block of numeric columns.
    pub fn numeric_block(&self, names: &[String]) -> Result<Array2<f64>> {
        let columns = names
            .iter()
            .map(|n| self.numbers(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.n_rows, names.len()), |(i, j)| {
            columns[j][i]
        }))
    }

    /// Row `index` as a validated record.
    pub fn record(&self, index: usize) -> Result<InputRecord> {
        if index >= self.n_rows {
            return Err(PipelineError::InvalidParameter(format!(
                "row {} out of bounds for frame with {} rows",
                index, self.n_rows
            )));
        }
        let values = self.schema.iter().zip(&self.columns).map(|(spec, column)| {
            let value = match column {
                Column::Categorical(v) => FeatureValue::Category(v[index].clone()),
                Column::Numeric(v) => FeatureValue::Number(v[index]),
            };
            (spec.name.clone(), value)
        });
        InputRecord::new(&self.schema, values)
    }

    /// Sorted unique labels of a categorical or ordinal column.
    pub fn unique_labels(&self, name: &str) -> Result<Vec<String>> {
        let mut unique: Vec<String> = self.labels(name)?.to_vec();
        sort_labels(&mut unique);
        Ok(unique)
    }

    /// Most frequent label; ties go to the first label in sort order.
    pub fn mode(&self, name: &str) -> Result<String> {
        let labels = self.labels(name)?;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }

        let mut order: Vec<String> = counts.keys().map(|l| l.to_string()).collect();
        sort_labels(&mut order);

        let mut best: Option<(String, usize)> = None;
        for label in order {
            let count = counts.get(label.as_str()).copied().unwrap_or(0);
            if best.as_ref().map_or(true, |(_, c)| count > *c) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| PipelineError::EmptyData(format!("column {} has no rows", name)))
    }

    /// Arithmetic mean of a numeric column.
    pub fn mean(&self, name: &str) -> Result<f64> {
        let values = self.numbers(name)?;
        if values.is_empty() {
            return Err(PipelineError::EmptyData(format!("column {} has no rows", name)));
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Record of column means (numeric) and modal labels (categorical, ordinal).
    pub fn default_record(&self) -> Result<InputRecord> {
        let mut values = Vec::with_capacity(self.schema.len());
        for spec in self.schema.iter() {
            let value = match spec.kind {
                FeatureKind::Numeric => FeatureValue::Number(self.mean(&spec.name)?),
                FeatureKind::Categorical | FeatureKind::Ordinal => {
                    FeatureValue::Category(self.mode(&spec.name)?)
                }
            };
            values.push((spec.name.clone(), value));
        }
        InputRecord::new(&self.schema, values)
    }

    /// Rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(PipelineError::InvalidParameter(format!(
                "row {} out of bounds for frame with {} rows",
                bad, self.n_rows
            )));
        }
        Ok(Self {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            target: self.target.as_ref().map(|t| Target {
                name: t.name.clone(),
                values: indices.iter().map(|&i| t.values[i]).collect(),
            }),
            n_rows: indices.len(),
        })
    }

    /// Shuffle rows with a seeded RNG and split off `test_size` of them.
    ///
    /// The test share is rounded up, the train share gets the rest; both
    /// must end up non-empty. Returns `(train, test)`.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let n_test = (self.n_rows as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= self.n_rows {
            return Err(PipelineError::InvalidParameter(format!(
                "cannot split {} rows with test_size {}",
                self.n_rows, test_size
            )));
        }

        let mut indices: Vec<usize> = (0..self.n_rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        tracing::debug!(
            train = train_idx.len(),
            test = test_idx.len(),
            seed,
            "split frame"
        );
        Ok((self.take(train_idx)?, self.take(test_idx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::builder()
            .categorical("state")
            .ordinal("year")
            .numeric("poverty_rate")
            .build()
            .unwrap()
    }

    fn frame() -> Frame {
        Frame::new(
            schema(),
            vec![
                Column::Categorical(vec!["OH".into(), "TX".into(), "OH".into(), "CA".into()]),
                Column::Categorical(vec!["2010".into(), "2011.0".into(), "2012".into(), "2011".into()]),
                Column::Numeric(vec![0.1, 0.2, 0.3, 0.4]),
            ],
        )
        .unwrap()
        .with_target("y", vec![1.0, 2.0, 3.0, 4.0])
        .unwrap()
    }

    #[test]
    fn test_frame_normalizes_ordinal_labels() {
        let f = frame();
        assert_eq!(f.labels("year").unwrap()[1], "2011");
        assert_eq!(f.unique_labels("year").unwrap(), vec!["2010", "2011", "2012"]);
    }

    #[test]
    fn test_frame_rejects_wrong_column_type() {
        let result = Frame::new(
            schema(),
            vec![
                Column::Numeric(vec![1.0]),
                Column::Categorical(vec!["2010".into()]),
                Column::Numeric(vec![0.1]),
            ],
        );
        assert!(matches!(result, Err(PipelineError::TypeMismatch { .. })));
    }

    #[test]
    fn test_frame_rejects_ragged_columns() {
        let result = Frame::new(
            schema(),
            vec![
                Column::Categorical(vec!["OH".into(), "TX".into()]),
                Column::Categorical(vec!["2010".into()]),
                Column::Numeric(vec![0.1, 0.2]),
            ],
        );
        assert!(matches!(result, Err(PipelineError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_frame_mode_and_mean() {
        let f = frame();
        assert_eq!(f.mode("state").unwrap(), "OH");
        assert_eq!(f.mode("year").unwrap(), "2011");
        assert!((f.mean("poverty_rate").unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_frame_mode_tie_goes_to_first_label() {
        let f = Frame::new(
            FeatureSchema::builder().categorical("state").build().unwrap(),
            vec![Column::Categorical(vec!["TX".into(), "CA".into()])],
        )
        .unwrap();
        assert_eq!(f.mode("state").unwrap(), "CA");
    }

    #[test]
    fn test_frame_mixed_labels_sort_and_mode() {
        let f = Frame::new(
            FeatureSchema::builder().categorical("district").build().unwrap(),
            vec![Column::Categorical(
                ["9", "10", "1a", "12", "12a", "9", "1a"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )],
        )
        .unwrap();
        assert_eq!(
            f.unique_labels("district").unwrap(),
            vec!["10", "12", "12a", "1a", "9"]
        );
        // "1a" and "9" tie; string order puts "1a" first
        assert_eq!(f.mode("district").unwrap(), "1a");
        assert!(f.default_record().is_ok());
    }

    #[test]
    fn test_frame_default_record() {
        let record = frame().default_record().unwrap();
        assert_eq!(record.category("state").unwrap(), "OH");
        assert!((record.number("poverty_rate").unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_frame_record_roundtrip() {
        let f = frame();
        let record = f.record(2).unwrap();
        assert_eq!(record.category("year").unwrap(), "2012");

        let rebuilt = Frame::from_records(schema(), &[f.record(0).unwrap(), record]).unwrap();
        assert_eq!(rebuilt.n_rows(), 2);
        assert_eq!(rebuilt.numbers("poverty_rate").unwrap(), &[0.1, 0.3]);
    }

    #[test]
    fn test_frame_blocks() {
        let f = frame();
        let cats = f
            .categorical_block(&["state".to_string(), "year".to_string()])
            .unwrap();
        assert_eq!(cats.dim(), (4, 2));
        assert_eq!(cats[[3, 0]], "CA");

        let nums = f.numeric_block(&["poverty_rate".to_string()]).unwrap();
        assert_eq!(nums.column(0).to_vec(), vec![0.1, 0.2, 0.3, 0.4]);

        assert!(matches!(
            f.numeric_block(&["state".to_string()]),
            Err(PipelineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_frame_split_is_reproducible() {
        let f = frame();
        let (train_a, test_a) = f.train_test_split(0.25, 42).unwrap();
        let (train_b, test_b) = f.train_test_split(0.25, 42).unwrap();

        assert_eq!(train_a.n_rows(), 3);
        assert_eq!(test_a.n_rows(), 1);
        assert_eq!(train_a.target(), train_b.target());
        assert_eq!(test_a.target(), test_b.target());
    }

    #[test]
    fn test_frame_split_partitions_rows() {
        let f = frame();
        let (train, test) = f.train_test_split(0.5, 7).unwrap();

        let mut seen: Vec<f64> = train
            .target()
            .unwrap()
            .values
            .iter()
            .chain(&test.target().unwrap().values)
            .copied()
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_frame_split_invalid_test_size() {
        let f = frame();
        assert!(f.train_test_split(0.0, 42).is_err());
        assert!(f.train_test_split(1.0, 42).is_err());
        assert!(f.train_test_split(0.99, 42).is_err());
    }

    #[test]
    fn test_frame_with_target_length_mismatch() {
        let result = Frame::new(
            FeatureSchema::builder().numeric("x").build().unwrap(),
            vec![Column::Numeric(vec![1.0, 2.0])],
        )
        .unwrap()
        .with_target("y", vec![1.0]);
        assert!(matches!(result, Err(PipelineError::DimensionMismatch { .. })));
    }
}
