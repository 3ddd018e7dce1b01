//! ColumnTransformer implementation.
//!
//! Applies different transformers to different column subsets and concatenates results.

use crate::dataset::Frame;
use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::{
    FittedOneHotEncoder, FittedOrdinalEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams,
    OrdinalEncoder, OrdinalEncoderParams,
};
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::record::InputRecord;
use crate::schema::{FeatureKind, FeatureSchema};
use crate::serialization::SerializableParams;
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Specifies which columns a transformer should be applied to.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnSpec {
    /// Apply to the named columns, in this order.
    Names(Vec<String>),
    /// Apply to every schema column of one kind, in schema order.
    Kind(FeatureKind),
    /// Apply to all columns.
    All,
}

impl ColumnSpec {
    /// Convenience for `ColumnSpec::Names` from string slices.
    pub fn names<S: AsRef<str>>(names: &[S]) -> Self {
        ColumnSpec::Names(names.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// Resolve the column spec to actual column names.
    fn resolve(&self, schema: &FeatureSchema) -> Vec<String> {
        match self {
            ColumnSpec::Names(names) => names.clone(),
            ColumnSpec::Kind(kind) => schema.names_of_kind(*kind),
            ColumnSpec::All => schema.iter().map(|spec| spec.name.clone()).collect(),
        }
    }
}

/// Enum of unfitted transformers that can be used in a ColumnTransformer.
#[derive(Clone, Debug)]
pub enum ColumnTransformerStep {
    OneHotEncoder(OneHotEncoder),
    OrdinalEncoder(OrdinalEncoder),
    StandardScaler(StandardScaler),
}

impl ColumnTransformerStep {
    fn step_name(&self) -> &'static str {
        match self {
            ColumnTransformerStep::OneHotEncoder(_) => "OneHotEncoder",
            ColumnTransformerStep::OrdinalEncoder(_) => "OrdinalEncoder",
            ColumnTransformerStep::StandardScaler(_) => "StandardScaler",
        }
    }

    /// Whether a feature of `kind` can feed this step.
    fn accepts(&self, kind: FeatureKind) -> bool {
        match self {
            ColumnTransformerStep::OneHotEncoder(_) | ColumnTransformerStep::OrdinalEncoder(_) => {
                kind.is_categorical()
            }
            ColumnTransformerStep::StandardScaler(_) => kind == FeatureKind::Numeric,
        }
    }

    fn fit(&self, frame: &Frame, columns: &[String]) -> Result<FittedColumnTransformerStep> {
        let names = columns.to_vec();
        match self {
            ColumnTransformerStep::OneHotEncoder(t) => t
                .clone()
                .with_feature_names(names)
                .fit(&frame.categorical_block(columns)?)
                .map(FittedColumnTransformerStep::OneHotEncoder),
            ColumnTransformerStep::OrdinalEncoder(t) => t
                .clone()
                .with_feature_names(names)
                .fit(&frame.categorical_block(columns)?)
                .map(FittedColumnTransformerStep::OrdinalEncoder),
            ColumnTransformerStep::StandardScaler(t) => t
                .clone()
                .with_feature_names(names)
                .fit(&frame.numeric_block(columns)?)
                .map(FittedColumnTransformerStep::StandardScaler),
        }
    }
}

/// Enum of fitted transformers for ColumnTransformer.
#[derive(Clone, Debug)]
pub enum FittedColumnTransformerStep {
    OneHotEncoder(FittedOneHotEncoder),
    OrdinalEncoder(FittedOrdinalEncoder),
    StandardScaler(FittedStandardScaler),
}

impl FittedColumnTransformerStep {
    /// Get the step name.
    pub fn step_name(&self) -> &'static str {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(_) => "OneHotEncoder",
            FittedColumnTransformerStep::OrdinalEncoder(_) => "OrdinalEncoder",
            FittedColumnTransformerStep::StandardScaler(_) => "StandardScaler",
        }
    }

    /// Input columns, in the order the step reads them.
    pub fn columns(&self) -> &[String] {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => t.feature_names_in(),
            FittedColumnTransformerStep::OrdinalEncoder(t) => t.feature_names_in(),
            FittedColumnTransformerStep::StandardScaler(t) => t.feature_names_in(),
        }
    }

    fn n_features_out(&self) -> usize {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => t.n_features_out(),
            FittedColumnTransformerStep::OrdinalEncoder(t) => t.n_features_out(),
            FittedColumnTransformerStep::StandardScaler(t) => t.n_features_out(),
        }
    }

    fn feature_names_out(&self) -> Vec<String> {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => t.feature_names_out(),
            FittedColumnTransformerStep::OrdinalEncoder(t) => t.feature_names_out(),
            FittedColumnTransformerStep::StandardScaler(t) => t.feature_names_out(),
        }
    }

    fn accepts(&self, kind: FeatureKind) -> bool {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(_)
            | FittedColumnTransformerStep::OrdinalEncoder(_) => kind.is_categorical(),
            FittedColumnTransformerStep::StandardScaler(_) => kind == FeatureKind::Numeric,
        }
    }

    /// Append this step's encoding of `record` to `out`.
    fn transform_record(&self, record: &InputRecord, out: &mut Vec<f64>) -> Result<()> {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => {
                t.transform_row(&labels(record, t.feature_names_in())?, out)
            }
            FittedColumnTransformerStep::OrdinalEncoder(t) => {
                t.transform_row(&labels(record, t.feature_names_in())?, out)
            }
            FittedColumnTransformerStep::StandardScaler(t) => {
                let row = t
                    .feature_names_in()
                    .iter()
                    .map(|name| record.number(name))
                    .collect::<Result<Vec<_>>>()?;
                t.transform_row(&row, out)
            }
        }
    }

    fn transform_frame(&self, frame: &Frame) -> Result<Array2<f64>> {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => {
                t.transform(&frame.categorical_block(t.feature_names_in())?)
            }
            FittedColumnTransformerStep::OrdinalEncoder(t) => {
                t.transform(&frame.categorical_block(t.feature_names_in())?)
            }
            FittedColumnTransformerStep::StandardScaler(t) => {
                t.transform(&frame.numeric_block(t.feature_names_in())?)
            }
        }
    }

    fn extract_params(&self) -> StepParams {
        match self {
            FittedColumnTransformerStep::OneHotEncoder(t) => {
                StepParams::OneHotEncoder(t.extract_params())
            }
            FittedColumnTransformerStep::OrdinalEncoder(t) => {
                StepParams::OrdinalEncoder(t.extract_params())
            }
            FittedColumnTransformerStep::StandardScaler(t) => {
                StepParams::StandardScaler(t.extract_params())
            }
        }
    }

    fn from_params(params: StepParams) -> Result<Self> {
        Ok(match params {
            StepParams::OneHotEncoder(p) => {
                FittedColumnTransformerStep::OneHotEncoder(FittedOneHotEncoder::from_params(p)?)
            }
            StepParams::OrdinalEncoder(p) => {
                FittedColumnTransformerStep::OrdinalEncoder(FittedOrdinalEncoder::from_params(p)?)
            }
            StepParams::StandardScaler(p) => {
                FittedColumnTransformerStep::StandardScaler(FittedStandardScaler::from_params(p)?)
            }
        })
    }
}

fn labels(record: &InputRecord, names: &[String]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| record.category(name).map(str::to_string))
        .collect()
}

/// ColumnTransformer applies different transformers to different columns.
///
/// Outputs of the steps are concatenated in the order the steps were added;
/// within a step, columns keep the order of its [`ColumnSpec`]. A fitted
/// linear model depends on this order, so it is part of the fitted state.
///
/// # Example
/// ```ignore
/// use crimecast::preprocessing::{
///     ColumnSpec, ColumnTransformer, OneHotEncoder, OrdinalEncoder, StandardScaler,
/// };
///
/// let ct = ColumnTransformer::new()
///     .add_one_hot_encoder(OneHotEncoder::new(), ColumnSpec::names(&["state"]))
///     .add_ordinal_encoder(OrdinalEncoder::new(), ColumnSpec::names(&["year"]))
///     .add_standard_scaler(StandardScaler::new(), ColumnSpec::Kind(FeatureKind::Numeric));
///
/// let fitted = ct.fit(&train)?;
/// let vector = fitted.transform_record(&record)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnTransformer {
    steps: Vec<(ColumnSpec, ColumnTransformerStep)>,
}

impl ColumnTransformer {
    /// Create a new empty ColumnTransformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard layout for a schema: one-hot for categorical features, then
    /// ordinal for ordinal features, then standard scaling for numeric ones.
    /// Kinds with no features get no step.
    pub fn from_schema(schema: &FeatureSchema, handle_unknown: HandleUnknown) -> Self {
        let mut ct = Self::new();
        if !schema.names_of_kind(FeatureKind::Categorical).is_empty() {
            ct = ct.add_one_hot_encoder(
                OneHotEncoder::new().with_handle_unknown(handle_unknown),
                ColumnSpec::Kind(FeatureKind::Categorical),
            );
        }
        if !schema.names_of_kind(FeatureKind::Ordinal).is_empty() {
            ct = ct.add_ordinal_encoder(
                OrdinalEncoder::new(),
                ColumnSpec::Kind(FeatureKind::Ordinal),
            );
        }
        if !schema.names_of_kind(FeatureKind::Numeric).is_empty() {
            ct = ct.add_standard_scaler(
                StandardScaler::new(),
                ColumnSpec::Kind(FeatureKind::Numeric),
            );
        }
        ct
    }

    /// Add a OneHotEncoder for specified columns.
    pub fn add_one_hot_encoder(mut self, encoder: OneHotEncoder, spec: ColumnSpec) -> Self {
        self.steps
            .push((spec, ColumnTransformerStep::OneHotEncoder(encoder)));
        self
    }

    /// Add an OrdinalEncoder for specified columns.
    pub fn add_ordinal_encoder(mut self, encoder: OrdinalEncoder, spec: ColumnSpec) -> Self {
        self.steps
            .push((spec, ColumnTransformerStep::OrdinalEncoder(encoder)));
        self
    }

    /// Add a StandardScaler for specified columns.
    pub fn add_standard_scaler(mut self, scaler: StandardScaler, spec: ColumnSpec) -> Self {
        self.steps
            .push((spec, ColumnTransformerStep::StandardScaler(scaler)));
        self
    }

    /// Add a generic step.
    pub fn add(mut self, step: ColumnTransformerStep, spec: ColumnSpec) -> Self {
        self.steps.push((spec, step));
        self
    }

    /// Get the number of transformer steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Learn every step's parameters from the frame's columns.
    ///
    /// # Errors
    /// - [`PipelineError::EmptyData`] if the frame has no rows
    /// - [`PipelineError::InvalidParameter`] if there are no steps, a step selects
    ///   no columns, or a column is unknown or of the wrong kind for its step
    pub fn fit(&self, frame: &Frame) -> Result<FittedColumnTransformer> {
        if frame.is_empty() {
            return Err(PipelineError::EmptyData(
                "Cannot fit ColumnTransformer on empty data".to_string(),
            ));
        }

        if self.steps.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "Cannot fit empty ColumnTransformer".to_string(),
            ));
        }

        let schema = frame.schema();
        let mut fitted_steps = Vec::with_capacity(self.steps.len());

        for (spec, step) in &self.steps {
            let columns = spec.resolve(schema);
            if columns.is_empty() {
                return Err(PipelineError::InvalidParameter(format!(
                    "{} selects no columns",
                    step.step_name()
                )));
            }

            // Validate columns
            for name in &columns {
                match schema.get(name) {
                    None => {
                        return Err(PipelineError::InvalidParameter(format!(
                            "Column {} is not in the schema",
                            name
                        )))
                    }
                    Some(feature) if !step.accepts(feature.kind) => {
                        return Err(PipelineError::InvalidParameter(format!(
                            "{} cannot be applied to {} column {}",
                            step.step_name(),
                            feature.kind,
                            name
                        )))
                    }
                    Some(_) => {}
                }
            }

            fitted_steps.push(step.fit(frame, &columns)?);
        }

        let fitted = FittedColumnTransformer::from_steps(fitted_steps)?;
        tracing::info!(
            rows = frame.n_rows(),
            steps = fitted.fitted_steps.len(),
            features_out = fitted.n_features_out,
            "fitted column transformer"
        );
        Ok(fitted)
    }

    /// Fit and transform the frame in one step.
    pub fn fit_transform(&self, frame: &Frame) -> Result<Array2<f64>> {
        let fitted = self.fit(frame)?;
        fitted.transform_frame(frame)
    }
}

/// Serializable parameters of one fitted step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StepParams {
    OneHotEncoder(OneHotEncoderParams),
    OrdinalEncoder(OrdinalEncoderParams),
    StandardScaler(StandardScalerParams),
}

/// Serializable parameters for a fitted ColumnTransformer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnTransformerParams {
    /// Step parameters, in output order.
    pub steps: Vec<StepParams>,
}

/// Fitted ColumnTransformer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedColumnTransformer {
    fitted_steps: Vec<FittedColumnTransformerStep>,
    /// Distinct input columns in first-use order.
    input_features: Vec<String>,
    n_features_out: usize,
}

impl FittedColumnTransformer {
    fn from_steps(fitted_steps: Vec<FittedColumnTransformerStep>) -> Result<Self> {
        if fitted_steps.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "ColumnTransformer has no steps".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut input_features = Vec::new();
        for name in fitted_steps.iter().flat_map(|s| s.columns()) {
            if seen.insert(name.as_str()) {
                input_features.push(name.clone());
            }
        }
        let n_features_out = fitted_steps.iter().map(|s| s.n_features_out()).sum();

        Ok(Self {
            fitted_steps,
            input_features,
            n_features_out,
        })
    }

    /// Get the number of input features.
    pub fn n_features_in(&self) -> usize {
        self.input_features.len()
    }

    /// Get the number of output features.
    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Distinct input columns read by the steps.
    pub fn input_features(&self) -> &[String] {
        &self.input_features
    }

    pub fn steps(&self) -> &[FittedColumnTransformerStep] {
        &self.fitted_steps
    }

    /// Get step names.
    pub fn step_names(&self) -> Vec<(&'static str, &[String])> {
        self.fitted_steps
            .iter()
            .map(|step| (step.step_name(), step.columns()))
            .collect()
    }

    /// Encoded column names in output order.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.fitted_steps
            .iter()
            .flat_map(|s| s.feature_names_out())
            .collect()
    }

    /// Check that every input column exists in `schema` with a kind its step accepts.
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<()> {
        for step in &self.fitted_steps {
            for name in step.columns() {
                let feature = schema.get(name).ok_or_else(|| PipelineError::UnknownFeature {
                    name: name.clone(),
                })?;
                if !step.accepts(feature.kind) {
                    return Err(PipelineError::InvalidParameter(format!(
                        "{} cannot be applied to {} column {}",
                        step.step_name(),
                        feature.kind,
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Encode one record into a vector of `n_features_out()` values.
    pub fn transform_record(&self, record: &InputRecord) -> Result<Array1<f64>> {
        let mut out = Vec::with_capacity(self.n_features_out);
        for step in &self.fitted_steps {
            step.transform_record(record, &mut out)?;
        }

        if out.len() != self.n_features_out {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features_out,
                got: out.len(),
            });
        }
        Ok(Array1::from(out))
    }

    /// Encode every row of a frame into an `(n_rows, n_features_out())` matrix.
    pub fn transform_frame(&self, frame: &Frame) -> Result<Array2<f64>> {
        if frame.is_empty() {
            return Ok(Array2::zeros((0, self.n_features_out)));
        }

        let blocks = self
            .fitted_steps
            .iter()
            .map(|step| step.transform_frame(frame))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();

        concatenate(Axis(1), &views).map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }

    pub fn extract_params(&self) -> ColumnTransformerParams {
        ColumnTransformerParams {
            steps: self
                .fitted_steps
                .iter()
                .map(FittedColumnTransformerStep::extract_params)
                .collect(),
        }
    }

    pub fn from_params(params: ColumnTransformerParams) -> Result<Self> {
        let steps = params
            .steps
            .into_iter()
            .map(FittedColumnTransformerStep::from_params)
            .collect::<Result<Vec<_>>>()?;
        Self::from_steps(steps)
    }

    /// Save the fitted transformer to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.extract_params().to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_params(ColumnTransformerParams::from_bytes(&bytes)?)
    }
}
