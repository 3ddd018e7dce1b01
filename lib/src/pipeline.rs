//! End-to-end prediction: record → encoded vector → linear prediction → count.
//!
//! A [`PredictionPipeline`] owns everything a prediction needs: the schema,
//! the fitted column transformer, the linear model and the target transform.
//! It is built once (from a fitted transformer plus imported coefficients, or
//! from a saved artifact) and then shared read-only.
//!
//! # Example
//!
//! ```ignore
//! use crimecast::pipeline::PredictionPipeline;
//!
//! let pipeline = PredictionPipeline::load_from_file("model.bin")?;
//! let record = pipeline.record([("state", "OH".into()), ("year", 2015.0.into()), /* ... */])?;
//! let log_count = pipeline.predict(&record)?;
//! let count = pipeline.predict_count(&record)?;
//! ```

use crate::dataset::Frame;
use crate::error::{PipelineError, Result};
use crate::link::TargetTransform;
use crate::metrics::RegressionReport;
use crate::model::{CoefficientFile, InferenceModel, LinearModel, SerializableLinearParams};
use crate::preprocessing::{ColumnTransformerParams, FittedColumnTransformer};
use crate::record::{FeatureValue, InputRecord};
use crate::schema::FeatureSchema;
use crate::serialization::SerializableParams;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the [`PipelineParams`] layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Serializable parameters of a whole pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineParams {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub preprocessor: ColumnTransformerParams,
    pub model: SerializableLinearParams,
    pub target: TargetTransform,
}

/// Schema, fitted preprocessor, linear model and target transform.
#[derive(Clone, Debug)]
pub struct PredictionPipeline {
    schema: FeatureSchema,
    preprocessor: FittedColumnTransformer,
    model: LinearModel,
    target: TargetTransform,
}

impl PredictionPipeline {
    /// Assemble a pipeline, checking that its parts fit together.
    ///
    /// # Errors
    /// - [`PipelineError::UnknownFeature`] / [`PipelineError::InvalidParameter`] if the
    ///   preprocessor reads columns the schema does not declare with a compatible kind
    /// - [`PipelineError::DimensionMismatch`] if the encoded width differs from the
    ///   model's coefficient count
    pub fn new(
        schema: FeatureSchema,
        preprocessor: FittedColumnTransformer,
        model: LinearModel,
        target: TargetTransform,
    ) -> Result<Self> {
        preprocessor.check_schema(&schema)?;

        if preprocessor.n_features_out() != model.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: preprocessor.n_features_out(),
                got: model.n_features(),
            });
        }

        Ok(Self {
            schema,
            preprocessor,
            model,
            target,
        })
    }

    /// Attach imported coefficients to a fitted preprocessor.
    ///
    /// When the coefficient file names its columns they must equal
    /// [`FittedColumnTransformer::feature_names_out`] exactly.
    pub fn bundle(
        schema: FeatureSchema,
        preprocessor: FittedColumnTransformer,
        coefficients: CoefficientFile,
        target: TargetTransform,
    ) -> Result<Self> {
        coefficients.check_layout(&preprocessor.feature_names_out())?;
        let named = coefficients.feature_names.is_some();
        let model = coefficients.into_model()?;

        let pipeline = Self::new(schema, preprocessor, model, target)?;
        tracing::info!(
            features = pipeline.n_features_out(),
            named_coefficients = named,
            target = %target,
            "assembled prediction pipeline"
        );
        Ok(pipeline)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn preprocessor(&self) -> &FittedColumnTransformer {
        &self.preprocessor
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    pub fn target_transform(&self) -> TargetTransform {
        self.target
    }

    /// Length of every encoded vector.
    pub fn n_features_out(&self) -> usize {
        self.preprocessor.n_features_out()
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.preprocessor.feature_names_out()
    }

    /// Build a record validated against this pipeline's schema.
    pub fn record<I, K>(&self, values: I) -> Result<InputRecord>
    where
        I: IntoIterator<Item = (K, FeatureValue)>,
        K: Into<String>,
    {
        InputRecord::new(&self.schema, values)
    }

    /// Encode a record into the model's feature space.
    ///
    /// The record must hold exactly this pipeline's schema fields, whichever
    /// schema it was built against.
    pub fn encode(&self, record: &InputRecord) -> Result<Array1<f64>> {
        self.check_record(record)?;
        self.preprocessor.transform_record(record)
    }

    fn check_record(&self, record: &InputRecord) -> Result<()> {
        if let Some((name, _)) = record.iter().find(|(name, _)| self.schema.get(name).is_none()) {
            return Err(PipelineError::UnknownFeature {
                name: name.to_string(),
            });
        }
        if let Some(spec) = self.schema.iter().find(|spec| record.get(&spec.name).is_none()) {
            return Err(PipelineError::MissingFeature {
                name: spec.name.clone(),
            });
        }
        Ok(())
    }

    /// Model-scale prediction (log10 of the count for the default target).
    pub fn predict(&self, record: &InputRecord) -> Result<f64> {
        let encoded = self.encode(record)?;
        let prediction = self.model.predict(&encoded)?;
        tracing::trace!(prediction, "predicted");
        Ok(prediction)
    }

    /// Prediction mapped back through the inverse link.
    pub fn predict_count(&self, record: &InputRecord) -> Result<f64> {
        Ok(self.target.inverse(self.predict(record)?))
    }

    /// Model-scale predictions for every row of a frame.
    pub fn predict_frame(&self, frame: &Frame) -> Result<Array1<f64>> {
        let encoded = self.preprocessor.transform_frame(frame)?;
        self.model.predict_batch(&encoded)
    }

    /// R² and MSE of the model-scale predictions against the frame's target.
    pub fn evaluate(&self, frame: &Frame) -> Result<RegressionReport> {
        let target = frame.target().ok_or_else(|| {
            PipelineError::InvalidParameter("evaluation needs a target column".to_string())
        })?;
        let predictions = self.predict_frame(frame)?;
        let report = RegressionReport::compute(&target.values, &predictions.to_vec())?;

        tracing::info!(
            target = %target.name,
            n = report.n_samples,
            r2 = report.r2,
            mse = report.mse,
            "evaluated pipeline"
        );
        Ok(report)
    }

    pub fn extract_params(&self) -> PipelineParams {
        PipelineParams {
            format_version: FORMAT_VERSION,
            schema: self.schema.clone(),
            preprocessor: self.preprocessor.extract_params(),
            model: self.model.extract_params(),
            target: self.target,
        }
    }

    /// Rebuild a pipeline, re-running every construction check.
    pub fn from_params(params: PipelineParams) -> Result<Self> {
        if params.format_version != FORMAT_VERSION {
            return Err(PipelineError::Serialization(format!(
                "unsupported artifact format version {} (expected {})",
                params.format_version, FORMAT_VERSION
            )));
        }

        let schema = FeatureSchema::new(params.schema.features().to_vec())?;
        let preprocessor = FittedColumnTransformer::from_params(params.preprocessor)?;
        let model = LinearModel::from_params(params.model)?;
        Self::new(schema, preprocessor, model, params.target)
    }

    /// Save the pipeline as a bincode artifact.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.extract_params().to_bytes()?;
        std::fs::write(path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved pipeline");
        Ok(())
    }

    /// Load a pipeline artifact written by [`PredictionPipeline::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let pipeline = Self::from_params(PipelineParams::from_bytes(&bytes)?)?;
        tracing::info!(
            path = %path.display(),
            features = pipeline.n_features_out(),
            "loaded pipeline"
        );
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::preprocessing::{
        ColumnSpec, ColumnTransformer, FittedStandardScaler, HandleUnknown, StandardScalerConfig,
        StandardScalerParams,
    };
    use crate::preprocessing::{FittedTransformer, StepParams};
    use crate::schema::FeatureKind;
    use ndarray::array;

    fn single_feature_pipeline() -> PredictionPipeline {
        let schema = FeatureSchema::builder().numeric("x").build().unwrap();
        let scaler = FittedStandardScaler::from_params(StandardScalerParams {
            config: StandardScalerConfig::default(),
            feature_names: vec!["x".to_string()],
            mean: vec![10.0],
            std: vec![2.0],
        })
        .unwrap();
        let preprocessor = FittedColumnTransformer::from_params(ColumnTransformerParams {
            steps: vec![StepParams::StandardScaler(scaler.extract_params())],
        })
        .unwrap();
        let model = LinearModel::new(array![3.0], 1.0).unwrap();
        PredictionPipeline::new(schema, preprocessor, model, TargetTransform::Log10).unwrap()
    }

    fn crime_schema() -> FeatureSchema {
        FeatureSchema::builder()
            .categorical("state")
            .ordinal("year")
            .numeric("total_pop")
            .numeric("poverty_rate")
            .build()
            .unwrap()
    }

    fn crime_frame() -> Frame {
        Frame::new(
            crime_schema(),
            vec![
                Column::Categorical(vec!["OH".into(), "TX".into(), "CA".into(), "OH".into()]),
                Column::Categorical(vec!["2010".into(), "2011".into(), "2012".into(), "2012".into()]),
                Column::Numeric(vec![100.0, 300.0, 200.0, 400.0]),
                Column::Numeric(vec![0.10, 0.30, 0.20, 0.20]),
            ],
        )
        .unwrap()
        .with_target("log_total_crime_count", vec![3.9, 4.4, 4.1, 4.2])
        .unwrap()
    }

    fn crime_pipeline(handle_unknown: HandleUnknown) -> PredictionPipeline {
        let frame = crime_frame();
        let preprocessor = ColumnTransformer::from_schema(&crime_schema(), handle_unknown)
            .fit(&frame)
            .unwrap();
        let coefficients = CoefficientFile {
            intercept: 4.0,
            coefficients: vec![0.1, 0.2, 0.3, 0.05, 0.4, -0.2],
            feature_names: Some(preprocessor.feature_names_out()),
        };
        PredictionPipeline::bundle(
            crime_schema(),
            preprocessor,
            coefficients,
            TargetTransform::Log10,
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_single_feature_example() {
        let pipeline = single_feature_pipeline();
        let record = pipeline.record([("x", FeatureValue::Number(14.0))]).unwrap();

        assert_eq!(pipeline.encode(&record).unwrap().to_vec(), vec![2.0]);
        assert_eq!(pipeline.predict(&record).unwrap(), 7.0);
        assert!((pipeline.predict_count(&record).unwrap() - 1e7).abs() < 1e-3);
    }

    #[test]
    fn test_pipeline_encoded_length_matches_coefficients() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let frame = crime_frame();
        for i in 0..frame.n_rows() {
            let v = pipeline.encode(&frame.record(i).unwrap()).unwrap();
            assert_eq!(v.len(), pipeline.model().n_features());
        }
    }

    #[test]
    fn test_pipeline_prediction_is_deterministic() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let record = crime_frame().record(1).unwrap();
        let first = pipeline.predict(&record).unwrap();
        for _ in 0..5 {
            assert_eq!(pipeline.predict(&record).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_pipeline_default_record_has_zero_numeric_block() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let record = crime_frame().default_record().unwrap();
        let v = pipeline.encode(&record).unwrap();

        // 3 one-hot slots + year, then the standardized numerics
        let numeric = &v.to_vec()[4..];
        assert_eq!(numeric.len(), 2);
        for z in numeric {
            assert!(z.abs() < 1e-12, "expected 0, got {}", z);
        }
    }

    #[test]
    fn test_pipeline_unknown_state_policy() {
        let record = |pipeline: &PredictionPipeline| {
            pipeline
                .record([
                    ("state", FeatureValue::from("Atlantis")),
                    ("year", FeatureValue::from(2011.0)),
                    ("total_pop", FeatureValue::from(250.0)),
                    ("poverty_rate", FeatureValue::from(0.2)),
                ])
                .unwrap()
        };

        let strict = crime_pipeline(HandleUnknown::Error);
        assert!(matches!(
            strict.predict(&record(&strict)),
            Err(PipelineError::SchemaMismatch { .. })
        ));

        let lenient = crime_pipeline(HandleUnknown::Ignore);
        let v = lenient.encode(&record(&lenient)).unwrap();
        assert_eq!(&v.to_vec()[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pipeline_missing_feature() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let result = pipeline.record([
            ("state", FeatureValue::from("OH")),
            ("year", FeatureValue::from(2011.0)),
            ("total_pop", FeatureValue::from(250.0)),
        ]);
        match result {
            Err(PipelineError::MissingFeature { name }) => assert_eq!(name, "poverty_rate"),
            other => panic!("expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_rejects_record_from_wider_schema() {
        let pipeline = single_feature_pipeline();
        let wider = FeatureSchema::builder()
            .numeric("x")
            .numeric("violent_crime")
            .build()
            .unwrap();
        let record = InputRecord::builder(&wider)
            .number("x", 14.0)
            .number("violent_crime", 1e9)
            .build()
            .unwrap();

        match pipeline.predict(&record) {
            Err(PipelineError::UnknownFeature { name }) => assert_eq!(name, "violent_crime"),
            other => panic!("expected UnknownFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_rejects_record_from_narrower_schema() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let narrower = FeatureSchema::builder()
            .categorical("state")
            .ordinal("year")
            .numeric("total_pop")
            .build()
            .unwrap();
        let record = InputRecord::builder(&narrower)
            .category("state", "OH")
            .number("year", 2011.0)
            .number("total_pop", 250.0)
            .build()
            .unwrap();

        match pipeline.encode(&record) {
            Err(PipelineError::MissingFeature { name }) => assert_eq!(name, "poverty_rate"),
            other => panic!("expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_rejects_width_mismatch() {
        let frame = crime_frame();
        let preprocessor = ColumnTransformer::from_schema(&crime_schema(), HandleUnknown::Error)
            .fit(&frame)
            .unwrap();
        let model = LinearModel::new(array![1.0, 2.0], 0.0).unwrap();
        assert!(matches!(
            PredictionPipeline::new(crime_schema(), preprocessor, model, TargetTransform::Log10),
            Err(PipelineError::DimensionMismatch {
                expected: 6,
                got: 2
            })
        ));
    }

    #[test]
    fn test_pipeline_bundle_rejects_reordered_coefficients() {
        let frame = crime_frame();
        let preprocessor = ColumnTransformer::from_schema(&crime_schema(), HandleUnknown::Error)
            .fit(&frame)
            .unwrap();
        let mut names = preprocessor.feature_names_out();
        names.swap(4, 5);

        let result = PredictionPipeline::bundle(
            crime_schema(),
            preprocessor,
            CoefficientFile {
                intercept: 0.0,
                coefficients: vec![0.0; 6],
                feature_names: Some(names),
            },
            TargetTransform::Log10,
        );
        assert!(matches!(
            result,
            Err(PipelineError::FeatureOrderMismatch { position: 4, .. })
        ));
    }

    #[test]
    fn test_pipeline_rejects_preprocessor_outside_schema() {
        let frame = crime_frame();
        let preprocessor = ColumnTransformer::new()
            .add_standard_scaler(
                crate::preprocessing::StandardScaler::new(),
                ColumnSpec::Kind(FeatureKind::Numeric),
            )
            .fit(&frame)
            .unwrap();
        let schema = FeatureSchema::builder().numeric("total_pop").build().unwrap();
        let model = LinearModel::new(array![1.0, 1.0], 0.0).unwrap();
        assert!(matches!(
            PredictionPipeline::new(schema, preprocessor, model, TargetTransform::Identity),
            Err(PipelineError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn test_pipeline_predict_frame_matches_single_predictions() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let frame = crime_frame();
        let batch = pipeline.predict_frame(&frame).unwrap();
        for i in 0..frame.n_rows() {
            let single = pipeline.predict(&frame.record(i).unwrap()).unwrap();
            assert!((batch[i] - single).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pipeline_evaluate() {
        let pipeline = crime_pipeline(HandleUnknown::Error);
        let report = pipeline.evaluate(&crime_frame()).unwrap();
        assert_eq!(report.n_samples, 4);
        assert!(report.mse >= 0.0);
        assert!(report.r2 <= 1.0);
    }

    #[test]
    fn test_pipeline_evaluate_needs_target() {
        let pipeline = single_feature_pipeline();
        let frame = Frame::new(
            pipeline.schema().clone(),
            vec![Column::Numeric(vec![1.0, 2.0])],
        )
        .unwrap();
        assert!(matches!(
            pipeline.evaluate(&frame),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_pipeline_save_load_is_bit_identical() {
        let pipeline = crime_pipeline(HandleUnknown::Ignore);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.bin");
        pipeline.save_to_file(&path).unwrap();

        let loaded = PredictionPipeline::load_from_file(&path).unwrap();
        assert_eq!(loaded.feature_names_out(), pipeline.feature_names_out());
        assert_eq!(loaded.target_transform(), TargetTransform::Log10);

        let frame = crime_frame();
        for i in 0..frame.n_rows() {
            let record = frame.record(i).unwrap();
            assert_eq!(
                loaded.predict(&record).unwrap().to_bits(),
                pipeline.predict(&record).unwrap().to_bits()
            );
        }
    }

    #[test]
    fn test_pipeline_from_params_rejects_other_format_version() {
        let mut params = single_feature_pipeline().extract_params();
        params.format_version = FORMAT_VERSION + 1;
        assert!(matches!(
            PredictionPipeline::from_params(params),
            Err(PipelineError::Serialization(_))
        ));
    }

    #[test]
    fn test_pipeline_from_params_rejects_corrupted_std() {
        let mut params = single_feature_pipeline().extract_params();
        if let StepParams::StandardScaler(p) = &mut params.preprocessor.steps[0] {
            p.std[0] = 0.0;
        }
        assert!(matches!(
            PredictionPipeline::from_params(params),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_pipeline_load_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a pipeline").unwrap();
        assert!(PredictionPipeline::load_from_file(&path).is_err());
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredictionPipeline>();
        assert_send_sync::<crate::form::Form>();
    }
}
