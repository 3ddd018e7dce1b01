use crimecast::dataset::Frame;
use crimecast::domain::{crime_schema, field_labels, CrimeFeatures, FEATURES, TARGET};
use crimecast::form::Form;
use crimecast::model::CoefficientFile;
use crimecast::preprocessing::{ColumnTransformer, FittedColumnTransformer, HandleUnknown};
use crimecast::{FeatureValue, PipelineConfig, PipelineError, PredictionPipeline, TargetTransform};
use std::path::{Path, PathBuf};

const STATES: [&str; 3] = ["Ohio", "Texas", "Utah"];

fn is_fraction(name: &str) -> bool {
    name.ends_with("_rate") || (name.ends_with("_pop") && name != "total_pop")
}

/// Twelve state-year rows: three states, four years, smooth numeric columns.
fn write_csv(dir: &Path) -> PathBuf {
    let mut text = format!("{},{}\n", FEATURES.join(","), TARGET);
    for i in 0..12usize {
        let mut cells = vec![STATES[i % 3].to_string(), (2010 + i % 4).to_string()];
        for (j, name) in FEATURES[2..].iter().enumerate() {
            let value = if is_fraction(name) {
                0.1 + 0.05 * ((i + j) % 5) as f64
            } else {
                (1000 * (j + 1) + 10 * i) as f64
            };
            cells.push(value.to_string());
        }
        cells.push((3.0 + 0.1 * i as f64).to_string());
        text.push_str(&cells.join(","));
        text.push('\n');
    }

    let path = dir.join("data.csv");
    std::fs::write(&path, text).unwrap();
    path
}

fn load(dir: &Path) -> Frame {
    let schema = crime_schema().unwrap();
    Frame::from_csv_path(write_csv(dir), &schema, Some(TARGET)).unwrap()
}

fn fit(frame: &Frame) -> FittedColumnTransformer {
    ColumnTransformer::from_schema(frame.schema(), HandleUnknown::Error)
        .fit(frame)
        .unwrap()
}

/// Intercept 2, weight 1 on the Ohio indicator, zero elsewhere.
fn ohio_coefficients(preprocessor: &FittedColumnTransformer) -> CoefficientFile {
    let names = preprocessor.feature_names_out();
    let coefficients = names
        .iter()
        .map(|n| if n == "state_Ohio" { 1.0 } else { 0.0 })
        .collect();
    CoefficientFile {
        intercept: 2.0,
        coefficients,
        feature_names: Some(names),
    }
}

fn pipeline(frame: &Frame) -> PredictionPipeline {
    let preprocessor = fit(frame);
    let coefficients = ohio_coefficients(&preprocessor);
    PredictionPipeline::bundle(
        frame.schema().clone(),
        preprocessor,
        coefficients,
        TargetTransform::Log10,
    )
    .unwrap()
}

#[test]
fn test_encoded_layout() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let preprocessor = fit(&frame);

    // 3 states + year + 22 numerics
    assert_eq!(preprocessor.n_features_out(), 26);
    let names = preprocessor.feature_names_out();
    assert_eq!(&names[..4], &["state_Ohio", "state_Texas", "state_Utah", "year"]);
    assert_eq!(names[4], "total_pop");
    assert_eq!(names[25], "youth_school_poverty_interaction");
}

#[test]
fn test_predict_count_through_form() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let pipeline = pipeline(&frame);
    let form = Form::from_frame(&frame, &field_labels()).unwrap();

    let ohio = form.fill([("state", FeatureValue::from("Ohio"))]).unwrap();
    assert!((pipeline.predict(&ohio).unwrap() - 3.0).abs() < 1e-12);
    assert!((pipeline.predict_count(&ohio).unwrap() - 1000.0).abs() < 1e-6);

    let texas = form
        .fill([
            ("state", FeatureValue::from("Texas")),
            ("year", FeatureValue::from(2013.0)),
            ("poverty_rate", FeatureValue::from(0.3)),
        ])
        .unwrap();
    assert!((pipeline.predict(&texas).unwrap() - 2.0).abs() < 1e-12);
    assert!((pipeline.predict_count(&texas).unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn test_form_rejects_out_of_range_override() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let form = Form::from_frame(&frame, &field_labels()).unwrap();

    assert!(matches!(
        form.fill([("white_pop", FeatureValue::from(1.2))]),
        Err(PipelineError::OutOfRange { .. })
    ));
    assert!(matches!(
        form.fill([("year", FeatureValue::from(2020.0))]),
        Err(PipelineError::OutOfRange { .. })
    ));
}

#[test]
fn test_default_record_encodes_to_centered_numerics() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let pipeline = pipeline(&frame);

    let encoded = pipeline.encode(&frame.default_record().unwrap()).unwrap();
    assert_eq!(encoded.len(), 26);
    // modal state and year break ties on sort order
    assert_eq!(encoded[0], 1.0);
    assert_eq!(encoded[3], 0.0);
    for v in encoded.iter().skip(4) {
        assert!(v.abs() < 1e-9, "numeric column not centered: {}", v);
    }
}

#[test]
fn test_split_and_evaluate() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let config = PipelineConfig::default().with_test_size(0.25);
    let pipeline = pipeline(&frame);

    let (train, test) = frame.train_test_split(config.test_size, config.seed).unwrap();
    assert_eq!(train.n_rows(), 9);
    assert_eq!(test.n_rows(), 3);

    let report = pipeline.evaluate(&test).unwrap();
    assert_eq!(report.n_samples, 3);
    assert!(report.mse.is_finite());
    assert!(report.r2.is_finite());
}

#[test]
fn test_saved_bundle_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let pipeline = pipeline(&frame);

    let path = dir.path().join("bundle.bin");
    pipeline.save_to_file(&path).unwrap();
    let loaded = PredictionPipeline::load_from_file(&path).unwrap();

    for i in 0..frame.n_rows() {
        let record = frame.record(i).unwrap();
        assert_eq!(
            pipeline.predict(&record).unwrap().to_bits(),
            loaded.predict(&record).unwrap().to_bits()
        );
    }
}

#[test]
fn test_crime_features_record_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let pipeline = pipeline(&frame);

    let mut json = serde_json::Map::new();
    for (name, value) in frame.record(0).unwrap().iter() {
        let value = match (name, value) {
            ("year", FeatureValue::Category(label)) => {
                serde_json::json!(label.parse::<i64>().unwrap())
            }
            _ => serde_json::to_value(value).unwrap(),
        };
        json.insert(name.to_string(), value);
    }
    let features: CrimeFeatures = serde_json::from_value(json.into()).unwrap();
    assert_eq!(features.state, "Ohio");

    let record = features.to_record(pipeline.schema()).unwrap();
    assert!((pipeline.predict(&record).unwrap() - 3.0).abs() < 1e-12);
}

#[test]
fn test_reordered_coefficients_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let preprocessor = fit(&frame);

    let mut coefficients = ohio_coefficients(&preprocessor);
    if let Some(names) = coefficients.feature_names.as_mut() {
        names.swap(4, 5);
    }

    match PredictionPipeline::bundle(
        frame.schema().clone(),
        preprocessor,
        coefficients,
        TargetTransform::Log10,
    ) {
        Err(PipelineError::FeatureOrderMismatch { position, .. }) => assert_eq!(position, 4),
        other => panic!("expected FeatureOrderMismatch, got {:?}", other.err()),
    }
}

#[test]
fn test_unknown_state_follows_policy() {
    let dir = tempfile::tempdir().unwrap();
    let frame = load(dir.path());
    let strict = pipeline(&frame);

    let mut values: Vec<(String, FeatureValue)> = frame
        .default_record()
        .unwrap()
        .into_values()
        .into_iter()
        .collect();
    for (name, value) in values.iter_mut() {
        if name == "state" {
            *value = FeatureValue::from("Guam");
        }
    }
    let record = strict.record(values).unwrap();
    assert!(matches!(
        strict.predict(&record),
        Err(PipelineError::SchemaMismatch { .. })
    ));

    let preprocessor = ColumnTransformer::from_schema(frame.schema(), HandleUnknown::Ignore)
        .fit(&frame)
        .unwrap();
    let coefficients = ohio_coefficients(&preprocessor);
    let lenient = PredictionPipeline::bundle(
        frame.schema().clone(),
        preprocessor,
        coefficients,
        TargetTransform::Log10,
    )
    .unwrap();
    assert!((lenient.predict(&record).unwrap() - 2.0).abs() < 1e-12);
}
