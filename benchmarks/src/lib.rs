//! Benchmark fixtures for crimecast.
//!
//! Builds a synthetic state-year frame and a bundled pipeline over it, so the
//! benches measure encoding and prediction without a dataset on disk.

use crimecast::dataset::Frame;
use crimecast::domain::{crime_schema, FEATURES, TARGET};
use crimecast::model::CoefficientFile;
use crimecast::preprocessing::{ColumnTransformer, HandleUnknown};
use crimecast::{FeatureValue, InputRecord, PredictionPipeline, Result, TargetTransform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const STATES: [&str; 10] = [
    "Alabama", "California", "Florida", "Georgia", "Illinois", "New York", "Ohio", "Pennsylvania",
    "Texas", "Washington",
];

fn is_fraction(name: &str) -> bool {
    name.ends_with("_rate") || (name.ends_with("_pop") && name != "total_pop")
}

/// `n_rows` random observations over [`STATES`] and the years 2010..=2019.
pub fn synthetic_frame(n_rows: usize, seed: u64) -> Result<Frame> {
    let schema = crime_schema()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut records = Vec::with_capacity(n_rows);
    let mut target = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let mut values: Vec<(&str, FeatureValue)> = vec![
            ("state", FeatureValue::from(STATES[i % STATES.len()])),
            ("year", FeatureValue::from(2010 + (i % 10) as i64)),
        ];
        for &name in &FEATURES[2..] {
            let value = if is_fraction(name) {
                rng.gen_range(0.0..1.0)
            } else {
                rng.gen_range(0.0..1_000_000.0f64).round()
            };
            values.push((name, FeatureValue::Number(value)));
        }
        records.push(InputRecord::new(&schema, values)?);
        target.push(rng.gen_range(3.0..7.0));
    }

    Frame::from_records(schema, &records)?.with_target(TARGET, target)
}

/// Fit on `frame` and attach random coefficients.
pub fn synthetic_pipeline(frame: &Frame, seed: u64) -> Result<PredictionPipeline> {
    let preprocessor =
        ColumnTransformer::from_schema(frame.schema(), HandleUnknown::Error).fit(frame)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let names = preprocessor.feature_names_out();
    let coefficients = CoefficientFile {
        intercept: 4.5,
        coefficients: names.iter().map(|_| rng.gen_range(-0.05..0.05)).collect(),
        feature_names: Some(names),
    };
    PredictionPipeline::bundle(
        frame.schema().clone(),
        preprocessor,
        coefficients,
        TargetTransform::Log10,
    )
}
