//! Single-record prediction from a bundled pipeline.
//!
//! This example walks through the inference workflow:
//! - Build a small state-year dataset in memory
//! - Fit the column transformer (one-hot state, ordinal year, scaled numerics)
//! - Attach externally estimated coefficients
//! - Derive the input form and fill it with a few overrides
//! - Predict the log-scale target and the crime count
//! - Save the bundle and load it back
//!
//! Run with: cargo run --example single_prediction

use crimecast::{
    dataset::Frame,
    domain::{crime_schema, field_labels, CrimeFeatures, TARGET},
    form::{FieldDomain, Form},
    model::CoefficientFile,
    preprocessing::{ColumnTransformer, HandleUnknown},
    FeatureValue, PredictionPipeline, TargetTransform,
};
use std::error::Error;

fn observation(state: &str, year: i64, scale: f64) -> CrimeFeatures {
    CrimeFeatures {
        state: state.to_string(),
        year,
        total_pop: 5_000_000.0 * scale,
        white_pop: 0.70,
        black_pop: 0.10 * scale,
        hispanic_pop: 0.12,
        asian_pop: 0.04,
        native_pop: 0.01,
        islander_pop: 0.001,
        multi_race_pop: 0.02,
        median_income: 50_000.0 + 5_000.0 * scale,
        poverty_rate: 0.12 + 0.01 * scale,
        unemployment_rate: 0.05,
        unemployed_15_weeks: 40_000.0 * scale,
        labor_force_participation_rate: 0.63,
        hs_grad_rate: 0.88,
        bachelors_grad_rate: 0.30,
        zhvi: 200_000.0 * scale,
        crude_rate_suicide: 14.0,
        crude_rate_od: 20.0 + scale,
        youth_not_in_school: 30_000.0 * scale,
        youth_in_foster_care: 8_000.0,
        youth_living_in_poverty: 300_000.0 * scale,
        youth_school_poverty_interaction: 12_000.0 * scale,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Crime Count Prediction ===\n");

    // 1. Training data
    let schema = crime_schema()?;
    let rows = [
        observation("Ohio", 2015, 1.0),
        observation("Ohio", 2016, 1.1),
        observation("Texas", 2015, 2.5),
        observation("Texas", 2016, 2.6),
        observation("Utah", 2015, 0.5),
        observation("Utah", 2016, 0.6),
    ];
    let records = rows
        .iter()
        .map(|r| r.to_record(&schema))
        .collect::<Result<Vec<_>, _>>()?;
    let frame = Frame::from_records(schema.clone(), &records)?
        .with_target(TARGET, vec![5.40, 5.42, 5.95, 5.97, 4.90, 4.93])?;
    println!("Training frame: {} rows", frame.n_rows());

    // 2. Preprocessor
    let preprocessor = ColumnTransformer::from_schema(&schema, HandleUnknown::Error).fit(&frame)?;
    println!("Encoded width: {}", preprocessor.n_features_out());

    // 3. Coefficients, as exported by the training step
    let names = preprocessor.feature_names_out();
    let coefficients = CoefficientFile {
        intercept: 5.3,
        coefficients: names
            .iter()
            .map(|name| match name.as_str() {
                "state_Texas" => 0.4,
                "state_Utah" => -0.3,
                "total_pop" => 0.15,
                "poverty_rate" => 0.05,
                _ => 0.0,
            })
            .collect(),
        feature_names: Some(names),
    };
    let pipeline =
        PredictionPipeline::bundle(schema, preprocessor, coefficients, TargetTransform::Log10)?;

    // 4. Form
    let form = Form::from_frame(&frame, &field_labels())?;
    for field in form.fields().iter().take(4) {
        match &field.domain {
            FieldDomain::Options { options } => {
                println!("{:<32} one of {:?} (default {})", field.label, options, field.default)
            }
            FieldDomain::IntegerRange { min, max } => {
                println!("{:<32} {}..={} (default {})", field.label, min, max, field.default)
            }
            FieldDomain::Number { min, max, .. } => println!(
                "{:<32} {:?}..{:?} (default {})",
                field.label, min, max, field.default
            ),
        }
    }

    // 5. Predict
    let record = form.fill([
        ("state", FeatureValue::from("Texas")),
        ("year", FeatureValue::from(2016.0)),
        ("poverty_rate", FeatureValue::from(0.16)),
    ])?;
    let log_count = pipeline.predict(&record)?;
    let count = pipeline.predict_count(&record)?;
    println!("\nTexas 2016: log10 = {:.4}, crimes = {:.0}", log_count, count);

    let report = pipeline.evaluate(&frame)?;
    println!("In-sample R² = {:.4}, MSE = {:.6}", report.r2, report.mse);

    // 6. Persist and reload
    let path = std::env::temp_dir().join("crimecast_single_prediction.bin");
    pipeline.save_to_file(&path)?;
    let loaded = PredictionPipeline::load_from_file(&path)?;
    assert_eq!(loaded.predict(&record)?.to_bits(), log_count.to_bits());
    println!("Reloaded bundle from {}", path.display());

    std::fs::remove_file(&path)?;
    Ok(())
}
