//! `crimecast`: describe the input form, bundle a pipeline, predict and evaluate.

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use crimecast::dataset::Frame;
use crimecast::domain::{field_labels, CrimeFeatures};
use crimecast::form::Form;
use crimecast::metrics::RegressionReport;
use crimecast::model::CoefficientFile;
use crimecast::preprocessing::{ColumnTransformer, HandleUnknown};
use crimecast::{FeatureValue, PipelineConfig, PredictionPipeline, TargetTransform};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "crimecast",
    version,
    about = "Predict yearly crime counts per state from socio-economic indicators"
)]
struct Cli {
    /// Raise log verbosity to debug (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the input form (fields, domains, defaults) as JSON
    Describe {
        /// Training CSV
        #[arg(long)]
        data: PathBuf,
    },
    /// Fit the preprocessor on the training split and attach coefficients
    Bundle {
        /// Training CSV with the target column
        #[arg(long)]
        data: PathBuf,

        /// Coefficient JSON exported by the training step
        #[arg(long)]
        coefficients: PathBuf,

        /// Output artifact
        #[arg(long)]
        out: PathBuf,

        /// Policy for states not seen during fitting
        #[arg(long, value_enum)]
        handle_unknown: Option<UnknownPolicy>,

        #[command(flatten)]
        split: SplitArgs,
    },
    /// Predict one record
    Predict {
        /// Bundled artifact
        #[arg(long)]
        model: PathBuf,

        /// Training CSV; enables form defaults and range checks
        #[arg(long)]
        data: Option<PathBuf>,

        /// JSON record; may be partial when --data is given
        #[arg(long)]
        record: Option<PathBuf>,

        /// Override one feature, e.g. --set state=Ohio
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,
    },
    /// R² and MSE on the train and test splits
    Evaluate {
        /// Bundled artifact
        #[arg(long)]
        model: PathBuf,

        /// CSV with the target column
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        split: SplitArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct SplitArgs {
    /// Target column name
    #[arg(long)]
    target_column: Option<String>,

    /// Held-out share of rows, in (0, 1)
    #[arg(long)]
    test_size: Option<f64>,

    /// Shuffle seed for the split
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum UnknownPolicy {
    Error,
    Ignore,
}

impl From<UnknownPolicy> for HandleUnknown {
    fn from(policy: UnknownPolicy) -> Self {
        match policy {
            UnknownPolicy::Error => HandleUnknown::Error,
            UnknownPolicy::Ignore => HandleUnknown::Ignore,
        }
    }
}

#[derive(Debug, Serialize)]
struct BundleSummary {
    out: PathBuf,
    n_features_out: usize,
    train_rows: usize,
    test_rows: usize,
    target_transform: TargetTransform,
}

#[derive(Debug, Serialize)]
struct Prediction {
    log_prediction: f64,
    /// `null` in JSON when the inverse link overflows.
    count: f64,
    target_transform: TargetTransform,
}

#[derive(Debug, Serialize)]
struct Evaluation {
    train: RegressionReport,
    test: RegressionReport,
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, split: &SplitArgs) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(target) = &split.target_column {
        config.target_column = target.clone();
    }
    if let Some(test_size) = split.test_size {
        config.test_size = test_size;
    }
    if let Some(seed) = split.seed {
        config.seed = seed;
    }
    config.validate()?;
    tracing::debug!(?config, "effective config");
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Split `name=value` at the first `=`.
fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("empty feature name in {:?}", raw);
    }
    Ok((name, value))
}

fn describe(data: &Path) -> Result<Form> {
    let schema = crimecast::domain::crime_schema()?;
    let frame = Frame::from_csv_path(data, &schema, None)
        .with_context(|| format!("failed to load {}", data.display()))?;
    Ok(Form::from_frame(&frame, &field_labels())?)
}

fn bundle(
    config: &PipelineConfig,
    data: &Path,
    coefficients: &Path,
    out: &Path,
) -> Result<BundleSummary> {
    let schema = crimecast::domain::crime_schema()?;
    let frame = Frame::from_csv_path(data, &schema, Some(&config.target_column))
        .with_context(|| format!("failed to load {}", data.display()))?;
    let (train, test) = frame.train_test_split(config.test_size, config.seed)?;

    let preprocessor = ColumnTransformer::from_schema(&schema, config.handle_unknown).fit(&train)?;
    let coefficients = CoefficientFile::from_json_path(coefficients)
        .with_context(|| format!("failed to read coefficients {}", coefficients.display()))?;
    let pipeline =
        PredictionPipeline::bundle(schema, preprocessor, coefficients, config.target_transform)?;

    pipeline
        .save_to_file(out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    Ok(BundleSummary {
        out: out.to_path_buf(),
        n_features_out: pipeline.n_features_out(),
        train_rows: train.n_rows(),
        test_rows: test.n_rows(),
        target_transform: pipeline.target_transform(),
    })
}

fn predict(
    model: &Path,
    data: Option<&Path>,
    record: Option<&Path>,
    overrides: &[String],
) -> Result<Prediction> {
    let pipeline = PredictionPipeline::load_from_file(model)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    let schema = pipeline.schema();

    let input = match data {
        Some(data) => {
            let frame = Frame::from_csv_path(data, schema, None)
                .with_context(|| format!("failed to load {}", data.display()))?;
            let form = Form::from_frame(&frame, &field_labels())?;

            let mut values: BTreeMap<String, FeatureValue> = match record {
                Some(path) => crimecast::serialization::read_json(path)
                    .with_context(|| format!("failed to read record {}", path.display()))?,
                None => BTreeMap::new(),
            };
            for raw in overrides {
                let (name, value) = parse_assignment(raw)?;
                values.insert(name.to_string(), form.parse_value(name, value)?);
            }
            form.fill(values)?
        }
        None => {
            let path = record.ok_or_else(|| anyhow!("predict needs --data, --record or both"))?;
            let features: CrimeFeatures = crimecast::serialization::read_json(path)
                .with_context(|| format!("failed to read record {}", path.display()))?;

            let mut values: BTreeMap<String, FeatureValue> = features
                .values()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            for raw in overrides {
                let (name, value) = parse_assignment(raw)?;
                let spec = schema
                    .get(name)
                    .ok_or_else(|| anyhow!("unknown feature {}", name))?;
                values.insert(name.to_string(), FeatureValue::parse(name, spec.kind, value)?);
            }
            pipeline.record(values)?
        }
    };

    Ok(Prediction {
        log_prediction: pipeline.predict(&input)?,
        count: pipeline.predict_count(&input)?,
        target_transform: pipeline.target_transform(),
    })
}

fn evaluate(config: &PipelineConfig, model: &Path, data: &Path) -> Result<Evaluation> {
    let pipeline = PredictionPipeline::load_from_file(model)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    let frame = Frame::from_csv_path(data, pipeline.schema(), Some(&config.target_column))
        .with_context(|| format!("failed to load {}", data.display()))?;
    let (train, test) = frame.train_test_split(config.test_size, config.seed)?;

    Ok(Evaluation {
        train: pipeline.evaluate(&train)?,
        test: pipeline.evaluate(&test)?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Describe { data } => print_json(&describe(&data)?),
        Command::Bundle {
            data,
            coefficients,
            out,
            handle_unknown,
            split,
        } => {
            let mut config = load_config(config_path, &split)?;
            if let Some(policy) = handle_unknown {
                config.handle_unknown = policy.into();
            }
            print_json(&bundle(&config, &data, &coefficients, &out)?)
        }
        Command::Predict {
            model,
            data,
            record,
            overrides,
        } => print_json(&predict(
            &model,
            data.as_deref(),
            record.as_deref(),
            &overrides,
        )?),
        Command::Evaluate { model, data, split } => {
            let config = load_config(config_path, &split)?;
            print_json(&evaluate(&config, &model, &data)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use crimecast::domain::{FEATURES, TARGET};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_flags() {
        let cli = Cli::parse_from([
            "crimecast",
            "-v",
            "predict",
            "--model",
            "m.bin",
            "--set",
            "state=New York",
            "--set",
            "year=2015",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Predict { overrides, .. } => {
                assert_eq!(overrides, vec!["state=New York", "year=2015"])
            }
            other => panic!("expected predict, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("zhvi=1e5").unwrap(), ("zhvi", "1e5"));
        assert_eq!(parse_assignment(" a = b=c").unwrap(), ("a", " b=c"));
        assert!(parse_assignment("zhvi").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    fn write_fixture(dir: &Path) -> (PathBuf, PathBuf) {
        let mut csv = format!("{},{}\n", FEATURES.join(","), TARGET);
        for i in 0..10usize {
            let state = ["Ohio", "Texas"][i % 2];
            let mut cells = vec![state.to_string(), (2010 + i % 3).to_string()];
            cells.extend(FEATURES[2..].iter().enumerate().map(|(j, name)| {
                let fraction =
                    name.ends_with("_rate") || (name.ends_with("_pop") && *name != "total_pop");
                if fraction {
                    format!("{}", 0.05 * ((i + j) % 5 + 1) as f64)
                } else {
                    format!("{}", (j + 1) * 10 + i)
                }
            }));
            cells.push(format!("{}", 4.0 + 0.1 * i as f64));
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        let data = dir.join("data.csv");
        std::fs::write(&data, csv).unwrap();

        // 2 states + year + 22 numerics, intercept only
        let coefficients = dir.join("coef.json");
        std::fs::write(
            &coefficients,
            serde_json::to_string(&serde_json::json!({
                "intercept": 3.0,
                "coefficients": vec![0.0; 25],
            }))
            .unwrap(),
        )
        .unwrap();
        (data, coefficients)
    }

    #[test]
    fn test_bundle_then_predict() {
        let dir = tempfile::tempdir().unwrap();
        let (data, coefficients) = write_fixture(dir.path());
        let out = dir.path().join("bundle.bin");

        let summary = bundle(&PipelineConfig::default(), &data, &coefficients, &out).unwrap();
        assert_eq!(summary.n_features_out, 25);
        assert_eq!((summary.train_rows, summary.test_rows), (8, 2));

        let prediction = predict(&out, Some(&data), None, &["state=Texas".to_string()]).unwrap();
        assert!((prediction.log_prediction - 3.0).abs() < 1e-12);
        assert!((prediction.count - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_needs_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let (data, coefficients) = write_fixture(dir.path());
        let out = dir.path().join("bundle.bin");
        bundle(&PipelineConfig::default(), &data, &coefficients, &out).unwrap();

        assert!(predict(&out, None, None, &[]).is_err());
    }
}
