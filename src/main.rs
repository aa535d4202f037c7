use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use beasiswa_io::{ApplicantReader, ExperimentName, FeatureReader, ResultWriter};
use beasiswa_tree::{Attribute, Holdout, Label, ModelStore, Record, TrainedModel};

#[derive(Parser)]
#[command(name = "beasiswa")]
#[command(about = "Scholarship applicant selection by gain-ratio decision-tree induction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel prediction (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Training data and output arguments shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the labelled applicant CSV file
    #[arg(long)]
    data: PathBuf,

    /// Attributes to induce over, e.g. "ipk:continuous,penghasilan,organisasi"
    /// (kind defaults to categorical)
    #[arg(long, value_delimiter = ',', required = true)]
    attributes: Vec<String>,

    /// Name of the label column
    #[arg(long, default_value = "status")]
    label_column: String,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Induce a decision tree and write it with its calculation steps
    Train {
        #[command(flatten)]
        args: DataArgs,
    },

    /// Train, then evaluate on a test file or a stratified hold-out split
    Evaluate {
        #[command(flatten)]
        args: DataArgs,

        /// Path to a labelled test CSV file (hold-out split of --data if absent)
        #[arg(long)]
        test_data: Option<PathBuf>,

        /// Fraction of --data held out for testing when --test-data is absent
        #[arg(long, default_value_t = 0.3, conflicts_with = "test_data")]
        test_fraction: f64,
    },

    /// Train, then decide on unlabelled applicants
    Predict {
        #[command(flatten)]
        args: DataArgs,

        /// Path to the unlabelled applicant CSV file
        #[arg(long)]
        input: PathBuf,

        /// Name of the applicant id column in --input
        #[arg(long, default_value = "id")]
        id_column: String,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_samples: usize,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    rules: Vec<String>,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_train: usize,
    n_test: usize,
    accuracy_percent: f64,
    precision_percent: f64,
    recall_percent: f64,
    f1_percent: f64,
    n_fallbacks: usize,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_applicants: usize,
    n_accept: usize,
    n_reject: usize,
    n_fallbacks: usize,
}

fn parse_attribute(spec: &str) -> Result<Attribute> {
    let (name, kind) = match spec.split_once(':') {
        Some((name, kind)) => (name.trim(), kind.trim()),
        None => (spec.trim(), "categorical"),
    };
    if name.is_empty() {
        anyhow::bail!("empty attribute name in --attributes entry \"{spec}\"");
    }
    match kind {
        "continuous" | "numeric" => Ok(Attribute::continuous(name)),
        "categorical" | "discrete" => Ok(Attribute::categorical(name)),
        other => anyhow::bail!(
            "unknown attribute kind: {other} (expected continuous or categorical)"
        ),
    }
}

fn parse_attributes(specs: &[String]) -> Result<Vec<Attribute>> {
    specs.iter().map(|s| parse_attribute(s)).collect()
}

fn make_writer(args: &DataArgs) -> Result<ResultWriter> {
    let experiment =
        ExperimentName::new(args.experiment.clone()).context("invalid experiment name")?;
    ResultWriter::new(&args.output_dir, experiment).context("failed to create result writer")
}

fn read_records(path: &Path, attributes: &[Attribute], label_column: &str) -> Result<Vec<Record>> {
    ApplicantReader::new(path, attributes, label_column)
        .read()
        .with_context(|| format!("failed to read applicants from {}", path.display()))
}

fn train(
    store: &ModelStore,
    records: &[Record],
    attributes: Vec<Attribute>,
) -> Result<std::sync::Arc<TrainedModel>> {
    let model = store
        .train(records, attributes)
        .context("training failed")?;
    info!(
        n_samples = model.n_samples,
        n_nodes = model.tree.n_nodes(),
        depth = model.tree.depth(),
        "decision tree trained"
    );
    Ok(model)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let store = ModelStore::new();

    match cli.command {
        Command::Train { args } => {
            let attributes = parse_attributes(&args.attributes)?;
            let writer = make_writer(&args)?;
            let records = read_records(&args.data, &attributes, &args.label_column)?;

            let model = train(&store, &records, attributes)?;
            writer.write_tree(&model).context("failed to write tree")?;

            let output = TrainOutput {
                experiment: args.experiment,
                n_samples: model.n_samples,
                n_nodes: model.tree.n_nodes(),
                n_leaves: model.tree.n_leaves(),
                depth: model.tree.depth(),
                rules: model.tree.rules().iter().map(ToString::to_string).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            args,
            test_data,
            test_fraction,
        } => {
            let attributes = parse_attributes(&args.attributes)?;
            let writer = make_writer(&args)?;
            let records = read_records(&args.data, &attributes, &args.label_column)?;

            let (train_set, test_set) = match &test_data {
                Some(path) => {
                    let test = read_records(path, &attributes, &args.label_column)?;
                    (records, test)
                }
                None => {
                    let holdout = Holdout::new(test_fraction)
                        .context("invalid --test-fraction")?
                        .with_seed(cli.seed);
                    holdout.split(&records)
                }
            };
            info!(n_train = train_set.len(), n_test = test_set.len(), "datasets ready");

            let model = train(&store, &train_set, attributes)?;
            writer.write_tree(&model).context("failed to write tree")?;

            let evaluation = store.evaluate(&test_set).context("evaluation failed")?;
            writer
                .write_evaluation(&evaluation)
                .context("failed to write evaluation")?;
            info!(
                accuracy = evaluation.accuracy,
                f1 = evaluation.f1,
                "evaluation complete"
            );

            let output = EvaluateOutput {
                experiment: args.experiment,
                n_train: train_set.len(),
                n_test: test_set.len(),
                accuracy_percent: evaluation.accuracy_percent(),
                precision_percent: evaluation.precision_percent(),
                recall_percent: evaluation.recall_percent(),
                f1_percent: evaluation.f1_percent(),
                n_fallbacks: evaluation
                    .predictions
                    .iter()
                    .filter(|p| p.prediction.fallback)
                    .count(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            args,
            input,
            id_column,
        } => {
            let attributes = parse_attributes(&args.attributes)?;
            let writer = make_writer(&args)?;
            let records = read_records(&args.data, &attributes, &args.label_column)?;

            let applicants = FeatureReader::new(&input, &attributes, &id_column)
                .read()
                .with_context(|| format!("failed to read applicants from {}", input.display()))?;

            let model = train(&store, &records, attributes)?;
            let predictions = model.tree.predict_batch(applicants.features());
            writer
                .write_predictions(applicants.ids(), &predictions)
                .context("failed to write predictions")?;

            let n_accept = predictions
                .iter()
                .filter(|p| p.decision == Label::Accept)
                .count();
            let output = PredictOutput {
                experiment: args.experiment,
                n_applicants: predictions.len(),
                n_accept,
                n_reject: predictions.len() - n_accept,
                n_fallbacks: predictions.iter().filter(|p| p.fallback).count(),
            };
            info!(n_applicants = output.n_applicants, n_accept, "prediction complete");
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
