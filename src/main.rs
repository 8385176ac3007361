use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use grove_data::{
    DatasetReader, ExperimentName, ResultWriter, TrainingSummary, train_test_split,
};
use grove_forest::{
    ForestParams, OobMode, RandomForest, SplitCriterion, accuracy, unique_labels,
};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Random forest classification for delimited tabular data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for splitting and training
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = 100)]
    max_depth: usize,

    /// Minimum samples a node needs before it may split
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Features sampled per node (all if not set)
    #[arg(long)]
    n_feats: Option<usize>,

    /// Split criterion: "entropy" or "gini"
    #[arg(long, default_value = "entropy")]
    criterion: String,

    /// Compute the out-of-bag accuracy
    #[arg(long, default_value_t = false)]
    oob: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a forest on a labeled file and score it on a held-out part
    Train {
        /// Path to the input file (features then a label column)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Field delimiter (single character, or "tab")
        #[arg(long, default_value = ",")]
        delimiter: String,

        /// Fraction of rows held out for scoring
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Where to save the fitted model (not saved if not set)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Predict labels for unlabeled rows with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the input file (feature columns only)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Field delimiter (single character, or "tab")
        #[arg(long, default_value = ",")]
        delimiter: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    summary: &'a TrainingSummary,
    model: Option<&'a PathBuf>,
}

#[derive(Serialize)]
struct PredictOutput<'a> {
    experiment: &'a str,
    n_rows: usize,
    model_n_trees: usize,
    model_n_features: Option<usize>,
    predictions: &'a [String],
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "entropy" => Ok(SplitCriterion::Entropy),
        "gini" => Ok(SplitCriterion::Gini),
        other => anyhow::bail!("unknown criterion: {other} (expected entropy or gini)"),
    }
}

fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        _ if s == "tab" || s == "\\t" => Ok(b'\t'),
        [byte] => Ok(*byte),
        _ => anyhow::bail!("delimiter must be a single ASCII character, got {s:?}"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_train(
    seed: u64,
    data: PathBuf,
    experiment: String,
    delimiter: String,
    test_size: f64,
    model: Option<PathBuf>,
    output_dir: PathBuf,
    forest_args: ForestArgs,
) -> Result<()> {
    let experiment = ExperimentName::new(experiment).context("invalid experiment name")?;
    let criterion = parse_criterion(&forest_args.criterion)?;

    let dataset = DatasetReader::new(&data)
        .with_delimiter(parse_delimiter(&delimiter)?)
        .read()
        .with_context(|| format!("failed to read {}", data.display()))?;
    let (train, test) =
        train_test_split(&dataset, test_size, seed).context("failed to split dataset")?;
    let (Some(train_labels), Some(test_labels)) = (train.labels(), test.labels()) else {
        anyhow::bail!("{} has no label column", data.display());
    };
    info!(
        n_train = train.n_samples(),
        n_test = test.n_samples(),
        n_features = train.n_features(),
        "dataset split"
    );

    let oob_mode = if forest_args.oob {
        OobMode::Enabled
    } else {
        OobMode::Disabled
    };
    let params = ForestParams::new(forest_args.n_trees)
        .context("invalid forest configuration")?
        .with_max_depth(forest_args.max_depth)
        .with_min_samples_split(forest_args.min_samples_split)
        .with_n_feats(forest_args.n_feats)
        .with_criterion(criterion)
        .with_seed(seed)
        .with_oob_mode(oob_mode);

    let mut forest = RandomForest::new(params);
    forest
        .fit(train.features(), train_labels)
        .context("forest training failed")?;

    let predictions = forest
        .predict(test.features())
        .context("prediction on held-out rows failed")?;
    let test_accuracy = accuracy(test_labels, &predictions).context("scoring failed")?;

    if let Some(path) = &model {
        forest
            .save(path)
            .with_context(|| format!("failed to save model to {}", path.display()))?;
    }

    let summary = TrainingSummary {
        n_train: train.n_samples(),
        n_test: test.n_samples(),
        n_features: train.n_features(),
        n_trees: forest.n_trees(),
        criterion: forest_args.criterion,
        seed,
        test_accuracy,
        oob_accuracy: forest.oob_score().map(|s| s.accuracy),
        classes: unique_labels(train_labels),
    };

    let writer = ResultWriter::new(&output_dir, experiment.clone())?;
    writer.write_training(&summary)?;

    let output = TrainOutput {
        experiment: experiment.as_str(),
        summary: &summary,
        model: model.as_ref(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_predict(
    model: PathBuf,
    data: PathBuf,
    experiment: String,
    delimiter: String,
    output_dir: PathBuf,
) -> Result<()> {
    let experiment = ExperimentName::new(experiment).context("invalid experiment name")?;

    let forest: RandomForest<String> = RandomForest::load(&model)
        .with_context(|| format!("failed to load model from {}", model.display()))?;
    let rows = DatasetReader::new(&data)
        .with_delimiter(parse_delimiter(&delimiter)?)
        .with_labels(false)
        .read()
        .with_context(|| format!("failed to read {}", data.display()))?;

    let predictions = forest
        .predict(rows.features())
        .context("prediction failed")?;

    let writer = ResultWriter::new(&output_dir, experiment.clone())?;
    writer.write_predictions(&predictions)?;

    let output = PredictOutput {
        experiment: experiment.as_str(),
        n_rows: predictions.len(),
        model_n_trees: forest.n_trees(),
        model_n_features: forest.n_features(),
        predictions: &predictions,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
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

    match cli.command {
        Command::Train {
            data,
            experiment,
            delimiter,
            test_size,
            model,
            output_dir,
            forest,
        } => run_train(
            cli.seed, data, experiment, delimiter, test_size, model, output_dir, forest,
        ),
        Command::Predict {
            model,
            data,
            experiment,
            delimiter,
            output_dir,
        } => run_predict(model, data, experiment, delimiter, output_dir),
    }
}
