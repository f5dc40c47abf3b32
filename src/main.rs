//! lime-rs CLI: train a classifier on the happiness data and explain its predictions.

use clap::{Parser, Subcommand};
use lime_rs::config::AppConfig;
use lime_rs::dataset::load_happiness;
use lime_rs::render::{self, BoxplotSummary};
use lime_rs::{ExplainerOptions, LabelChoice, MlpClassifier, ProbabilisticClassifier, TabularExplainer};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lime-rs")]
#[command(about = "Explain classifier predictions with local surrogate models")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an MLP with cross-validated grid search and save it
    Train {
        /// Happiness CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output model file (JSON)
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Worker threads (overrides the config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Random seed for splitting and training (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Explain the model's predictions for selected cases
    Explain {
        /// Happiness CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Comma separated case ids; defaults to the first held-out rows
        #[arg(long, value_delimiter = ',')]
        cases: Vec<String>,

        /// Number of held-out cases when --cases is not given
        #[arg(long, default_value = "6")]
        n_cases: usize,

        /// Features per explanation
        #[arg(long, default_value = "4")]
        n_features: usize,

        /// Labels per case, most probable first
        #[arg(long, default_value = "1")]
        n_labels: usize,

        /// Write the explanations as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Seed for perturbation sampling (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show per-class feature distributions
    Summary {
        /// Happiness CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Plot width in characters
        #[arg(long, default_value = "40")]
        width: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = AppConfig::load_or_default(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Train { data, model, workers, seed } => cmd_train(config, &data, &model, workers, seed),
        Commands::Explain {
            data,
            model,
            cases,
            n_cases,
            n_features,
            n_labels,
            csv,
            seed,
        } => cmd_explain(
            config,
            &data,
            &model,
            &cases,
            n_cases,
            n_features,
            n_labels,
            csv.as_deref(),
            seed,
        ),
        Commands::Summary { data, width } => cmd_summary(config, &data, width),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_train(
    mut config: AppConfig,
    data_path: &Path,
    model_path: &Path,
    workers: Option<usize>,
    seed: Option<u64>,
) -> lime_rs::Result<()> {
    if workers.is_some() {
        config.train.workers = workers;
    }
    if let Some(seed) = seed {
        config.train.seed = seed;
    }
    let data = load_happiness(data_path, config.bands)?;
    let split = config.train.split();
    let (train, test) = split.apply(&data)?;
    log::info!("Training on {} rows, holding out {}", train.n_rows(), test.n_rows());

    let report = config.train.grid_search().run(&train)?;
    let best = &report.scores[report.best_index];
    println!(
        "Best candidate: hidden {:?}, decay {} (cv accuracy {:.3})",
        best.params.hidden, best.params.weight_decay, best.mean_accuracy
    );
    if test.n_rows() > 0 {
        let accuracy = report.model.accuracy(&test.features, &test.labels)?;
        println!("Held-out accuracy: {:.3} on {} rows", accuracy, test.n_rows());
    }
    report.model.with_training_split(split).save(model_path)?;
    println!("Model written to {}", model_path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_explain(
    mut config: AppConfig,
    data_path: &Path,
    model_path: &Path,
    cases: &[String],
    n_cases: usize,
    n_features: usize,
    n_labels: usize,
    csv_path: Option<&Path>,
    seed: Option<u64>,
) -> lime_rs::Result<()> {
    if seed.is_some() {
        config.lime.seed = seed;
    }
    let data = load_happiness(data_path, config.bands)?;
    let model = MlpClassifier::load(model_path)?;
    model.check_matches(&data)?;
    let split = model.training_split().unwrap_or_else(|| {
        log::warn!("Model file does not record its training split; using the configured one.");
        config.train.split()
    });
    let (train, test) = split.apply(&data)?;

    let selected = if cases.is_empty() {
        test.head(n_cases)
    } else {
        data.rows_named(cases)?
    };

    let explainer = TabularExplainer::new(
        &model,
        &train.features,
        ExplainerOptions {
            feature_names: Some(train.feature_names.clone()),
            categorical_features: Vec::new(),
            config: config.lime.clone(),
        },
    )?;
    let explanations = explainer.explain_many(
        &selected.ids,
        &selected.features,
        &LabelChoice::Top(n_labels),
        n_features,
    )?;

    let class_names = model.class_names();
    for (explanation, &actual) in explanations.iter().zip(&selected.labels) {
        log::info!(
            "{}: predicted {}, actual {}",
            explanation.case,
            class_names[explanation.predicted_label],
            class_names[actual]
        );
        print!("{}", render::explanation_table(explanation));
        print!("{}", render::feature_bars(explanation, 30));
        println!();
    }
    print!("{}", render::explanation_heatmap(&explanations));

    if let Some(path) = csv_path {
        render::write_explanations_csv(File::create(path)?, &explanations)?;
        println!("Explanations written to {}", path.display());
    }
    Ok(())
}

fn cmd_summary(config: AppConfig, data_path: &Path, width: usize) -> lime_rs::Result<()> {
    let data = load_happiness(data_path, config.bands)?;
    let counts = data.class_counts();
    for (name, count) in data.class_names.iter().zip(counts) {
        println!("{}: {} rows", name, count);
    }
    println!();
    print!("{}", render::render_boxplots(&BoxplotSummary::from_data(&data), width));
    Ok(())
}
