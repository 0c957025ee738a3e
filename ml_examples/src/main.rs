// ml_examples/src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::{Path, PathBuf};
use titanic_mlp::{
    binary_cross_entropy, export_predictions, generate_synthetic_scores, load_labeled_scores, load_passengers,
    predict, prepare_files, score_validation, write_labeled_scores, write_roc_points, DatasetSummary,
    EvaluationContext, EvaluationSession, PipelineConfig, MLP,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Titanic survival scoring and threshold evaluation
#[derive(Parser)]
#[command(name = "titanic", version, about)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON pipeline config; unset fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview rows, shape, survival rate, missing values and grouped survival
    Inspect {
        #[arg(long)]
        train: PathBuf,
        /// Number of rows to preview
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Write a randomly initialised scoring network sized for the encoded features
    InitModel {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 16)]
        hidden: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Score the validation split once, then report metrics per threshold
    Evaluate {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        model: PathBuf,
        /// Thresholds to report; defaults to the configured threshold
        #[arg(long, num_args = 1..)]
        threshold: Vec<f64>,
        /// Cache validation labels and scores as CSV
        #[arg(long)]
        scores_out: Option<PathBuf>,
        /// Write the ROC points as CSV
        #[arg(long)]
        roc_out: Option<PathBuf>,
    },
    /// Evaluate a cached `label,probability` CSV without a model
    EvaluateScores {
        #[arg(long)]
        scores: PathBuf,
        #[arg(long, num_args = 1..)]
        threshold: Vec<f64>,
        #[arg(long)]
        roc_out: Option<PathBuf>,
    },
    /// Evaluate synthetic scores with a chosen class separation
    Synthetic {
        #[arg(long, default_value_t = 1000)]
        n: usize,
        #[arg(long, default_value_t = 0.4)]
        positive_rate: f64,
        #[arg(long, default_value_t = 0.3)]
        separation: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Score the test file and export submission.csv and probabilities.csv
    Predict {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long)]
        model: PathBuf,
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
}

/// `-v` overrides `RUST_LOG`; without it the environment decides.
fn log_filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn init_tracing(verbose: u8) {
    fmt().with_env_filter(log_filter(verbose)).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn report(ctx: EvaluationContext, thresholds: &[f64], roc_out: Option<&Path>) -> Result<()> {
    println!("Validation samples: {}", ctx.len());
    println!("Validation log loss: {:.4}", binary_cross_entropy(ctx.samples()));
    let mut session = EvaluationSession::new(ctx);
    for &t in thresholds {
        let r = session.update_threshold(t);
        println!("\n=== Threshold {:.2} ===", r.threshold);
        print!("{}", r.matrix);
        print!("{}", r.metrics);
        println!("AUC:       {:.4}", session.roc().auc);
    }
    if let Some(path) = roc_out {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_roc_points(file, session.roc())?;
        println!("\nROC points written to {}", path.display());
    }
    Ok(())
}

fn thresholds_or_default(given: Vec<f64>, config: &PipelineConfig) -> Vec<f64> {
    if given.is_empty() {
        vec![config.threshold]
    } else {
        given
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { train, rows } => {
            let data = load_passengers(&train, &config)?;
            println!("=== {} ===", train.display());
            println!("Data Preview (First {} Rows)", rows);
            print!("{}", data.preview(rows));
            println!();
            print!("{}", DatasetSummary::from_dataset(&data));
        }
        Commands::InitModel { train, out, hidden, seed } => {
            let prepared = prepare_files(&train, None, &config)?;
            let mut rng = StdRng::seed_from_u64(seed);
            let mlp = MLP::random(prepared.encoder.feature_count(), &[hidden], &mut rng);
            println!("{}", mlp);
            mlp.save_pere(&out)?;
        }
        Commands::Evaluate {
            train,
            model,
            threshold,
            scores_out,
            roc_out,
        } => {
            let prepared = prepare_files(&train, None, &config)?;
            let mlp = MLP::load_pere(&model)?;
            println!("{}", mlp);
            let ctx = score_validation(&mlp, &prepared.validation)?;
            if let Some(path) = scores_out {
                let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                write_labeled_scores(file, ctx.samples())?;
            }
            report(ctx, &thresholds_or_default(threshold, &config), roc_out.as_deref())?;
        }
        Commands::EvaluateScores {
            scores,
            threshold,
            roc_out,
        } => {
            let (labels, probs) = load_labeled_scores(&scores)?;
            let ctx = EvaluationContext::new(&labels, &probs)?;
            report(ctx, &thresholds_or_default(threshold, &config), roc_out.as_deref())?;
        }
        Commands::Synthetic {
            n,
            positive_rate,
            separation,
            seed,
        } => {
            let (labels, probs) = generate_synthetic_scores(n, positive_rate, separation, seed)?;
            let ctx = EvaluationContext::new(&labels, &probs)?;
            report(ctx, &[0.25, 0.5, 0.75], None)?;
        }
        Commands::Predict {
            train,
            test,
            model,
            out_dir,
        } => {
            let prepared = prepare_files(&train, Some(test.as_path()), &config)?;
            let mlp = MLP::load_pere(&model)?;
            let predictions = predict(&mlp, &prepared.test)?;
            println!("Prediction Results (first 10 rows)");
            println!("{:>12} {:>9} {:>12}", "PassengerId", "Survived", "Probability");
            for p in predictions.iter().take(10) {
                println!(
                    "{:>12} {:>9} {:>12.4}",
                    p.passenger_id,
                    titanic_mlp::classify(p.probability, config.threshold),
                    p.probability
                );
            }
            println!("Total predictions: {}", predictions.len());
            let (sub, probs) = export_predictions(&out_dir, &predictions, config.threshold)?;
            println!("Saved: {}, {}", sub.display(), probs.display());
        }
    }
    Ok(())
}
