//! `rule-induce` — command-line entry point for inducing and evaluating
//! rule classifiers over ARFF data.
//!
//! ## Usage
//!
//! ```bash
//! rule-induce induce --train train.arff --grow g2 --prune precision --seed 0.5
//! rule-induce predict --train train.arff --test test.arff
//! rule-induce cross-validate --train train.arff --folds 10 --runs 5
//! ```

use clap::{Parser, Subcommand};
use rule_induction::api::{
    self, CrossValidationParams, GenerateRulesParams, PredictParams,
};
use rule_induction::arff;
use rule_induction::config::Config;
use rule_induction::cross_validation::CrossValidationSettings;
use rule_induction::measures::QualityMeasure;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rule-induce")]
#[command(about = "Sequential-covering rule induction over ARFF datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file; falls back to `config.toml` / env vars.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Induce a rule set from a training file and print it.
    Induce {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        grow: Option<String>,
        #[arg(long)]
        prune: Option<String>,
        #[arg(long)]
        seed: Option<f64>,
    },
    /// Induce on `--train`, classify `--test`, and report accuracy.
    Predict {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long)]
        grow: Option<String>,
        #[arg(long)]
        prune: Option<String>,
        #[arg(long)]
        seed: Option<f64>,
    },
    /// Stratified k-fold cross-validation over a single file.
    CrossValidate {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        folds: Option<usize>,
        #[arg(long)]
        runs: Option<usize>,
        #[arg(long)]
        every_class_in_fold: bool,
        #[arg(long)]
        grow: Option<String>,
        #[arg(long)]
        prune: Option<String>,
        #[arg(long)]
        seed: Option<f64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = cli
        .config
        .as_ref()
        .and_then(|path| Config::from_file(path.to_string_lossy().as_ref()).ok())
        .or_else(|| Config::load().ok())
        .unwrap_or_default();

    init_tracing(&config);

    if let Err(err) = run(cli.command, &config) {
        tracing::error!(error = %err, "rule-induce failed");
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn resolve_measure(requested: Option<&str>, default: &str) -> anyhow::Result<QualityMeasure> {
    let identifier = requested.unwrap_or(default);
    QualityMeasure::from_identifier(identifier)
        .ok_or_else(|| anyhow::anyhow!("unknown quality measure `{identifier}`"))
}

fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Induce {
            train,
            grow,
            prune,
            seed,
        } => {
            let dataset = arff::load_from_arff(&train)?;
            let grow_measure = resolve_measure(grow.as_deref(), &config.induction.default_grow_measure)?;
            let prune_measure = resolve_measure(prune.as_deref(), &config.induction.default_prune_measure)?;
            let params = GenerateRulesParams {
                grow_measure,
                prune_measure,
                seed: seed.unwrap_or(config.induction.default_seed),
            };
            tracing::info!(rows = dataset.num_examples(), "inducing rules");
            let generated = api::generate_rules(&dataset, None, params)?;
            for ((rule, precision), coverage) in generated
                .classifier
                .to_vector_of_strings(&dataset)
                .iter()
                .zip(&generated.stats.precisions)
                .zip(&generated.stats.coverages)
            {
                println!("{rule}  (precision {precision:.4}, coverage {coverage:.4})");
            }
            Ok(())
        }
        Command::Predict {
            train,
            test,
            grow,
            prune,
            seed,
        } => {
            let train_dataset = arff::load_from_arff(&train)?;
            let test_dataset = arff::load_from_arff(&test)?;
            let grow_measure = resolve_measure(grow.as_deref(), &config.induction.default_grow_measure)?;
            let prune_measure = resolve_measure(prune.as_deref(), &config.induction.default_prune_measure)?;
            let params = GenerateRulesParams {
                grow_measure,
                prune_measure,
                seed: seed.unwrap_or(config.induction.default_seed),
            };
            let generated = api::generate_rules(&train_dataset, None, params)?;
            let num_classes = train_dataset.decision_attribute().levels().len();
            let ground_truth: Vec<f64> = test_dataset.examples().iter().map(|e| e.decision()).collect();
            let predict_params = PredictParams {
                ground_truth: Some(ground_truth),
                num_classes,
            };
            let result = api::predict(&generated.classifier, &test_dataset, &predict_params);
            println!("accuracy: {:.4}", result.accuracy);
            println!("average_accuracy: {:.4}", result.average_accuracy);
            println!("coverage: {:.4}", result.coverage);
            Ok(())
        }
        Command::CrossValidate {
            train,
            folds,
            runs,
            every_class_in_fold,
            grow,
            prune,
            seed,
        } => {
            let dataset = arff::load_from_arff(&train)?;
            let grow_measure = resolve_measure(grow.as_deref(), &config.induction.default_grow_measure)?;
            let prune_measure = resolve_measure(prune.as_deref(), &config.induction.default_prune_measure)?;
            let settings = CrossValidationSettings {
                folds: folds.unwrap_or(config.cross_validation.folds),
                runs: runs.unwrap_or(config.cross_validation.runs),
                every_class_in_fold: every_class_in_fold || config.cross_validation.every_class_in_fold,
            };
            let num_classes = dataset.decision_attribute().levels().len();
            let params = CrossValidationParams {
                grow_measure,
                prune_measure,
                settings,
                seed: seed.unwrap_or(config.induction.default_seed),
            };
            let result = api::cross_validation(&dataset, None, num_classes, params)?;
            println!("accuracy: {:.4}", result.accuracy);
            println!("average_accuracy: {:.4}", result.average_accuracy);
            for (run_index, run) in result.runs.iter().enumerate() {
                for (fold_index, fold) in run.folds.iter().enumerate() {
                    println!(
                        "run {run_index} fold {fold_index}: {} rules, accuracy {:.4}",
                        fold.rules.len(),
                        fold.accuracy
                    );
                }
            }
            Ok(())
        }
    }
}
