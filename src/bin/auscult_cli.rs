use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use auscult::analysis::augment;
use auscult::audio::AudioClip;
use auscult::config::AppConfig;
use auscult::model::{save_random_artifact, Classifier};
use auscult::{FeatureExtractor, FeatureVector};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "auscult_cli",
    about = "Offline feature extraction and inference harness for auscult"
)]
struct Cli {
    /// Override configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the fixed-length feature vector from a WAV file
    Features {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Extract the training-time augmentation batch from a WAV file
    Augment {
        #[arg(long)]
        input: PathBuf,
        /// Seed for the noise variant; omit for entropy seeding
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a randomly initialized classifier artifact for development
    InitModel {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 128)]
        hidden: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run the full pipeline on a WAV file and print class probabilities
    Predict {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        model: PathBuf,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Features { input, output } => run_features(&config, &input, output),
        Commands::Augment {
            input,
            seed,
            output,
        } => run_augment(&config, &input, seed, output),
        Commands::InitModel {
            output,
            hidden,
            seed,
        } => run_init_model(&output, hidden, seed),
        Commands::Predict { input, model } => run_predict(&config, &input, &model),
    }
}

fn run_features(config: &AppConfig, input: &PathBuf, output: Option<PathBuf>) -> Result<ExitCode> {
    let extractor = FeatureExtractor::new(&config.pipeline);
    let features = extractor
        .extract_file(input)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    let report = FeatureReportPayload {
        input: input.display().to_string(),
        feature_count: features.as_slice().len(),
        features,
    };
    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn run_augment(
    config: &AppConfig,
    input: &PathBuf,
    seed: Option<u64>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let extractor = FeatureExtractor::new(&config.pipeline);
    let clip = AudioClip::load(input, &config.pipeline)
        .with_context(|| format!("loading {}", input.display()))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let batch = augment::extract_augmented(&extractor, &clip, &mut rng)
        .with_context(|| format!("augmenting {}", input.display()))?;

    let report = AugmentReportPayload {
        input: input.display().to_string(),
        seed,
        original: batch.original,
        with_noise: batch.with_noise,
        stretched_and_pitched: batch.stretched_and_pitched,
    };
    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn run_init_model(output: &PathBuf, hidden: usize, seed: u64) -> Result<ExitCode> {
    save_random_artifact(output, hidden, seed)
        .with_context(|| format!("writing artifact to {}", output.display()))?;
    println!(
        "Wrote classifier artifact (hidden width {}) to {}",
        hidden,
        output.display()
    );
    Ok(ExitCode::from(0))
}

fn run_predict(config: &AppConfig, input: &PathBuf, model: &PathBuf) -> Result<ExitCode> {
    let extractor = FeatureExtractor::new(&config.pipeline);
    let classifier = Classifier::load(model)
        .with_context(|| format!("loading classifier from {}", model.display()))?;

    let features = extractor
        .extract_file(input)
        .with_context(|| format!("extracting features from {}", input.display()))?;
    let prediction = classifier.predict(&features).context("running inference")?;

    let report = PredictReportPayload {
        input: input.display().to_string(),
        top_label: prediction.top_label(),
        probabilities: prediction.to_map(),
    };
    emit_json(&report, None)?;
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(payload: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    if let Some(path) = output {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

#[derive(Serialize)]
struct FeatureReportPayload {
    input: String,
    feature_count: usize,
    features: FeatureVector,
}

#[derive(Serialize)]
struct AugmentReportPayload {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    original: FeatureVector,
    with_noise: FeatureVector,
    stretched_and_pitched: FeatureVector,
}

#[derive(Serialize)]
struct PredictReportPayload {
    input: String,
    top_label: &'static str,
    probabilities: std::collections::BTreeMap<String, f32>,
}
