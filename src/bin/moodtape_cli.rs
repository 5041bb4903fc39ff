use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use moodtape::analysis::batch;
use moodtape::config::CoreConfig;
use moodtape::engine::{Mood, MoodEngine, TimeOfDay};

#[derive(Parser, Debug)]
#[command(
    name = "moodtape_cli",
    about = "Analyze audio files for mood and spectral descriptors"
)]
struct Cli {
    /// Path to a JSON config file (defaults are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract features from a WAV file and print the summary as JSON
    Analyze {
        file: PathBuf,
        /// Also emit the per-window feature records
        #[arg(long)]
        frames: bool,
    },
    /// Classify the mood of a WAV file
    Mood {
        file: PathBuf,
        /// Hour of day (0-23) for the time bias; local time when omitted
        #[arg(long)]
        hour: Option<u32>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

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
        .as_ref()
        .map(CoreConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Analyze { file, frames } => run_analyze(&config, &file, frames),
        Commands::Mood { file, hour } => run_mood(&config, &file, hour),
    }
}

fn analyze(config: &CoreConfig, file: &PathBuf) -> Result<batch::FileAnalysis> {
    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
    let cancel = Arc::new(AtomicBool::new(false));
    let analysis = runtime
        .block_on(batch::analyze_file(
            file,
            config.analysis.frame_size,
            cancel,
        ))
        .with_context(|| format!("analyzing {}", file.display()))?
        .context("analysis was cancelled")?;
    Ok(analysis)
}

fn run_analyze(config: &CoreConfig, file: &PathBuf, frames: bool) -> Result<ExitCode> {
    let analysis = analyze(config, file)?;

    if frames {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        #[derive(Serialize)]
        struct Summary<'a> {
            file: String,
            sample_rate: u32,
            duration_secs: f32,
            windows: usize,
            features: &'a moodtape::AudioFeatures,
        }
        let summary = Summary {
            file: file.display().to_string(),
            sample_rate: analysis.sample_rate,
            duration_secs: analysis.duration_secs,
            windows: analysis.frames.len(),
            features: &analysis.summary,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(ExitCode::from(0))
}

fn run_mood(config: &CoreConfig, file: &PathBuf, hour: Option<u32>) -> Result<ExitCode> {
    let analysis = analyze(config, file)?;
    let time = hour.map(TimeOfDay::from_hour).unwrap_or_else(TimeOfDay::now);

    let mut engine = MoodEngine::with_params(
        config.mood.confidence_threshold,
        config.mood.stability_factor,
        config.mood.history_size,
    );
    for features in &analysis.frames {
        engine.detect_mood_at(features, time);
    }

    #[derive(Serialize)]
    struct MoodReport {
        file: String,
        mood: Mood,
        confidence: f32,
        keywords: Vec<&'static str>,
        distribution: Vec<(Mood, f32)>,
    }
    let report = MoodReport {
        file: file.display().to_string(),
        mood: engine.current_mood(),
        confidence: engine.confidence(),
        keywords: engine.current_mood().keywords().to_vec(),
        distribution: engine.distribution().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}
