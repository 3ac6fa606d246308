use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use stereo_pipeline::{
    run_leveling_replay, run_measurement, MeasurementInput, PipelineConfig, SensorReading,
};

/// Stereo measurement and leveling tools.
#[derive(Debug, Parser)]
#[command(author, version, about = "Stereo optical geometry pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recover the rig from sensor descriptors and measure points and masks.
    Measure {
        /// Path to JSON file containing MeasurementInput.
        #[arg(long)]
        input: PathBuf,

        /// Optional path to JSON PipelineConfig. Defaults are used if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Replay gravity / magnetic / light readings through the leveling gate.
    Level {
        /// Path to JSON array of sensor readings.
        #[arg(long)]
        input: PathBuf,

        /// JSON-lines file telemetry records are appended to.
        #[arg(long)]
        telemetry: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            debug!("no config given, using defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn run_measure_from_files(input_path: &Path, config_path: Option<&Path>) -> Result<String> {
    let input: MeasurementInput = load_json_file(input_path)?;
    let config = load_config(config_path)?;
    let report = run_measurement(&input, &config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn run_level_from_files(
    input_path: &Path,
    telemetry_path: &Path,
    config_path: Option<&Path>,
) -> Result<String> {
    let readings: Vec<SensorReading> = load_json_file(input_path)?;
    let config = load_config(config_path)?;
    let report = run_leveling_replay(&readings, telemetry_path, &config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let json = match &args.command {
        Command::Measure { input, config } => run_measure_from_files(input, config.as_deref())?,
        Command::Level {
            input,
            telemetry,
            config,
        } => run_level_from_files(input, telemetry, config.as_deref())?,
    };
    println!("{}", json);
    Ok(())
}
