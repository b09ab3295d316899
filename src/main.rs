use burn::backend::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::{Parser, Subcommand};
use emovox::config::{AppConfig, LoggingConfig};
use emovox::data::{Emotion, EmovoDataset};
use emovox::error::{EmovoxError, Result};
use emovox::train;
use tracing::info;
use tracing_subscriber::EnvFilter;

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser)]
#[command(name = "emovox")]
#[command(version = "0.1.0")]
#[command(about = "Speech emotion recognition trainer for the EMOVO corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    config_dir: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the emotion classifier and persist the best checkpoint
    Train,
    /// Print dataset statistics without training
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        return Err(EmovoxError::Validation(errors.join("; ")));
    }

    match cli.command {
        Commands::Train => run_train(&config),
        Commands::Inspect => run_inspect(&config),
    }
}

fn run_train(config: &AppConfig) -> Result<()> {
    let device = parse_device(&config.training.device)?;
    let report = train::run::<TrainBackend>(config, device)?;

    info!(
        "Best val {}: {:.4} ({:.1}s)",
        report.evaluation_metric, report.best_val_metric, report.elapsed_secs
    );
    Ok(())
}

fn run_inspect(config: &AppConfig) -> Result<()> {
    let dataset = EmovoDataset::load(&config.data.data_dir, config.data.resample)?;

    info!("Dataset: {} samples", dataset.len());
    info!("Max sample length: {}", dataset.max_sample_len());
    info!("Sample rate: {} Hz", dataset.sample_rate());
    for (emotion, count) in Emotion::ALL.iter().zip(dataset.class_counts()) {
        info!("{:<10} {}", emotion.to_string(), count);
    }
    Ok(())
}

fn parse_device(name: &str) -> Result<NdArrayDevice> {
    match name {
        "cpu" => Ok(NdArrayDevice::Cpu),
        other => Err(EmovoxError::Validation(format!(
            "unsupported device '{other}' (this build targets the CPU ndarray backend)"
        ))),
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},emovox=debug", config.level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
