use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::metrics::MetricKind;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Root directory of the EMOVO corpus (scanned recursively for WAV files)
    pub data_dir: String,
    /// Fraction of the dataset assigned to the training partition
    pub train_ratio: f64,
    /// Fraction of the *remaining* samples assigned to the test partition;
    /// validation absorbs the rounding remainder
    pub test_val_ratio: f64,
    /// Resample recordings to the 16 kHz target rate while loading
    #[serde(default = "default_resample")]
    pub resample: bool,
}

fn default_resample() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Dropout probability applied before the classification head
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    /// Channel width of the first convolution block (doubled per block)
    #[serde(default = "default_base_channels")]
    pub base_channels: usize,
}

fn default_dropout() -> f64 {
    0.3
}

fn default_base_channels() -> usize {
    16
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dropout: default_dropout(),
            base_channels: default_base_channels(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Samples per batch (final batch of a partition may be smaller)
    pub batch_size: usize,
    /// Optimizer used for parameter updates
    pub optimizer: OptimizerKind,
    /// Base learning rate, scaled per step by the warmup/decay schedule
    pub lr: f64,
    /// Number of passes over the training partition
    pub epochs: usize,
    /// Fraction of total steps spent ramping the learning rate up from 0
    pub warmup_ratio: f64,
    /// Validation metric that drives best-model selection
    pub evaluation_metric: MetricKind,
    /// Whether a lower value of `evaluation_metric` is better
    pub best_metric_lower_is_better: bool,
    /// Directory the checkpoint and run report are written to
    pub checkpoint_dir: String,
    /// Checkpoint file stem
    pub model_name: String,
    /// Compute device identifier
    #[serde(default = "default_device")]
    pub device: String,
    /// Seed for backend RNG, dataset split, and per-epoch shuffling
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Registry of supported optimizers.
///
/// Deserialized directly from configuration, so an unknown name is rejected
/// at startup rather than mid-training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    AdamW,
    Sgd,
}

impl OptimizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizerKind::Adam => "adam",
            OptimizerKind::AdamW => "adamw",
            OptimizerKind::Sgd => "sgd",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("data.data_dir", "data/EMOVO")?
            .set_default("data.train_ratio", 0.7)?
            .set_default("data.test_val_ratio", 0.5)?
            .set_default("data.resample", true)?
            .set_default("model.dropout", 0.3)?
            .set_default("model.base_channels", 16_i64)?
            .set_default("training.batch_size", 16_i64)?
            .set_default("training.optimizer", "adam")?
            .set_default("training.lr", 1e-3)?
            .set_default("training.epochs", 10_i64)?
            .set_default("training.warmup_ratio", 0.1)?
            .set_default("training.evaluation_metric", "loss")?
            .set_default("training.best_metric_lower_is_better", true)?
            .set_default("training.checkpoint_dir", "checkpoints")?
            .set_default("training.model_name", "emovo_cnn")?
            .set_default("training.device", "cpu")?
            .set_default("training.seed", 42_i64)?
            .set_default("logging.level", "info")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("EMOVOX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (EMOVOX_TRAINING__LR, etc.)
            .add_source(
                Environment::with_prefix("EMOVOX")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.data.train_ratio > 0.0 && self.data.train_ratio < 1.0) {
            errors.push("data.train_ratio must be between 0 and 1".to_string());
        }

        if !(self.data.test_val_ratio > 0.0 && self.data.test_val_ratio < 1.0) {
            errors.push("data.test_val_ratio must be between 0 and 1".to_string());
        }

        if !(self.model.dropout >= 0.0 && self.model.dropout < 1.0) {
            errors.push("model.dropout must be in [0, 1)".to_string());
        }

        if self.model.base_channels == 0 {
            errors.push("model.base_channels must be positive".to_string());
        }

        if self.training.batch_size == 0 {
            errors.push("training.batch_size must be positive".to_string());
        }

        if self.training.epochs == 0 {
            errors.push("training.epochs must be positive".to_string());
        }

        if !(self.training.lr > 0.0 && self.training.lr.is_finite()) {
            errors.push("training.lr must be positive and finite".to_string());
        }

        if !(self.training.warmup_ratio >= 0.0 && self.training.warmup_ratio < 1.0) {
            errors.push("training.warmup_ratio must be in [0, 1)".to_string());
        }

        if self.training.model_name.is_empty() {
            errors.push("training.model_name must not be empty".to_string());
        }

        if self.training.device != "cpu" {
            errors.push(format!(
                "training.device '{}' is unsupported (this build targets the CPU ndarray backend)",
                self.training.device
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
