use std::path::PathBuf;

use thiserror::Error;

use crate::metrics::MetricKind;

/// Main error type for the trainer
#[derive(Error, Debug)]
pub enum EmovoxError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    // Dataset / loader errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Audio decode error: {0}")]
    Audio(#[from] hound::Error),

    // Metric errors
    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Evaluation metric '{0}' missing from computed metrics")]
    MissingMetric(MetricKind),

    // Tensor errors
    #[error("Tensor data error: {0}")]
    TensorData(String),

    // Checkpoint errors
    #[error("Checkpoint error: {0}")]
    Record(#[from] burn::record::RecorderError),

    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for EmovoxError
pub type Result<T> = std::result::Result<T, EmovoxError>;
