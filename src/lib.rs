pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod train;

pub use config::{AppConfig, OptimizerKind};
pub use data::{
    DataLoader, DatasetSplit, Emotion, EmovoDataset, Sample, WaveformBatcher, NUM_EMOTIONS,
    TARGET_SAMPLE_RATE,
};
pub use error::{EmovoxError, Result};
pub use metrics::{compute_metrics, MetricKind, Metrics};
pub use model::{EmovoCnn, EmovoCnnConfig};
pub use train::{
    evaluate, run, train_one_epoch, BestModelTracker, Checkpointer, TrainReport,
    WarmupLinearDecay,
};
