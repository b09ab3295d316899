//! Dataset Loading and Batching
//!
//! EMOVO corpus loading, train/test/val partitioning, and batch collation
//! into backend tensors.

pub mod batcher;
pub mod dataset;
pub mod loader;
pub mod split;

pub use batcher::WaveformBatcher;
pub use dataset::{Emotion, EmovoDataset, Sample, NUM_EMOTIONS, TARGET_SAMPLE_RATE};
pub use loader::DataLoader;
pub use split::DatasetSplit;
