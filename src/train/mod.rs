//! Training Orchestration
//!
//! Owns the full run lifecycle: dataset split, loader construction,
//! optimizer/scheduler construction, the epoch loop, final test evaluation
//! on the best model, and checkpoint persistence.

pub mod checkpointing;
pub mod epoch;
pub mod eval;
pub mod scheduler;
pub mod selection;

pub use checkpointing::Checkpointer;
pub use epoch::train_one_epoch;
pub use eval::evaluate;
pub use scheduler::WarmupLinearDecay;
pub use selection::BestModelTracker;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, AdamWConfig, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::config::{AppConfig, OptimizerKind};
use crate::data::{DataLoader, DatasetSplit, EmovoDataset, WaveformBatcher};
use crate::error::{EmovoxError, Result};
use crate::metrics::{MetricKind, Metrics};
use crate::model::{EmovoCnn, EmovoCnnConfig};

/// Summary of a completed training run, also persisted as JSON next to the
/// checkpoint
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub model_name: String,
    pub device: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub epochs: usize,
    pub dataset_size: usize,
    pub train_size: usize,
    pub val_size: usize,
    pub test_size: usize,
    pub total_steps: usize,
    pub warmup_steps: usize,
    pub scheduler_steps: usize,
    pub evaluation_metric: MetricKind,
    pub best_val_metric: f64,
    pub test_metrics: Metrics,
    pub checkpoint_path: PathBuf,
}

/// Result of the epoch loop: best-model state plus schedule bookkeeping
struct FitOutcome<B: Backend> {
    tracker: BestModelTracker<B>,
    total_steps: usize,
    warmup_steps: usize,
    scheduler_steps: usize,
}

/// Run a full training lifecycle and persist the best model.
///
/// Sequence: load dataset, split, build loaders, build model, resolve the
/// optimizer, build the scheduler, run the epoch loop (train / validate /
/// select), evaluate the best snapshot on the test partition, write the
/// checkpoint and run report.
pub fn run<B: AutodiffBackend>(config: &AppConfig, device: B::Device) -> Result<TrainReport> {
    let started_at = Utc::now();
    let start = Instant::now();
    let training = &config.training;

    B::seed(training.seed);
    let mut rng = StdRng::seed_from_u64(training.seed);

    let dataset = EmovoDataset::load(&config.data.data_dir, config.data.resample)?;
    let split = DatasetSplit::random(
        dataset.len(),
        config.data.train_ratio,
        config.data.test_val_ratio,
        &mut rng,
    )?;

    for (name, partition) in [
        ("train", &split.train),
        ("test", &split.test),
        ("val", &split.val),
    ] {
        if partition.is_empty() {
            return Err(EmovoxError::Dataset(format!(
                "{name} partition is empty (dataset size {}, ratios too extreme)",
                dataset.len()
            )));
        }
    }

    info!("Device: {}", training.device);
    info!("Train size: {}", split.train.len());
    info!("Validation size: {}", split.val.len());
    info!("Test size: {}", split.test.len());

    let model = EmovoCnnConfig::new(dataset.max_sample_len())
        .with_dropout(config.model.dropout)
        .with_base_channels(config.model.base_channels)
        .init::<B>(&device);

    let fitted = match training.optimizer {
        OptimizerKind::Adam => fit::<B, _>(
            config,
            &dataset,
            &split,
            &device,
            model,
            AdamConfig::new().init::<B, EmovoCnn<B>>(),
        )?,
        OptimizerKind::AdamW => fit::<B, _>(
            config,
            &dataset,
            &split,
            &device,
            model,
            AdamWConfig::new().init::<B, EmovoCnn<B>>(),
        )?,
        OptimizerKind::Sgd => fit::<B, _>(
            config,
            &dataset,
            &split,
            &device,
            model,
            SgdConfig::new().init::<B, EmovoCnn<B>>(),
        )?,
    };

    // Final test evaluation uses the retained best snapshot, not the last
    // epoch's model.
    let test_loader = DataLoader::sequential(split.test.clone(), training.batch_size)?;
    let test_batcher = WaveformBatcher::<B::InnerBackend>::new(device.clone());
    let test_criterion = CrossEntropyLossConfig::new().init::<B::InnerBackend>(&device);
    let best_inference = fitted.tracker.best_model().valid();
    let test_metrics = evaluate(
        &best_inference,
        &test_loader,
        &dataset,
        &test_batcher,
        &test_criterion,
    )?;

    for (kind, value) in &test_metrics {
        info!("Test {}: {:.4}", kind, value);
    }

    let checkpointer = Checkpointer::new(&training.checkpoint_dir)?;
    let checkpoint_path = checkpointer.save(&best_inference, &training.model_name)?;
    info!("Model saved");

    let report = TrainReport {
        model_name: training.model_name.clone(),
        device: training.device.clone(),
        started_at,
        elapsed_secs: start.elapsed().as_secs_f64(),
        epochs: training.epochs,
        dataset_size: dataset.len(),
        train_size: split.train.len(),
        val_size: split.val.len(),
        test_size: split.test.len(),
        total_steps: fitted.total_steps,
        warmup_steps: fitted.warmup_steps,
        scheduler_steps: fitted.scheduler_steps,
        evaluation_metric: fitted.tracker.metric(),
        best_val_metric: fitted.tracker.best_value(),
        test_metrics,
        checkpoint_path,
    };

    let report_path = checkpointer.report_path(&training.model_name);
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

    Ok(report)
}

/// Epoch loop over the training and validation partitions
fn fit<B, O>(
    config: &AppConfig,
    dataset: &EmovoDataset,
    split: &DatasetSplit,
    device: &B::Device,
    model: EmovoCnn<B>,
    mut optimizer: O,
) -> Result<FitOutcome<B>>
where
    B: AutodiffBackend,
    O: Optimizer<EmovoCnn<B>, B>,
{
    let training = &config.training;

    let mut train_loader =
        DataLoader::shuffled(split.train.clone(), training.batch_size, training.seed)?;
    let val_loader = DataLoader::sequential(split.val.clone(), training.batch_size)?;

    let batcher = WaveformBatcher::<B>::new(device.clone());
    let val_batcher = WaveformBatcher::<B::InnerBackend>::new(device.clone());
    let criterion = CrossEntropyLossConfig::new().init::<B>(device);
    let val_criterion = CrossEntropyLossConfig::new().init::<B::InnerBackend>(device);

    let total_steps = train_loader.num_batches() * training.epochs;
    let mut scheduler = WarmupLinearDecay::new(training.lr, total_steps, training.warmup_ratio);
    info!(
        "Total steps: {} (warmup: {})",
        total_steps,
        scheduler.warmup_steps()
    );

    let mut tracker = BestModelTracker::new(
        training.evaluation_metric,
        training.best_metric_lower_is_better,
        &model,
    );

    let mut model = model;
    for epoch in 0..training.epochs {
        info!("Epoch {}/{}", epoch + 1, training.epochs);

        let (trained, train_metrics) = train_one_epoch(
            model,
            &mut train_loader,
            dataset,
            &batcher,
            &criterion,
            &mut optimizer,
            &mut scheduler,
        )?;
        model = trained;

        let val_metrics = evaluate(
            &model.valid(),
            &val_loader,
            dataset,
            &val_batcher,
            &val_criterion,
        )?;

        info!(
            "Train loss: {:.4} - Train accuracy: {:.4}",
            metric(&train_metrics, MetricKind::Loss),
            metric(&train_metrics, MetricKind::Accuracy)
        );
        info!(
            "Val loss: {:.4} - Val accuracy: {:.4}",
            metric(&val_metrics, MetricKind::Loss),
            metric(&val_metrics, MetricKind::Accuracy)
        );

        tracker.observe(&model, &val_metrics)?;
    }

    Ok(FitOutcome {
        total_steps,
        warmup_steps: scheduler.warmup_steps(),
        scheduler_steps: scheduler.steps_taken(),
        tracker,
    })
}

fn metric(metrics: &Metrics, kind: MetricKind) -> f64 {
    metrics.get(&kind).copied().unwrap_or(f64::NAN)
}
