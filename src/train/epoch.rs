//! Training Epoch
//!
//! One full pass over the training partition with gradient updates and
//! per-batch learning-rate stepping.

use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::data::{DataLoader, EmovoDataset, WaveformBatcher};
use crate::error::Result;
use crate::metrics::{compute_metrics, Metrics};
use crate::model::EmovoCnn;
use crate::train::eval::extend_predictions;
use crate::train::scheduler::WarmupLinearDecay;

/// Run one training epoch and return the updated model with its metrics.
///
/// Batches come in the loader's per-epoch shuffled order. Per batch:
/// forward, loss, backward, optimizer step at the scheduler's current rate,
/// then loss/prediction accumulation. The scheduler advances exactly once
/// per batch. NaN or Inf losses propagate through the metrics untouched.
pub fn train_one_epoch<B, O>(
    model: EmovoCnn<B>,
    loader: &mut DataLoader,
    dataset: &EmovoDataset,
    batcher: &WaveformBatcher<B>,
    criterion: &burn::nn::loss::CrossEntropyLoss<B>,
    optimizer: &mut O,
    scheduler: &mut WarmupLinearDecay,
) -> Result<(EmovoCnn<B>, Metrics)>
where
    B: AutodiffBackend,
    O: Optimizer<EmovoCnn<B>, B>,
{
    let mut model = model;
    let mut running_loss = 0.0f64;
    let mut predictions: Vec<i64> = Vec::with_capacity(loader.len());
    let mut references: Vec<i64> = Vec::with_capacity(loader.len());

    let batches = loader.next_epoch();
    let num_batches = batches.len();

    for batch_indices in batches {
        let samples = dataset.gather(&batch_indices)?;
        let (waveforms, labels) = batcher.batch(&samples)?;

        let logits = model.forward(waveforms);
        let loss = criterion.forward(logits.clone(), labels.clone());

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let lr = scheduler.next_lr();
        model = optimizer.step(lr, model, grads);

        running_loss += loss.into_scalar().elem::<f64>();
        extend_predictions(logits, labels, &mut predictions, &mut references)?;
    }

    let metrics = compute_metrics(&predictions, &references, running_loss, num_batches)?;
    Ok((model, metrics))
}
