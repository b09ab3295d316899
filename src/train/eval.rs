//! Evaluation Pass
//!
//! Runs a model over a partition in inference mode and computes metrics.
//! Callers hand in a model on a non-autodiff backend (`model.valid()`),
//! which is what disables gradient tracking and dropout in burn.

use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::data::{DataLoader, EmovoDataset, WaveformBatcher};
use crate::error::{EmovoxError, Result};
use crate::metrics::{compute_metrics, Metrics};
use crate::model::EmovoCnn;

/// Evaluate a model over one partition without parameter updates.
///
/// Every batch is visited exactly once, in the loader's fixed order. Any
/// forward-pass or data failure propagates.
pub fn evaluate<B: Backend>(
    model: &EmovoCnn<B>,
    loader: &DataLoader,
    dataset: &EmovoDataset,
    batcher: &WaveformBatcher<B>,
    criterion: &burn::nn::loss::CrossEntropyLoss<B>,
) -> Result<Metrics> {
    let mut running_loss = 0.0f64;
    let mut predictions: Vec<i64> = Vec::with_capacity(loader.len());
    let mut references: Vec<i64> = Vec::with_capacity(loader.len());

    let batches = loader.ordered_batches();
    let num_batches = batches.len();

    for batch_indices in batches {
        let samples = dataset.gather(&batch_indices)?;
        let (waveforms, labels) = batcher.batch(&samples)?;

        let logits = model.forward(waveforms);
        let loss = criterion.forward(logits.clone(), labels.clone());

        running_loss += loss.into_scalar().elem::<f64>();
        extend_predictions(logits, labels, &mut predictions, &mut references)?;
    }

    compute_metrics(&predictions, &references, running_loss, num_batches)
}

/// Append a batch's argmax predictions and true labels to the flat
/// accumulation buffers, keeping them index-aligned.
pub(crate) fn extend_predictions<B: Backend>(
    logits: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
    predictions: &mut Vec<i64>,
    references: &mut Vec<i64>,
) -> Result<()> {
    let batch_predictions = logits
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| EmovoxError::TensorData(format!("{e:?}")))?;
    let batch_references = labels
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| EmovoxError::TensorData(format!("{e:?}")))?;

    predictions.extend(batch_predictions);
    references.extend(batch_references);
    Ok(())
}
