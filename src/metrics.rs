//! Classification Metrics
//!
//! Named scalar metrics computed from accumulated predictions and references.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EmovoxError, Result};

/// Named metric produced by [`compute_metrics`]
///
/// Any of these can be configured as the model-selection metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Loss,
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Loss => "loss",
            MetricKind::Accuracy => "accuracy",
            MetricKind::Precision => "precision",
            MetricKind::Recall => "recall",
            MetricKind::F1 => "f1",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from metric name to scalar value, produced fresh per call
pub type Metrics = BTreeMap<MetricKind, f64>;

/// Compute metrics over one full pass of a dataset partition.
///
/// `running_loss` is the sum of per-batch losses and `num_batches` the number
/// of batches it was accumulated over; the reported loss is the mean
/// per-batch loss. Batches may be unequal in size (ragged final batch), so
/// this is not the exact per-sample mean; the behavior is kept as-is.
///
/// Precision, recall, and F1 are macro-averaged over the classes that occur
/// in `references`; a class never predicted contributes precision 0.
pub fn compute_metrics(
    predictions: &[i64],
    references: &[i64],
    running_loss: f64,
    num_batches: usize,
) -> Result<Metrics> {
    if predictions.is_empty() {
        return Err(EmovoxError::Metric("no predictions accumulated".to_string()));
    }
    if predictions.len() != references.len() {
        return Err(EmovoxError::Metric(format!(
            "prediction/reference length mismatch: {} vs {}",
            predictions.len(),
            references.len()
        )));
    }
    if num_batches == 0 {
        return Err(EmovoxError::Metric("num_batches must be positive".to_string()));
    }

    let n = predictions.len();
    let correct = predictions
        .iter()
        .zip(references)
        .filter(|(p, r)| p == r)
        .count();

    let mut metrics = Metrics::new();
    metrics.insert(MetricKind::Loss, running_loss / num_batches as f64);
    metrics.insert(MetricKind::Accuracy, correct as f64 / n as f64);

    let (precision, recall, f1) = macro_precision_recall_f1(predictions, references);
    metrics.insert(MetricKind::Precision, precision);
    metrics.insert(MetricKind::Recall, recall);
    metrics.insert(MetricKind::F1, f1);

    Ok(metrics)
}

/// Per-class counts of true positives, false positives, and false negatives
#[derive(Debug, Clone, Copy, Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

fn macro_precision_recall_f1(predictions: &[i64], references: &[i64]) -> (f64, f64, f64) {
    let mut counts: BTreeMap<i64, ClassCounts> = BTreeMap::new();

    for (&pred, &reference) in predictions.iter().zip(references) {
        if pred == reference {
            counts.entry(pred).or_default().tp += 1;
        } else {
            counts.entry(pred).or_default().fp += 1;
            counts.entry(reference).or_default().fn_ += 1;
        }
    }

    // Average over classes present in the references.
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;
    let mut num_classes = 0usize;

    for c in counts.values() {
        if c.tp + c.fn_ == 0 {
            continue;
        }
        num_classes += 1;

        let precision = if c.tp + c.fp > 0 {
            c.tp as f64 / (c.tp + c.fp) as f64
        } else {
            0.0
        };
        let recall = c.tp as f64 / (c.tp + c.fn_) as f64;
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        precision_sum += precision;
        recall_sum += recall;
        f1_sum += f1;
    }

    if num_classes == 0 {
        return (0.0, 0.0, 0.0);
    }

    let n = num_classes as f64;
    (precision_sum / n, recall_sum / n, f1_sum / n)
}
