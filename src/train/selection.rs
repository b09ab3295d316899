//! Best-Model Selection
//!
//! Tracks the best validation metric seen so far and retains a parameter
//! snapshot of the winning model.

use burn::prelude::*;
use tracing::info;

use crate::error::{EmovoxError, Result};
use crate::metrics::{MetricKind, Metrics};
use crate::model::EmovoCnn;

/// Tracks `(best metric value, best model snapshot)` across epochs.
///
/// Selection stores a clone of the module; burn modules are functional
/// values, so the snapshot is immune to later optimizer steps.
///
/// Comparison is non-strict (`<=`) when lower is better, so ties prefer the
/// newer model, and strict (`>`) when higher is better, so ties keep the
/// incumbent.
#[derive(Debug)]
pub struct BestModelTracker<B: Backend> {
    metric: MetricKind,
    lower_is_better: bool,
    best_value: f64,
    best_model: EmovoCnn<B>,
}

impl<B: Backend> BestModelTracker<B> {
    pub fn new(metric: MetricKind, lower_is_better: bool, initial_model: &EmovoCnn<B>) -> Self {
        let best_value = if lower_is_better {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        Self {
            metric,
            lower_is_better,
            best_value,
            best_model: initial_model.clone(),
        }
    }

    /// Compare an epoch's validation metrics against the best seen so far.
    ///
    /// Returns whether the candidate won. Fails if the tracked metric is
    /// absent from `val_metrics`.
    pub fn observe(&mut self, model: &EmovoCnn<B>, val_metrics: &Metrics) -> Result<bool> {
        let metric = *val_metrics
            .get(&self.metric)
            .ok_or(EmovoxError::MissingMetric(self.metric))?;

        let is_best = if self.lower_is_better {
            metric <= self.best_value
        } else {
            metric > self.best_value
        };

        if is_best {
            info!("New best model found with val {}: {:.4}", self.metric, metric);
            self.best_value = metric;
            self.best_model = model.clone();
        }

        Ok(is_best)
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn best_value(&self) -> f64 {
        self.best_value
    }

    pub fn best_model(&self) -> &EmovoCnn<B> {
        &self.best_model
    }

    pub fn into_best_model(self) -> EmovoCnn<B> {
        self.best_model
    }
}
