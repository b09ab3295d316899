//! Batch Collation
//!
//! Collates samples into device tensors: waveforms as `[batch, 1, len]`
//! floats, labels as an index-aligned `[batch]` int tensor.

use burn::prelude::*;

use crate::data::dataset::Sample;
use crate::error::{EmovoxError, Result};

/// Collates sample batches onto a compute device
#[derive(Debug, Clone)]
pub struct WaveformBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> WaveformBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Build `(waveforms, labels)` tensors for one batch.
    ///
    /// All waveforms must share one length (the dataset padding invariant).
    pub fn batch(&self, samples: &[&Sample]) -> Result<(Tensor<B, 3>, Tensor<B, 1, Int>)> {
        let Some(first) = samples.first() else {
            return Err(EmovoxError::Dataset("cannot collate an empty batch".to_string()));
        };
        let len = first.waveform.len();

        let mut flat = Vec::with_capacity(samples.len() * len);
        let mut labels = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.waveform.len() != len {
                return Err(EmovoxError::Dataset(format!(
                    "waveform length mismatch in batch: {} vs {}",
                    sample.waveform.len(),
                    len
                )));
            }
            flat.extend_from_slice(&sample.waveform);
            labels.push(sample.label as i64);
        }

        let waveforms = Tensor::<B, 3>::from_data(
            TensorData::new(flat, [samples.len(), 1, len]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [samples.len()]),
            &self.device,
        );

        Ok((waveforms, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample(value: f32, len: usize, label: usize) -> Sample {
        Sample {
            waveform: vec![value; len],
            label,
        }
    }

    #[test]
    fn test_batch_shapes_and_labels() {
        let device = Default::default();
        let batcher = WaveformBatcher::<TestBackend>::new(device);

        let a = sample(0.5, 8, 2);
        let b = sample(-0.5, 8, 6);
        let (waveforms, labels) = batcher.batch(&[&a, &b]).unwrap();

        assert_eq!(waveforms.dims(), [2, 1, 8]);
        assert_eq!(labels.dims(), [2]);

        let label_values = labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(label_values, vec![2, 6]);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let batcher = WaveformBatcher::<TestBackend>::new(Default::default());
        assert!(batcher.batch(&[]).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let batcher = WaveformBatcher::<TestBackend>::new(Default::default());

        let a = sample(0.0, 8, 0);
        let b = sample(0.0, 9, 0);
        assert!(batcher.batch(&[&a, &b]).is_err());
    }
}
