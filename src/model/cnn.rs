//! Waveform CNN Classifier
//!
//! Small 1-D convolutional network mapping a batch of raw waveforms to
//! per-emotion logits: three strided conv blocks, adaptive pooling, and a
//! dropout-regularized linear head.

use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::pool::{AdaptiveAvgPool1d, AdaptiveAvgPool1dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig1d,
    Relu,
};
use burn::prelude::*;

use crate::data::dataset::NUM_EMOTIONS;

/// Emotion classifier configuration
#[derive(Config, Debug)]
pub struct EmovoCnnConfig {
    /// Fixed waveform length the model is built for
    pub waveform_size: usize,
    /// Dropout probability for the classification head
    #[config(default = "0.3")]
    pub dropout: f64,
    /// Channel width of the first conv block (doubled per block)
    #[config(default = "16")]
    pub base_channels: usize,
    /// Hidden dimension of the classification head
    #[config(default = "128")]
    pub hidden_dim: usize,
    /// Number of output classes
    #[config(default = "NUM_EMOTIONS")]
    pub num_classes: usize,
}

/// Emotion classifier over raw waveforms
#[derive(Module, Debug)]
pub struct EmovoCnn<B: Backend> {
    conv1: Conv1d<B>,
    bn1: BatchNorm<B, 1>,
    conv2: Conv1d<B>,
    bn2: BatchNorm<B, 1>,
    conv3: Conv1d<B>,
    bn3: BatchNorm<B, 1>,
    pool: AdaptiveAvgPool1d,
    dropout: Dropout,
    fc_hidden: Linear<B>,
    fc_out: Linear<B>,
    activation: Relu,
}

impl EmovoCnnConfig {
    /// Initialize the classifier on a device
    pub fn init<B: Backend>(&self, device: &B::Device) -> EmovoCnn<B> {
        let c1 = self.base_channels;
        let c2 = self.base_channels * 2;
        let c3 = self.base_channels * 4;
        let pool_len = pooled_len(self.waveform_size);

        let conv1 = Conv1dConfig::new(1, c1, 11)
            .with_stride(4)
            .with_padding(PaddingConfig1d::Explicit(5))
            .init(device);
        let conv2 = Conv1dConfig::new(c1, c2, 5)
            .with_stride(2)
            .with_padding(PaddingConfig1d::Explicit(2))
            .init(device);
        let conv3 = Conv1dConfig::new(c2, c3, 3)
            .with_stride(2)
            .with_padding(PaddingConfig1d::Explicit(1))
            .init(device);

        EmovoCnn {
            conv1,
            bn1: BatchNormConfig::new(c1).init(device),
            conv2,
            bn2: BatchNormConfig::new(c2).init(device),
            conv3,
            bn3: BatchNormConfig::new(c3).init(device),
            pool: AdaptiveAvgPool1dConfig::new(pool_len).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc_hidden: LinearConfig::new(c3 * pool_len, self.hidden_dim).init(device),
            fc_out: LinearConfig::new(self.hidden_dim, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// Adaptive pool target length; shrinks for very short inputs so the conv
/// stack (16x total stride) always produces enough frames.
fn pooled_len(waveform_size: usize) -> usize {
    (waveform_size / 16).clamp(1, 4)
}

impl<B: Backend> EmovoCnn<B> {
    /// Forward pass: `[batch, 1, len]` waveforms to `[batch, num_classes]`
    /// logits
    pub fn forward(&self, waveforms: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.conv1.forward(waveforms);
        let x = self.bn1.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv3.forward(x);
        let x = self.bn3.forward(x);
        let x = self.activation.forward(x);

        let x = self.pool.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 2);

        let x = self.dropout.forward(x);
        let x = self.fc_hidden.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);
        self.fc_out.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = EmovoCnnConfig::new(1024).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 3>::zeros([4, 1, 1024], &device);
        let logits = model.forward(input);

        assert_eq!(logits.dims(), [4, NUM_EMOTIONS]);
    }

    #[test]
    fn test_forward_handles_short_waveforms() {
        let device = Default::default();
        let model = EmovoCnnConfig::new(32).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 3>::zeros([2, 1, 32], &device);
        let logits = model.forward(input);

        assert_eq!(logits.dims(), [2, NUM_EMOTIONS]);
    }

    #[test]
    fn test_config_defaults() {
        let config = EmovoCnnConfig::new(2048);

        assert_eq!(config.dropout, 0.3);
        assert_eq!(config.base_channels, 16);
        assert_eq!(config.num_classes, NUM_EMOTIONS);
    }

    #[test]
    fn test_pooled_len_bounds() {
        assert_eq!(pooled_len(8), 1);
        assert_eq!(pooled_len(48), 3);
        assert_eq!(pooled_len(1_000_000), 4);
    }
}
