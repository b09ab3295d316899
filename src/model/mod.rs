//! Model Architectures
//!
//! The CNN emotion classifier operating on raw waveforms.

pub mod cnn;

pub use cnn::{EmovoCnn, EmovoCnnConfig};
