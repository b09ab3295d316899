//! Batch Index Loader
//!
//! Groups partition indices into batches. The training loader reshuffles
//! once per epoch with its own seeded generator; evaluation loaders yield a
//! fixed sequential order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{EmovoxError, Result};

/// Batching iterator state over one dataset partition
#[derive(Debug)]
pub struct DataLoader {
    indices: Vec<usize>,
    batch_size: usize,
    rng: Option<StdRng>,
}

impl DataLoader {
    /// Loader yielding batches in fixed partition order (evaluation)
    pub fn sequential(indices: Vec<usize>, batch_size: usize) -> Result<Self> {
        Self::new(indices, batch_size, None)
    }

    /// Loader reshuffling the partition before every epoch (training)
    pub fn shuffled(indices: Vec<usize>, batch_size: usize, seed: u64) -> Result<Self> {
        Self::new(indices, batch_size, Some(StdRng::seed_from_u64(seed)))
    }

    fn new(indices: Vec<usize>, batch_size: usize, rng: Option<StdRng>) -> Result<Self> {
        if batch_size == 0 {
            return Err(EmovoxError::Dataset("batch_size must be positive".to_string()));
        }
        Ok(Self {
            indices,
            batch_size,
            rng,
        })
    }

    /// Number of samples in the partition
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of batches per full pass (final batch may be smaller)
    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    /// Batches in fixed partition order
    pub fn ordered_batches(&self) -> Vec<Vec<usize>> {
        self.indices
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Batches for the next epoch, reshuffled when the loader was built
    /// with [`DataLoader::shuffled`]
    pub fn next_epoch(&mut self) -> Vec<Vec<usize>> {
        if let Some(rng) = self.rng.as_mut() {
            self.indices.shuffle(rng);
        }
        self.ordered_batches()
    }
}
