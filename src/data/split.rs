//! Dataset Partitioning
//!
//! Random disjoint train/test/val index assignment with deterministic sizes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{EmovoxError, Result};

/// Disjoint index partitions covering a full dataset
///
/// Layout mirrors the split arithmetic of the training pipeline:
///
/// ```text
/// |------- dataset -------|
/// |---train---|-val-|-test|
/// ```
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub val: Vec<usize>,
}

impl DatasetSplit {
    /// Randomly partition `dataset_size` indices.
    ///
    /// `train = trunc(train_ratio * n)`; of the remainder,
    /// `test = trunc(test_val_ratio * rest)` and validation absorbs the
    /// rounding leftover. Assignment is a seeded permutation; sizes are
    /// deterministic for given ratios.
    pub fn random(
        dataset_size: usize,
        train_ratio: f64,
        test_val_ratio: f64,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if dataset_size == 0 {
            return Err(EmovoxError::Dataset("cannot split an empty dataset".to_string()));
        }
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(EmovoxError::Dataset(format!(
                "train_ratio {train_ratio} outside (0, 1)"
            )));
        }
        if !(test_val_ratio > 0.0 && test_val_ratio < 1.0) {
            return Err(EmovoxError::Dataset(format!(
                "test_val_ratio {test_val_ratio} outside (0, 1)"
            )));
        }

        let train_size = (train_ratio * dataset_size as f64) as usize;
        let test_val_size = dataset_size - train_size;
        let test_size = (test_val_size as f64 * test_val_ratio) as usize;

        let mut indices: Vec<usize> = (0..dataset_size).collect();
        indices.shuffle(rng);

        let val = indices.split_off(train_size + test_size);
        let test = indices.split_off(train_size);
        let train = indices;

        Ok(Self { train, test, val })
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.test.len() + self.val.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_reference_split_sizes() {
        // 100 samples, train 0.7, test_val 0.5 => 70 / 15 / 15.
        let split = DatasetSplit::random(100, 0.7, 0.5, &mut rng()).unwrap();

        assert_eq!(split.train.len(), 70);
        assert_eq!(split.test.len(), 15);
        assert_eq!(split.val.len(), 15);
    }

    #[test]
    fn test_sizes_sum_for_any_valid_ratios() {
        for n in [1usize, 3, 10, 99, 100, 257] {
            for train_ratio in [0.1, 0.33, 0.5, 0.7, 0.9] {
                for test_val_ratio in [0.2, 0.5, 0.8] {
                    let split =
                        DatasetSplit::random(n, train_ratio, test_val_ratio, &mut rng()).unwrap();
                    assert_eq!(split.total(), n, "n={n} tr={train_ratio} tv={test_val_ratio}");
                }
            }
        }
    }

    #[test]
    fn test_val_absorbs_rounding_remainder() {
        // n=10, train=0.7 -> 7 train, 3 left; test_val=0.5 -> test=1, val=2.
        let split = DatasetSplit::random(10, 0.7, 0.5, &mut rng()).unwrap();

        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test.len(), 1);
        assert_eq!(split.val.len(), 2);
    }

    #[test]
    fn test_partitions_disjoint_and_cover() {
        let split = DatasetSplit::random(57, 0.6, 0.4, &mut rng()).unwrap();

        let mut seen = BTreeSet::new();
        for &i in split.train.iter().chain(&split.test).chain(&split.val) {
            assert!(seen.insert(i), "index {i} assigned twice");
        }
        assert_eq!(seen, (0..57).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = DatasetSplit::random(40, 0.7, 0.5, &mut rng()).unwrap();
        let b = DatasetSplit::random(40, 0.7, 0.5, &mut rng()).unwrap();

        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
        assert_eq!(a.val, b.val);
    }

    #[test]
    fn test_invalid_ratios_rejected() {
        assert!(DatasetSplit::random(10, 0.0, 0.5, &mut rng()).is_err());
        assert!(DatasetSplit::random(10, 0.7, 1.0, &mut rng()).is_err());
        assert!(DatasetSplit::random(0, 0.7, 0.5, &mut rng()).is_err());
    }
}
