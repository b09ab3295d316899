//! Model Checkpointing
//!
//! Save and load model parameter records for persistence.

use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use tracing::info;

use crate::error::{EmovoxError, Result};

/// Checkpointer for saving and loading model parameters
#[derive(Debug, Clone)]
pub struct Checkpointer {
    /// Directory for checkpoints
    checkpoint_dir: PathBuf,
}

impl Checkpointer {
    /// Create a new checkpointer, creating the directory if absent
    pub fn new<P: AsRef<Path>>(checkpoint_dir: P) -> Result<Self> {
        let checkpoint_dir = checkpoint_dir.as_ref().to_path_buf();
        fs::create_dir_all(&checkpoint_dir)?;
        Ok(Self { checkpoint_dir })
    }

    /// Get checkpoint path for a given name
    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{name}.mpk"))
    }

    /// Get run-report path for a given name
    pub fn report_path(&self, name: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{name}.report.json"))
    }

    /// Save a model's parameter record, overwriting any existing file
    pub fn save<B, M>(&self, model: &M, name: &str) -> Result<PathBuf>
    where
        B: Backend,
        M: Module<B>,
    {
        let path = self.checkpoint_path(name);

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        model.clone().save_file(&path, &recorder)?;

        info!("Saved checkpoint to {:?}", path);
        Ok(path)
    }

    /// Load a parameter record into a freshly constructed model of the same
    /// architecture
    pub fn load<B, M>(&self, model: M, name: &str, device: &B::Device) -> Result<M>
    where
        B: Backend,
        M: Module<B>,
    {
        let path = self.checkpoint_path(name);
        if !path.exists() {
            return Err(EmovoxError::CheckpointNotFound(path));
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder.load(path, device)?;
        Ok(model.load_record(record))
    }

    /// Check if a checkpoint exists
    pub fn exists(&self, name: &str) -> bool {
        self.checkpoint_path(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmovoCnn, EmovoCnnConfig};
    use std::env::temp_dir;

    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn unique_dir(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("emovox_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_checkpoint_path() {
        let checkpointer = Checkpointer::new(unique_dir("ckpt_path")).unwrap();
        let path = checkpointer.checkpoint_path("model_v1");

        assert!(path.to_string_lossy().contains("model_v1.mpk"));
    }

    #[test]
    fn test_save_creates_file() {
        let checkpointer = Checkpointer::new(unique_dir("ckpt_save")).unwrap();
        let model: EmovoCnn<TestBackend> = EmovoCnnConfig::new(64).init(&Default::default());

        assert!(!checkpointer.exists("m"));
        checkpointer.save(&model, "m").unwrap();
        assert!(checkpointer.exists("m"));
    }

    #[test]
    fn test_saved_parameters_restore_identical_outputs() {
        use burn::prelude::*;

        let device = Default::default();
        let checkpointer = Checkpointer::new(unique_dir("ckpt_roundtrip")).unwrap();

        let original: EmovoCnn<TestBackend> = EmovoCnnConfig::new(128).init(&device);
        checkpointer.save(&original, "roundtrip").unwrap();

        // Fresh model of identical architecture but different random init.
        let fresh: EmovoCnn<TestBackend> = EmovoCnnConfig::new(128).init(&device);
        let restored = checkpointer
            .load::<TestBackend, _>(fresh, "roundtrip", &device)
            .unwrap();

        let input = Tensor::<TestBackend, 3>::ones([2, 1, 128], &device);
        let expected = original.forward(input.clone()).into_data();
        let actual = restored.forward(input).into_data();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_load_missing_checkpoint_fails() {
        let device = Default::default();
        let checkpointer = Checkpointer::new(unique_dir("ckpt_missing")).unwrap();
        let model: EmovoCnn<TestBackend> = EmovoCnnConfig::new(64).init(&device);

        let result = checkpointer.load::<TestBackend, _>(model, "nope", &device);
        assert!(matches!(result, Err(EmovoxError::CheckpointNotFound(_))));
    }
}
