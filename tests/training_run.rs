//! End-to-end training run over a synthetic EMOVO-style corpus on disk.

use std::env::temp_dir;
use std::fs;
use std::path::{Path, PathBuf};

use burn::backend::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};

use emovox::config::{AppConfig, DataConfig, LoggingConfig, ModelConfig, TrainingConfig};
use emovox::{
    Checkpointer, EmovoCnnConfig, Emotion, MetricKind, OptimizerKind, TARGET_SAMPLE_RATE,
};

type TestBackend = Autodiff<NdArray<f32>>;

const WAVEFORM_LEN: usize = 320;

fn write_wav(path: &Path, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Lay out 100 labeled recordings the way the EMOVO corpus names them,
/// one sine tone per emotion class.
fn write_corpus(data_dir: &Path) {
    fs::create_dir_all(data_dir).unwrap();

    for i in 0..100usize {
        let emotion = Emotion::ALL[i % Emotion::ALL.len()];
        let freq = 100.0 * (emotion.label() + 1) as f32;
        let samples: Vec<i16> = (0..WAVEFORM_LEN)
            .map(|t| {
                let phase = t as f32 / TARGET_SAMPLE_RATE as f32;
                (8000.0 * (2.0 * std::f32::consts::PI * freq * phase).sin()) as i16
            })
            .collect();

        let name = format!("{}-m1-s{:03}.wav", emotion.code(), i);
        write_wav(&data_dir.join(name), &samples);
    }
}

fn unique_dir(name: &str) -> PathBuf {
    let dir = temp_dir().join(format!("emovox_e2e_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_config(data_dir: &Path, checkpoint_dir: &Path) -> AppConfig {
    AppConfig {
        data: DataConfig {
            data_dir: data_dir.to_string_lossy().into_owned(),
            train_ratio: 0.7,
            test_val_ratio: 0.5,
            resample: true,
        },
        model: ModelConfig {
            dropout: 0.2,
            base_channels: 8,
        },
        training: TrainingConfig {
            batch_size: 10,
            optimizer: OptimizerKind::Adam,
            lr: 1e-3,
            epochs: 2,
            warmup_ratio: 0.1,
            evaluation_metric: MetricKind::Loss,
            best_metric_lower_is_better: true,
            checkpoint_dir: checkpoint_dir.to_string_lossy().into_owned(),
            model_name: "e2e".to_string(),
            device: "cpu".to_string(),
            seed: 7,
        },
        logging: LoggingConfig::default(),
    }
}

#[test]
fn full_run_trains_selects_and_persists() {
    let root = unique_dir("run");
    let data_dir = root.join("corpus");
    let checkpoint_dir = root.join("ckpt");
    write_corpus(&data_dir);

    let config = test_config(&data_dir, &checkpoint_dir);
    let report = emovox::run::<TestBackend>(&config, NdArrayDevice::Cpu).unwrap();

    // 100 samples at train_ratio 0.7 / test_val_ratio 0.5 => 70/15/15.
    assert_eq!(report.dataset_size, 100);
    assert_eq!(report.train_size, 70);
    assert_eq!(report.test_size, 15);
    assert_eq!(report.val_size, 15);

    // 70 train samples at batch 10 => 7 batches per epoch, 2 epochs.
    assert_eq!(report.total_steps, 14);
    assert_eq!(report.scheduler_steps, 14);
    assert_eq!(report.warmup_steps, 1);

    assert!(report.best_val_metric.is_finite());
    for kind in [
        MetricKind::Loss,
        MetricKind::Accuracy,
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::F1,
    ] {
        assert!(report.test_metrics.contains_key(&kind), "missing {kind}");
    }
    let accuracy = report.test_metrics[&MetricKind::Accuracy];
    assert!((0.0..=1.0).contains(&accuracy));

    // Checkpoint and report files exist where configured.
    assert_eq!(report.checkpoint_path, checkpoint_dir.join("e2e.mpk"));
    assert!(report.checkpoint_path.exists());
    assert!(checkpoint_dir.join("e2e.report.json").exists());
}

#[test]
fn persisted_checkpoint_cold_starts_inference() {
    use burn::prelude::*;

    let root = unique_dir("reload");
    let data_dir = root.join("corpus");
    let checkpoint_dir = root.join("ckpt");
    write_corpus(&data_dir);

    let config = test_config(&data_dir, &checkpoint_dir);
    let report = emovox::run::<TestBackend>(&config, NdArrayDevice::Cpu).unwrap();
    assert!(report.checkpoint_path.exists());

    // A fresh model of identical architecture loads the parameters and runs.
    let device = NdArrayDevice::Cpu;
    let fresh = EmovoCnnConfig::new(WAVEFORM_LEN)
        .with_dropout(0.2)
        .with_base_channels(8)
        .init::<NdArray<f32>>(&device);

    let checkpointer = Checkpointer::new(&checkpoint_dir).unwrap();
    let restored = checkpointer
        .load::<NdArray<f32>, _>(fresh, "e2e", &device)
        .unwrap();

    let input = Tensor::<NdArray<f32>, 3>::ones([1, 1, WAVEFORM_LEN], &device);
    let logits = restored.forward(input);

    assert_eq!(logits.dims(), [1, emovox::NUM_EMOTIONS]);
    let values = logits.into_data().convert::<f64>().to_vec::<f64>().unwrap();
    assert!(values.iter().all(|v| v.is_finite()));
}
