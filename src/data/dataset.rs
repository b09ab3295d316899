//! EMOVO Dataset
//!
//! Loads the EMOVO speech corpus from disk: WAV decode, mono mixdown,
//! optional resampling to the target rate, and zero-padding every waveform
//! to the dataset-wide maximum length.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EmovoxError, Result};

/// Target sample rate recordings are resampled to
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Number of emotion classes in the EMOVO corpus
pub const NUM_EMOTIONS: usize = 7;

/// EMOVO emotion classes
///
/// Labels are the positions in [`Emotion::ALL`], which follows the
/// alphabetical order of the corpus filename codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Disgust,
    Joy,
    Neutral,
    Fear,
    Anger,
    Surprise,
    Sadness,
}

impl Emotion {
    pub const ALL: [Emotion; NUM_EMOTIONS] = [
        Emotion::Disgust,
        Emotion::Joy,
        Emotion::Neutral,
        Emotion::Fear,
        Emotion::Anger,
        Emotion::Surprise,
        Emotion::Sadness,
    ];

    /// Filename code used by the corpus (`<code>-<actor>-<sentence>.wav`)
    pub fn code(&self) -> &'static str {
        match self {
            Emotion::Disgust => "dis",
            Emotion::Joy => "gio",
            Emotion::Neutral => "neu",
            Emotion::Fear => "pau",
            Emotion::Anger => "rab",
            Emotion::Surprise => "sor",
            Emotion::Sadness => "tri",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Class index of this emotion
    pub fn label(&self) -> usize {
        Self::ALL.iter().position(|e| e == self).unwrap_or(0)
    }

    pub fn from_label(label: usize) -> Option<Self> {
        Self::ALL.get(label).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Disgust => "disgust",
            Emotion::Joy => "joy",
            Emotion::Neutral => "neutral",
            Emotion::Fear => "fear",
            Emotion::Anger => "anger",
            Emotion::Surprise => "surprise",
            Emotion::Sadness => "sadness",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One labeled recording
#[derive(Debug, Clone)]
pub struct Sample {
    /// Mono waveform, zero-padded to the dataset's `max_sample_len`
    pub waveform: Vec<f32>,
    /// Emotion class index
    pub label: usize,
}

/// In-memory EMOVO dataset
///
/// Invariant: every waveform has length `max_sample_len`.
#[derive(Debug, Clone)]
pub struct EmovoDataset {
    samples: Vec<Sample>,
    max_sample_len: usize,
    sample_rate: u32,
}

impl EmovoDataset {
    /// Load every WAV file under `data_dir` (recursively).
    ///
    /// The emotion label is parsed from the EMOVO filename convention;
    /// files whose name carries no known emotion code are skipped with a
    /// warning. With `resample` set, recordings are brought to
    /// [`TARGET_SAMPLE_RATE`] via linear interpolation.
    pub fn load<P: AsRef<Path>>(data_dir: P, resample: bool) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        if !data_dir.is_dir() {
            return Err(EmovoxError::Dataset(format!(
                "data directory not found: {}",
                data_dir.display()
            )));
        }

        let mut wav_paths = Vec::new();
        collect_wav_files(data_dir, &mut wav_paths)?;
        if wav_paths.is_empty() {
            return Err(EmovoxError::Dataset(format!(
                "no WAV files under {}",
                data_dir.display()
            )));
        }
        // Deterministic sample order regardless of directory iteration order.
        wav_paths.sort();

        let mut samples = Vec::with_capacity(wav_paths.len());
        let mut dataset_rate: Option<u32> = None;

        for path in &wav_paths {
            let Some(emotion) = emotion_from_filename(path) else {
                warn!("Skipping {}: no emotion code in filename", path.display());
                continue;
            };

            let (waveform, rate) = read_waveform(path)?;
            let (waveform, rate) = if resample && rate != TARGET_SAMPLE_RATE {
                (resample_linear(&waveform, rate, TARGET_SAMPLE_RATE), TARGET_SAMPLE_RATE)
            } else {
                (waveform, rate)
            };

            match dataset_rate {
                None => dataset_rate = Some(rate),
                Some(r) if r != rate => warn!(
                    "Mixed sample rates ({} vs {} Hz) at {}; consider data.resample = true",
                    r,
                    rate,
                    path.display()
                ),
                _ => {}
            }

            samples.push(Sample {
                waveform,
                label: emotion.label(),
            });
        }

        if samples.is_empty() {
            return Err(EmovoxError::Dataset(format!(
                "no EMOVO-labeled WAV files under {}",
                data_dir.display()
            )));
        }

        debug!("Loaded {} recordings from {}", samples.len(), data_dir.display());

        let mut dataset = Self::from_samples(samples)?;
        dataset.sample_rate = dataset_rate.unwrap_or(TARGET_SAMPLE_RATE);
        Ok(dataset)
    }

    /// Build a dataset from already-decoded samples, padding every waveform
    /// to the longest one.
    pub fn from_samples(mut samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(EmovoxError::Dataset("dataset contains no samples".to_string()));
        }

        for sample in &samples {
            if sample.waveform.is_empty() {
                return Err(EmovoxError::Dataset("sample with empty waveform".to_string()));
            }
            if sample.label >= NUM_EMOTIONS {
                return Err(EmovoxError::Dataset(format!(
                    "label {} out of range (max {})",
                    sample.label,
                    NUM_EMOTIONS - 1
                )));
            }
        }

        let max_sample_len = samples
            .iter()
            .map(|s| s.waveform.len())
            .max()
            .unwrap_or(0);

        for sample in &mut samples {
            sample.waveform.resize(max_sample_len, 0.0);
        }

        Ok(Self {
            samples,
            max_sample_len,
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Resolve a batch of indices into sample references
    pub fn gather(&self, indices: &[usize]) -> Result<Vec<&Sample>> {
        indices
            .iter()
            .map(|&i| {
                self.get(i).ok_or_else(|| {
                    EmovoxError::Dataset(format!(
                        "sample index {} out of range (dataset size {})",
                        i,
                        self.len()
                    ))
                })
            })
            .collect()
    }

    /// Length every waveform in the dataset is padded to
    pub fn max_sample_len(&self) -> usize {
        self.max_sample_len
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_classes(&self) -> usize {
        NUM_EMOTIONS
    }

    /// Number of samples per emotion class
    pub fn class_counts(&self) -> [usize; NUM_EMOTIONS] {
        let mut counts = [0usize; NUM_EMOTIONS];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }
}

fn collect_wav_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_wav_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn emotion_from_filename(path: &Path) -> Option<Emotion> {
    let stem = path.file_stem()?.to_str()?;
    let code = stem.split('-').next()?;
    Emotion::from_code(&code.to_ascii_lowercase())
}

/// Decode a WAV file into a normalized mono waveform and its sample rate
fn read_waveform(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.max(1) as u32 - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((mixdown(&interleaved, channels), spec.sample_rate))
}

fn mixdown(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampling between sample rates
fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64 / ratio).round() as usize).max(1);
    let last = input.len() - 1;

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = (pos as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = (pos - idx as f64) as f32;
        out.push(input[idx] + (input[next] - input[idx]) * frac);
    }
    out
}
