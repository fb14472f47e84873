//! Loading and normalization of clips into analysis-ready mono signals.

use std::path::{Path, PathBuf};

use crate::analysis::ANALYSIS_SAMPLE_RATE;
use crate::analysis::audio_decode;

/// A decoded mono signal, immutable once loaded.
///
/// Owned by the analysis invocation that loaded it; never shared across
/// concurrent analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Errors raised while turning a file into an [`AudioSignal`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The container or codec could not be decoded.
    #[error("Failed to decode {path}: {detail}")]
    Decode { path: PathBuf, detail: String },
    /// The file decoded but produced no usable samples.
    #[error("No audio in {path}")]
    Empty { path: PathBuf },
}

impl AudioSignal {
    /// Wrap already-decoded mono samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// The first `seconds` of the signal, or the whole signal if shorter.
    pub(crate) fn head(&self, seconds: f32) -> &[f32] {
        let limit = (seconds.max(0.0) * self.sample_rate as f32).round() as usize;
        &self.samples[..limit.min(self.samples.len())]
    }
}

/// Decode a file into a mono [`AudioSignal`] at the fixed analysis rate.
///
/// Downmixes to mono, resamples with linear interpolation and replaces
/// non-finite samples. `max_seconds` bounds how much of the file is decoded.
pub fn load_clip(path: &Path, max_seconds: Option<f32>) -> Result<AudioSignal, DecodeError> {
    let decoded =
        audio_decode::decode_clip(path, max_seconds).map_err(|detail| DecodeError::Decode {
            path: path.to_path_buf(),
            detail,
        })?;
    let mono = downmix_to_mono(&decoded.samples, decoded.channels);
    if mono.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }
    let samples = resample_linear(&mono, decoded.sample_rate, ANALYSIS_SAMPLE_RATE);
    Ok(AudioSignal::new(samples, ANALYSIS_SAMPLE_RATE))
}

/// Report a clip's duration without decoding it when the container allows.
///
/// WAV headers carry enough to answer directly; other formats return `None`.
pub fn probe_duration_seconds(path: &Path) -> Option<f32> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    if !ext.eq_ignore_ascii_case("wav") {
        return None;
    }
    let reader = hound::WavReader::open(path).ok()?;
    let sample_rate = reader.spec().sample_rate.max(1) as f32;
    Some((reader.duration() as f32 / sample_rate).max(0.0))
}

fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.iter().copied().map(sanitize_sample).collect();
    }
    let frames = samples.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let mut sum = 0.0_f32;
        for &sample in &samples[start..start + channels] {
            sum += sanitize_sample(sample);
        }
        mono.push(sum / channels as f32);
    }
    mono
}

/// Resample mono samples with linear interpolation.
pub(crate) fn resample_linear(samples: &[f32], input_rate: u32, output_rate: u32) -> Vec<f32> {
    let input_rate = input_rate.max(1);
    let output_rate = output_rate.max(1);
    if samples.is_empty() || input_rate == output_rate {
        return samples.to_vec();
    }
    let duration = samples.len() as f64 / input_rate as f64;
    let out_len = (duration * output_rate as f64).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 / output_rate as f64 * input_rate as f64;
        out.push(lerp_sample(samples, pos));
    }
    out
}

fn lerp_sample(samples: &[f32], pos: f64) -> f32 {
    let idx0 = pos.floor().max(0.0) as usize;
    let frac = (pos - idx0 as f64).clamp(0.0, 1.0) as f32;
    let idx1 = idx0.saturating_add(1).min(samples.len().saturating_sub(1));
    let a = samples.get(idx0).copied().unwrap_or(0.0);
    let b = samples.get(idx1).copied().unwrap_or(a);
    a + (b - a) * frac
}

pub(crate) fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let interleaved = [1.0_f32, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix_to_mono(&interleaved, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn resample_preserves_duration() {
        let samples = vec![0.0_f32; 44_100];
        let out = resample_linear(&samples, 44_100, 22_050);
        assert_eq!(out.len(), 22_050);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![0.25_f32, -0.25, 0.5];
        assert_eq!(resample_linear(&samples, 22_050, 22_050), samples);
    }

    #[test]
    fn sanitize_clamps_and_zeroes_non_finite() {
        assert_eq!(sanitize_sample(2.0), 1.0);
        assert_eq!(sanitize_sample(-3.0), -1.0);
        assert_eq!(sanitize_sample(f32::NAN), 0.0);
        assert_eq!(sanitize_sample(f32::INFINITY), 0.0);
    }

    #[test]
    fn head_bounds_to_signal_length() {
        let signal = AudioSignal::new(vec![0.0; 1000], 100);
        assert_eq!(signal.head(2.0).len(), 200);
        assert_eq!(signal.head(60.0).len(), 1000);
    }
}
