//! Stateless key and tempo estimation; no pooled model involved.

use serde::Serialize;

use crate::analysis::audio::AudioSignal;
use crate::analysis::pipeline::{
    chroma_from_power, complex_spectrogram, estimate_bpm, mean_chroma, mel_spectrogram,
    power_spectrogram, FeatureError, MEL_BANDS, PITCH_CLASS_COUNT, STFT_FRAME_SIZE, STFT_HOP_SIZE,
};
use crate::models::argmax;

/// Pitch-class names in chromatic order starting at C.
pub const PITCH_CLASSES: [&str; PITCH_CLASS_COUNT] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Only the head of the clip is examined; keys rarely move in ten seconds.
pub const KEY_TEMPO_CLIP_SECONDS: f32 = 10.0;

/// Estimated key and integer tempo for one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyTempo {
    pub key: &'static str,
    pub tempo_bpm: u32,
}

/// Estimate key and tempo from the first ten seconds of a signal.
///
/// The key is the pitch class with the highest mean chroma energy; ties
/// resolve to the lowest pitch-class index. Tempo is estimated independently
/// and rounded to the nearest whole BPM. Pure function of the signal.
pub fn analyze(signal: &AudioSignal) -> Result<KeyTempo, FeatureError> {
    if signal.is_empty() {
        return Err(FeatureError::EmptySignal);
    }
    let clip = signal.head(KEY_TEMPO_CLIP_SECONDS);
    let sample_rate = signal.sample_rate();

    let spectrum = complex_spectrogram(clip, STFT_FRAME_SIZE, STFT_HOP_SIZE);
    let power = power_spectrogram(&spectrum);

    let chroma = chroma_from_power(&power, sample_rate, STFT_FRAME_SIZE);
    let mean = mean_chroma(&chroma);
    let key = PITCH_CLASSES[argmax(&mean)];

    let mel = mel_spectrogram(&power, sample_rate, STFT_FRAME_SIZE, MEL_BANDS);
    let tempo_bpm = estimate_bpm(&mel, sample_rate, STFT_HOP_SIZE)
        .round()
        .max(0.0) as u32;

    Ok(KeyTempo { key, tempo_bpm })
}
