//! Per-extraction memoization of expensive intermediate transforms.

use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;
use rustfft::num_complex::Complex;

use crate::analysis::audio::AudioSignal;
use crate::analysis::pipeline::{chroma, hpss, mel, stft};

/// Key of the power spectrogram transform.
pub const TRANSFORM_STFT: &str = "stft";
/// Key of the separated harmonic time signal.
pub const TRANSFORM_HARMONIC: &str = "harmonic";
/// Key of the separated percussive time signal.
pub const TRANSFORM_PERCUSSIVE: &str = "percussive";
/// Key of the mel power spectrogram.
pub const TRANSFORM_MEL: &str = "mel";
/// Key of the cepstral coefficient matrix.
pub const TRANSFORM_MFCC: &str = "mfcc";
/// Key of the pitch-class energy matrix.
pub const TRANSFORM_CHROMA: &str = "chroma";

/// Transform results keyed by name, scoped to a single signal's extraction.
///
/// A cache must never be reused across signals; [`super::extract`] constructs
/// a fresh one per call and discards it with the invocation. Every transform
/// is computed at most once; repeated requests observe the identical tensor.
/// One-dimensional intermediates (the separated harmonic and percussive
/// waveforms) are stored as single-row matrices.
#[derive(Default)]
pub struct TransformCache {
    tensors: HashMap<&'static str, Arc<Array2<f32>>>,
    complex_stft: Option<Arc<Array2<Complex<f32>>>>,
    computes: HashMap<&'static str, u32>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the named transform was actually computed.
    ///
    /// Stays at most 1 for any key during a single extraction.
    pub fn compute_count(&self, key: &str) -> u32 {
        self.computes.get(key).copied().unwrap_or(0)
    }

    /// Power spectrogram of the signal, `(bins, frames)`.
    pub(crate) fn stft(&mut self, signal: &AudioSignal) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_STFT) {
            return tensor.clone();
        }
        let complex = self.complex_stft(signal);
        let power = Arc::new(stft::power_spectrogram(&complex));
        self.tensors.insert(TRANSFORM_STFT, power.clone());
        power
    }

    /// Harmonic component of the signal as a `1 x N` matrix.
    pub(crate) fn harmonic(&mut self, signal: &AudioSignal) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_HARMONIC) {
            return tensor.clone();
        }
        self.separate(signal);
        self.tensors[TRANSFORM_HARMONIC].clone()
    }

    /// Percussive component of the signal as a `1 x N` matrix.
    pub(crate) fn percussive(&mut self, signal: &AudioSignal) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_PERCUSSIVE) {
            return tensor.clone();
        }
        self.separate(signal);
        self.tensors[TRANSFORM_PERCUSSIVE].clone()
    }

    /// Mel power spectrogram, `(MEL_BANDS, frames)`.
    pub(crate) fn mel(&mut self, signal: &AudioSignal) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_MEL) {
            return tensor.clone();
        }
        let power = self.stft(signal);
        let tensor = Arc::new(mel::mel_spectrogram(
            &power,
            signal.sample_rate(),
            stft::STFT_FRAME_SIZE,
            mel::MEL_BANDS,
        ));
        self.record_compute(TRANSFORM_MEL);
        self.tensors.insert(TRANSFORM_MEL, tensor.clone());
        tensor
    }

    /// Cepstral coefficients, `(n_mfcc, frames)`.
    pub(crate) fn mfcc(&mut self, signal: &AudioSignal, n_mfcc: usize) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_MFCC) {
            return tensor.clone();
        }
        let melspec = self.mel(signal);
        let tensor = Arc::new(mel::mfcc_from_mel(&melspec, n_mfcc));
        self.record_compute(TRANSFORM_MFCC);
        self.tensors.insert(TRANSFORM_MFCC, tensor.clone());
        tensor
    }

    /// Pitch-class energies, `(12, frames)`.
    pub(crate) fn chroma(&mut self, signal: &AudioSignal) -> Arc<Array2<f32>> {
        if let Some(tensor) = self.tensors.get(TRANSFORM_CHROMA) {
            return tensor.clone();
        }
        let power = self.stft(signal);
        let tensor = Arc::new(chroma::chroma_from_power(
            &power,
            signal.sample_rate(),
            stft::STFT_FRAME_SIZE,
        ));
        self.record_compute(TRANSFORM_CHROMA);
        self.tensors.insert(TRANSFORM_CHROMA, tensor.clone());
        tensor
    }

    fn complex_stft(&mut self, signal: &AudioSignal) -> Arc<Array2<Complex<f32>>> {
        if let Some(spec) = &self.complex_stft {
            return spec.clone();
        }
        let spec = Arc::new(stft::complex_spectrogram(
            signal.samples(),
            stft::STFT_FRAME_SIZE,
            stft::STFT_HOP_SIZE,
        ));
        self.record_compute(TRANSFORM_STFT);
        self.complex_stft = Some(spec.clone());
        spec
    }

    /// One separation pass fills both the harmonic and percussive slots.
    fn separate(&mut self, signal: &AudioSignal) {
        let complex = self.complex_stft(signal);
        let (harmonic, percussive) = hpss::separate(
            &complex,
            stft::STFT_FRAME_SIZE,
            stft::STFT_HOP_SIZE,
            signal.samples().len(),
        );
        self.record_compute(TRANSFORM_HARMONIC);
        self.record_compute(TRANSFORM_PERCUSSIVE);
        self.tensors
            .insert(TRANSFORM_HARMONIC, Arc::new(row_matrix(harmonic)));
        self.tensors
            .insert(TRANSFORM_PERCUSSIVE, Arc::new(row_matrix(percussive)));
    }

    fn record_compute(&mut self, key: &'static str) {
        *self.computes.entry(key).or_insert(0) += 1;
    }
}

fn row_matrix(values: Vec<f32>) -> Array2<f32> {
    let len = values.len();
    Array2::from_shape_vec((1, len), values).expect("single-row shape always matches")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signal() -> AudioSignal {
        let sr = 22_050_u32;
        let samples: Vec<f32> = (0..sr as usize)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        AudioSignal::new(samples, sr)
    }

    #[test]
    fn repeated_requests_compute_once() {
        let signal = test_signal();
        let mut cache = TransformCache::new();
        let first = cache.stft(&signal);
        let second = cache.stft(&signal);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.compute_count(TRANSFORM_STFT), 1);
    }

    #[test]
    fn separation_fills_both_components_in_one_pass() {
        let signal = test_signal();
        let mut cache = TransformCache::new();
        let _ = cache.harmonic(&signal);
        let _ = cache.percussive(&signal);
        assert_eq!(cache.compute_count(TRANSFORM_HARMONIC), 1);
        assert_eq!(cache.compute_count(TRANSFORM_PERCUSSIVE), 1);
        // The shared complex transform behind it also ran once.
        assert_eq!(cache.compute_count(TRANSFORM_STFT), 1);
    }

    #[test]
    fn dependent_transforms_reuse_the_spectrogram() {
        let signal = test_signal();
        let mut cache = TransformCache::new();
        let _ = cache.mel(&signal);
        let _ = cache.chroma(&signal);
        let _ = cache.mfcc(&signal, 20);
        assert_eq!(cache.compute_count(TRANSFORM_STFT), 1);
        assert_eq!(cache.compute_count(TRANSFORM_MEL), 1);
        assert_eq!(cache.compute_count(TRANSFORM_CHROMA), 1);
        assert_eq!(cache.compute_count(TRANSFORM_MFCC), 1);
    }

    #[test]
    fn component_matrices_are_single_row() {
        let signal = test_signal();
        let mut cache = TransformCache::new();
        let harmonic = cache.harmonic(&signal);
        assert_eq!(harmonic.nrows(), 1);
        assert_eq!(harmonic.ncols(), signal.samples().len());
    }
}
