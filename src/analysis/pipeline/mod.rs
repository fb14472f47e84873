//! Feature extraction: fixed-order summary vectors with memoized transforms.

mod cache;
mod chroma;
mod descriptors;
mod hpss;
mod mel;
mod stats;
mod stft;
mod tempo;

use serde::Serialize;

use crate::analysis::audio::AudioSignal;

pub use cache::{
    TRANSFORM_CHROMA, TRANSFORM_HARMONIC, TRANSFORM_MEL, TRANSFORM_MFCC, TRANSFORM_PERCUSSIVE,
    TRANSFORM_STFT, TransformCache,
};
pub use stats::SummaryStats;

pub(crate) use chroma::{chroma_from_power, mean_chroma, PITCH_CLASS_COUNT};
pub(crate) use mel::{mel_spectrogram, mfcc_from_mel, power_to_db, MEL_BANDS};
pub(crate) use stft::{complex_spectrogram, power_spectrogram, STFT_FRAME_SIZE, STFT_HOP_SIZE};
pub(crate) use tempo::estimate_bpm;

/// Cepstral coefficient count used by the genre feature vector.
pub const DEFAULT_N_MFCC: usize = 20;
/// Summary moments per descriptor row.
pub const SUMMARY_COLS: usize = 4;

/// Descriptor rows in the exact order the classifiers were trained with.
///
/// This ordering is a contract; reordering it silently breaks every model
/// consuming the flattened vector.
pub const BASE_DESCRIPTORS: [&str; 10] = [
    "tempo",
    "harmonic_signal",
    "percussive_signal",
    "tonnetz",
    "chroma_stft",
    "rms",
    "spectral_bandwidth",
    "spectral_centroid",
    "spectral_rolloff",
    "zero_crossing_rate",
];

/// Errors raised when a signal cannot be run through the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// The signal carries no samples at all.
    #[error("Cannot extract features from an empty signal")]
    EmptySignal,
}

/// One named descriptor with its four summary moments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub name: String,
    pub stats: SummaryStats,
}

/// Ordered feature rows; `flatten` yields the classifier input layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    rows: Vec<FeatureRow>,
}

impl FeatureVector {
    /// Scalar count for a vector with `n_mfcc` cepstral rows.
    pub fn scalar_len(n_mfcc: usize) -> usize {
        SUMMARY_COLS * (BASE_DESCRIPTORS.len() + n_mfcc)
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Flatten to `4 x (10 + n_mfcc)` scalars in row order.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.rows.len() * SUMMARY_COLS);
        for row in &self.rows {
            out.extend_from_slice(&row.stats.as_array());
        }
        out
    }
}

/// Extract the summary feature vector for one signal.
///
/// Deterministic for a fixed signal and `n_mfcc`. A fresh transform cache is
/// created for the invocation and dropped with it, so nothing leaks across
/// signals.
pub fn extract(signal: &AudioSignal, n_mfcc: usize) -> Result<FeatureVector, FeatureError> {
    let mut cache = TransformCache::new();
    extract_with_cache(signal, n_mfcc, &mut cache)
}

/// Extract with a caller-supplied cache.
///
/// The cache must be empty and must not outlive this signal's analysis; the
/// seam exists so callers can observe transform compute counts.
pub fn extract_with_cache(
    signal: &AudioSignal,
    n_mfcc: usize,
    cache: &mut TransformCache,
) -> Result<FeatureVector, FeatureError> {
    if signal.is_empty() {
        return Err(FeatureError::EmptySignal);
    }
    if signal.samples().iter().all(|&s| s == 0.0) {
        // Degenerate input resolves to the all-zero signature instead of failing.
        return Ok(zero_vector(n_mfcc));
    }

    let sample_rate = signal.sample_rate();
    let power = cache.stft(signal);
    let melspec = cache.mel(signal);
    let tempo_bpm = estimate_bpm(&melspec, sample_rate, STFT_HOP_SIZE).round();
    let harmonic = cache.harmonic(signal);
    let percussive = cache.percussive(signal);
    let chroma_matrix = cache.chroma(signal);
    let mfcc_matrix = cache.mfcc(signal, n_mfcc);

    // Tonal centroids describe the harmonic component, not the full mix.
    let harmonic_samples: Vec<f32> = harmonic.iter().copied().collect();
    let harmonic_spec = complex_spectrogram(&harmonic_samples, STFT_FRAME_SIZE, STFT_HOP_SIZE);
    let harmonic_chroma = chroma_from_power(
        &power_spectrogram(&harmonic_spec),
        sample_rate,
        STFT_FRAME_SIZE,
    );
    let tonnetz = chroma::tonnetz_from_chroma(&harmonic_chroma);

    let centroids = descriptors::centroid_frames(&power, sample_rate, STFT_FRAME_SIZE);
    let bandwidths =
        descriptors::bandwidth_frames(&power, sample_rate, STFT_FRAME_SIZE, &centroids);
    let rolloffs = descriptors::rolloff_frames(&power, sample_rate, STFT_FRAME_SIZE);
    let rms = descriptors::rms_frames(signal.samples(), STFT_FRAME_SIZE, STFT_HOP_SIZE);
    let zcr = descriptors::zero_crossing_frames(signal.samples(), STFT_FRAME_SIZE, STFT_HOP_SIZE);

    let mut rows = Vec::with_capacity(BASE_DESCRIPTORS.len() + n_mfcc);
    rows.push(row("tempo", SummaryStats::scalar(tempo_bpm)));
    rows.push(row(
        "harmonic_signal",
        SummaryStats::from_elements(harmonic.iter().copied()),
    ));
    rows.push(row(
        "percussive_signal",
        SummaryStats::from_elements(percussive.iter().copied()),
    ));
    rows.push(row(
        "tonnetz",
        SummaryStats::from_elements(tonnetz.iter().copied()),
    ));
    rows.push(row(
        "chroma_stft",
        SummaryStats::from_elements(chroma_matrix.iter().copied()),
    ));
    rows.push(row("rms", SummaryStats::from_elements(rms.iter().copied())));
    rows.push(row(
        "spectral_bandwidth",
        SummaryStats::from_elements(bandwidths.iter().copied()),
    ));
    rows.push(row(
        "spectral_centroid",
        SummaryStats::from_elements(centroids.iter().copied()),
    ));
    rows.push(row(
        "spectral_rolloff",
        SummaryStats::from_elements(rolloffs.iter().copied()),
    ));
    rows.push(row(
        "zero_crossing_rate",
        SummaryStats::from_elements(zcr.iter().copied()),
    ));
    for coefficient in 0..n_mfcc {
        let values = mfcc_matrix.row(coefficient);
        rows.push(FeatureRow {
            name: format!("mfcc_{coefficient}"),
            stats: SummaryStats::from_elements(values.iter().copied()),
        });
    }
    Ok(FeatureVector { rows })
}

fn row(name: &str, stats: SummaryStats) -> FeatureRow {
    FeatureRow {
        name: name.to_string(),
        stats,
    }
}

fn zero_vector(n_mfcc: usize) -> FeatureVector {
    let mut rows = Vec::with_capacity(BASE_DESCRIPTORS.len() + n_mfcc);
    for name in BASE_DESCRIPTORS {
        rows.push(row(name, SummaryStats::zero()));
    }
    for coefficient in 0..n_mfcc {
        rows.push(FeatureRow {
            name: format!("mfcc_{coefficient}"),
            stats: SummaryStats::zero(),
        });
    }
    FeatureVector { rows }
}
