//! Tempo estimation from spectral-flux onset strength.

use ndarray::Array2;

use crate::analysis::pipeline::mel::power_to_db;

/// Slowest tempo the estimator will report.
pub(crate) const TEMPO_MIN_BPM: f32 = 30.0;
/// Fastest tempo the estimator will report.
pub(crate) const TEMPO_MAX_BPM: f32 = 300.0;

/// Estimate tempo in beats per minute from a mel power spectrogram.
///
/// Onset strength is the positive spectral flux of the log-mel spectrogram;
/// the dominant inter-onset period is picked by autocorrelation over the
/// plausible BPM lag range. Silence and flux-free signals report 0.0.
pub(crate) fn estimate_bpm(mel: &Array2<f32>, sample_rate: u32, hop_size: usize) -> f32 {
    let envelope = onset_envelope(mel);
    bpm_from_envelope(&envelope, sample_rate, hop_size)
}

/// Per-frame onset strength: mean positive difference of log-mel energy.
pub(crate) fn onset_envelope(mel: &Array2<f32>) -> Vec<f32> {
    let frames = mel.ncols();
    if frames < 2 {
        return vec![0.0; frames];
    }
    let db = power_to_db(mel);
    let bands = db.nrows().max(1) as f32;
    let mut envelope = Vec::with_capacity(frames);
    envelope.push(0.0);
    for frame in 1..frames {
        let mut flux = 0.0_f32;
        for band in 0..db.nrows() {
            flux += (db[[band, frame]] - db[[band, frame - 1]]).max(0.0);
        }
        envelope.push(flux / bands);
    }
    envelope
}

fn bpm_from_envelope(envelope: &[f32], sample_rate: u32, hop_size: usize) -> f32 {
    let frame_rate = sample_rate.max(1) as f32 / hop_size.max(1) as f32;
    let min_lag = ((60.0 * frame_rate) / TEMPO_MAX_BPM).floor().max(1.0) as usize;
    let max_lag = ((60.0 * frame_rate) / TEMPO_MIN_BPM).ceil() as usize;
    if envelope.len() <= min_lag + 1 {
        return 0.0;
    }

    let mean = envelope.iter().copied().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();
    let energy: f64 = centered.iter().map(|&v| v as f64 * v as f64).sum();
    if energy <= 1e-12 {
        return 0.0;
    }

    let max_lag = max_lag.min(envelope.len() - 1);
    let mut best_lag = 0usize;
    let mut best_score = 0.0_f64;
    for lag in min_lag..=max_lag {
        let mut score = 0.0_f64;
        for i in lag..centered.len() {
            score += centered[i] as f64 * centered[i - lag] as f64;
        }
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }
    if best_lag == 0 || best_score <= 0.0 {
        return 0.0;
    }
    60.0 * frame_rate / best_lag as f32
}
