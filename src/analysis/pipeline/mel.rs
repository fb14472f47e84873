//! Mel filter bank, mel spectrogram and cepstral coefficients.

use ndarray::Array2;

/// Mel bands used for the pipeline mel spectrogram.
pub(crate) const MEL_BANDS: usize = 128;

const LOG_FLOOR: f32 = 1e-10;
const DB_TOP: f32 = 80.0;

/// Triangular mel filters stored sparsely as `(bin, weight)` pairs.
pub(crate) struct MelFilterBank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelFilterBank {
    pub(crate) fn new(sample_rate: u32, fft_len: usize, bands: usize) -> Self {
        let sr = sample_rate.max(1) as f32;
        let f_max = sr * 0.5;
        let mel_max = hz_to_mel(f_max);
        let bins = fft_len / 2 + 1;
        let bin_hz = sr / fft_len as f32;

        let mut centers_hz = Vec::with_capacity(bands + 2);
        for i in 0..(bands + 2) {
            let t = i as f32 / (bands + 1) as f32;
            centers_hz.push(mel_to_hz(mel_max * t));
        }

        let mut filters = Vec::with_capacity(bands);
        for band in 0..bands {
            let left = centers_hz[band];
            let center = centers_hz[band + 1];
            let right = centers_hz[band + 2];
            let mut weights = Vec::new();
            for bin in 0..bins {
                let freq = bin as f32 * bin_hz;
                let weight = if freq <= left || freq >= right {
                    0.0
                } else if freq < center {
                    (freq - left) / (center - left).max(f32::MIN_POSITIVE)
                } else {
                    (right - freq) / (right - center).max(f32::MIN_POSITIVE)
                };
                if weight > 0.0 {
                    weights.push((bin, weight));
                }
            }
            filters.push(weights);
        }
        Self { filters }
    }

    pub(crate) fn bands(&self) -> usize {
        self.filters.len()
    }

    /// Apply the bank to one power-spectrum column.
    pub(crate) fn apply(&self, power_column: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            let mut sum = 0.0_f64;
            for &(bin, weight) in filter {
                let p = power_column.get(bin).copied().unwrap_or(0.0).max(0.0);
                sum += p as f64 * weight as f64;
            }
            out.push(sum as f32);
        }
        out
    }
}

/// Mel power spectrogram of shape `(bands, frames)` from a power spectrogram.
pub(crate) fn mel_spectrogram(
    power: &Array2<f32>,
    sample_rate: u32,
    fft_len: usize,
    bands: usize,
) -> Array2<f32> {
    let bank = MelFilterBank::new(sample_rate, fft_len, bands);
    let frames = power.ncols();
    let mut mel = Array2::zeros((bank.bands(), frames));
    let mut column = vec![0.0_f32; power.nrows()];
    for frame in 0..frames {
        for (i, cell) in column.iter_mut().enumerate() {
            *cell = power[[i, frame]];
        }
        for (band, energy) in bank.apply(&column).into_iter().enumerate() {
            mel[[band, frame]] = energy;
        }
    }
    mel
}

/// Cepstral coefficients from a mel spectrogram: log energies then DCT-II.
pub(crate) fn mfcc_from_mel(mel: &Array2<f32>, n_mfcc: usize) -> Array2<f32> {
    let bands = mel.nrows();
    let frames = mel.ncols();
    let mut mfcc = Array2::zeros((n_mfcc, frames));
    let mut log_energies = vec![0.0_f32; bands];
    for frame in 0..frames {
        for (band, cell) in log_energies.iter_mut().enumerate() {
            *cell = mel[[band, frame]].max(LOG_FLOOR).ln();
        }
        for (k, value) in dct_ii(&log_energies, n_mfcc).into_iter().enumerate() {
            mfcc[[k, frame]] = value;
        }
    }
    mfcc
}

/// Convert a power matrix to decibels relative to its peak, floored at
/// `-DB_TOP` dB the way spectrogram front-ends conventionally clip.
pub(crate) fn power_to_db(power: &Array2<f32>) -> Array2<f32> {
    let peak = power
        .iter()
        .copied()
        .fold(0.0_f32, f32::max)
        .max(LOG_FLOOR);
    let ref_db = 10.0 * peak.log10();
    power.mapv(|v| (10.0 * v.max(LOG_FLOOR).log10() - ref_db).max(-DB_TOP))
}

fn dct_ii(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len().max(1) as f64;
    let mut out = Vec::with_capacity(count);
    for k in 0..count {
        let mut sum = 0.0_f64;
        for (m, &v) in values.iter().enumerate() {
            let angle = std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / n;
            sum += v as f64 * angle.cos();
        }
        out.push(sum as f32);
    }
    out
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0_f32 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0_f32 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}
