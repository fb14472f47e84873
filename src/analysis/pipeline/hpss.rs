//! Harmonic/percussive separation by median filtering of the spectrogram.

use ndarray::Array2;
use rustfft::num_complex::Complex;

use crate::analysis::pipeline::stft::inverse_spectrogram;

/// Median-filter length along each axis, in frames/bins.
pub(crate) const HPSS_KERNEL: usize = 31;
/// Soft-mask exponent; 2.0 gives Wiener-style masks.
pub(crate) const HPSS_MASK_POWER: f32 = 2.0;

const EPS: f32 = 1e-10;

/// Split a complex spectrogram into harmonic and percussive time signals.
///
/// Harmonic content is enhanced by a median filter along time (stable
/// horizontal ridges), percussive content by a median along frequency
/// (vertical transients). Soft masks derived from the enhanced magnitudes are
/// applied to the complex spectrogram and both parts are inverted back to
/// `out_len` samples.
pub(crate) fn separate(
    spec: &Array2<Complex<f32>>,
    frame_size: usize,
    hop_size: usize,
    out_len: usize,
) -> (Vec<f32>, Vec<f32>) {
    let magnitude = spec.mapv(|c| (c.re * c.re + c.im * c.im).sqrt());
    let harmonic_enh = median_along_time(&magnitude, HPSS_KERNEL);
    let percussive_enh = median_along_frequency(&magnitude, HPSS_KERNEL);

    let bins = spec.nrows();
    let frames = spec.ncols();
    let mut harmonic_spec = Array2::from_elem((bins, frames), Complex::new(0.0_f32, 0.0));
    let mut percussive_spec = Array2::from_elem((bins, frames), Complex::new(0.0_f32, 0.0));
    for bin in 0..bins {
        for frame in 0..frames {
            let h = harmonic_enh[[bin, frame]].max(0.0).powf(HPSS_MASK_POWER);
            let p = percussive_enh[[bin, frame]].max(0.0).powf(HPSS_MASK_POWER);
            let denom = (h + p).max(EPS);
            let cell = spec[[bin, frame]];
            harmonic_spec[[bin, frame]] = cell * (h / denom);
            percussive_spec[[bin, frame]] = cell * (p / denom);
        }
    }

    let harmonic = inverse_spectrogram(&harmonic_spec, frame_size, hop_size, out_len);
    let percussive = inverse_spectrogram(&percussive_spec, frame_size, hop_size, out_len);
    (harmonic, percussive)
}

fn median_along_time(magnitude: &Array2<f32>, kernel: usize) -> Array2<f32> {
    let half = kernel / 2;
    let frames = magnitude.ncols();
    let mut out = Array2::zeros(magnitude.dim());
    let mut scratch = Vec::with_capacity(kernel);
    for bin in 0..magnitude.nrows() {
        for frame in 0..frames {
            let lo = frame.saturating_sub(half);
            let hi = (frame + half + 1).min(frames);
            scratch.clear();
            for t in lo..hi {
                scratch.push(magnitude[[bin, t]]);
            }
            out[[bin, frame]] = median(&mut scratch);
        }
    }
    out
}

fn median_along_frequency(magnitude: &Array2<f32>, kernel: usize) -> Array2<f32> {
    let half = kernel / 2;
    let bins = magnitude.nrows();
    let mut out = Array2::zeros(magnitude.dim());
    let mut scratch = Vec::with_capacity(kernel);
    for frame in 0..magnitude.ncols() {
        for bin in 0..bins {
            let lo = bin.saturating_sub(half);
            let hi = (bin + half + 1).min(bins);
            scratch.clear();
            for b in lo..hi {
                scratch.push(magnitude[[b, frame]]);
            }
            out[[bin, frame]] = median(&mut scratch);
        }
    }
    out
}

fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let (_, pivot, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *pivot
}
