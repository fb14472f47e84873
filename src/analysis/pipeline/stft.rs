//! Short-time spectral transform and its inverse, built on rustfft.

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Frame length shared by every spectral transform in the pipeline.
pub(crate) const STFT_FRAME_SIZE: usize = 2048;
/// Hop between consecutive analysis frames.
pub(crate) const STFT_HOP_SIZE: usize = 512;

pub(crate) fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0_f32; length.max(1)];
    }
    let denom = length as f32;
    (0..length)
        .map(|n| 0.5_f32 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / denom).cos()))
        .collect()
}

/// Complex spectrogram of shape `(frame_size / 2 + 1, frames)`.
///
/// Frames are centered: the signal is reflect-padded by half a frame on each
/// side, giving `len / hop + 1` frames for any non-empty signal.
pub(crate) fn complex_spectrogram(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Array2<Complex<f32>> {
    let frame_size = frame_size.max(2);
    let hop_size = hop_size.max(1);
    let bins = frame_size / 2 + 1;
    let n_frames = samples.len() / hop_size + 1;

    let pad = frame_size / 2;
    let padded = reflect_pad(samples, pad);
    let window = hann_window(frame_size);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); frame_size];
    let mut scratch = vec![Complex::new(0.0_f32, 0.0); fft.get_inplace_scratch_len()];

    let mut spec = Array2::from_elem((bins, n_frames), Complex::new(0.0_f32, 0.0));
    for frame in 0..n_frames {
        let start = frame * hop_size;
        for (i, cell) in buffer.iter_mut().enumerate() {
            let sample = padded.get(start + i).copied().unwrap_or(0.0);
            *cell = Complex::new(sample * window[i], 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);
        for bin in 0..bins {
            spec[[bin, frame]] = buffer[bin];
        }
    }
    spec
}

/// Squared magnitudes of a complex spectrogram.
pub(crate) fn power_spectrogram(spec: &Array2<Complex<f32>>) -> Array2<f32> {
    spec.mapv(|c| (c.re * c.re + c.im * c.im).max(0.0))
}

/// Overlap-add inverse of a spectrogram produced by [`complex_spectrogram`],
/// trimmed back to `out_len` samples.
pub(crate) fn inverse_spectrogram(
    spec: &Array2<Complex<f32>>,
    frame_size: usize,
    hop_size: usize,
    out_len: usize,
) -> Vec<f32> {
    let frame_size = frame_size.max(2);
    let hop_size = hop_size.max(1);
    let bins = spec.nrows();
    let n_frames = spec.ncols();
    let window = hann_window(frame_size);

    let mut planner = FftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(frame_size);
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); frame_size];
    let mut scratch = vec![Complex::new(0.0_f32, 0.0); ifft.get_inplace_scratch_len()];

    let padded_len = (n_frames.saturating_sub(1)) * hop_size + frame_size;
    let mut acc = vec![0.0_f32; padded_len];
    let mut norm = vec![0.0_f32; padded_len];
    let scale = 1.0 / frame_size as f32;

    for frame in 0..n_frames {
        for bin in 0..frame_size {
            // Rebuild the full conjugate-symmetric spectrum from the stored bins.
            buffer[bin] = if bin < bins {
                spec[[bin, frame]]
            } else {
                spec[[frame_size - bin, frame]].conj()
            };
        }
        ifft.process_with_scratch(&mut buffer, &mut scratch);
        let start = frame * hop_size;
        for i in 0..frame_size {
            let value = buffer[i].re * scale;
            acc[start + i] += value * window[i];
            norm[start + i] += window[i] * window[i];
        }
    }

    let pad = frame_size / 2;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let idx = i + pad;
        if idx >= acc.len() {
            out.push(0.0);
            continue;
        }
        let weight = norm[idx];
        out.push(if weight > 1e-8 { acc[idx] / weight } else { 0.0 });
    }
    out
}

fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);
    for i in 0..(n + 2 * pad) {
        let pos = i as isize - pad as isize;
        padded.push(samples.get(reflect_index(pos, n)).copied().unwrap_or(0.0));
    }
    padded
}

/// Reflect an out-of-range index back into `[0, len)` without repeating the
/// boundary sample.
fn reflect_index(pos: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut p = pos % period;
    if p < 0 {
        p += period;
    }
    if p >= len as isize {
        p = period - p;
    }
    p as usize
}
