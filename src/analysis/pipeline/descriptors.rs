//! Per-frame descriptor tensors reduced later to summary statistics.

use ndarray::Array2;

const ROLLOFF_FRACTION: f64 = 0.85;

/// Root-mean-square energy per frame over the raw signal.
pub(crate) fn rms_frames(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    frame_map(samples, frame_size, hop_size, |frame| {
        if frame.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0_f64;
        for &sample in frame {
            sum += sample as f64 * sample as f64;
        }
        (sum / frame.len() as f64).sqrt() as f32
    })
}

/// Fraction of sign changes per frame.
pub(crate) fn zero_crossing_frames(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    frame_map(samples, frame_size, hop_size, |frame| {
        if frame.len() < 2 {
            return 0.0;
        }
        let mut crossings = 0u32;
        for pair in frame.windows(2) {
            let crossed = (pair[0] >= 0.0) != (pair[1] >= 0.0);
            if crossed && (pair[0] != 0.0 || pair[1] != 0.0) {
                crossings += 1;
            }
        }
        crossings as f32 / frame.len() as f32
    })
}

/// Power-weighted mean frequency per frame.
pub(crate) fn centroid_frames(power: &Array2<f32>, sample_rate: u32, fft_len: usize) -> Vec<f32> {
    let bin_hz = sample_rate.max(1) as f64 / fft_len.max(1) as f64;
    column_map(power, |column| {
        let mut total = 0.0_f64;
        let mut weighted = 0.0_f64;
        for (bin, &p) in column.iter().enumerate() {
            let p = p.max(0.0) as f64;
            total += p;
            weighted += p * bin as f64 * bin_hz;
        }
        if total <= 0.0 { 0.0 } else { (weighted / total) as f32 }
    })
}

/// Power-weighted deviation around the centroid per frame.
pub(crate) fn bandwidth_frames(
    power: &Array2<f32>,
    sample_rate: u32,
    fft_len: usize,
    centroids: &[f32],
) -> Vec<f32> {
    let bin_hz = sample_rate.max(1) as f64 / fft_len.max(1) as f64;
    let mut out = Vec::with_capacity(power.ncols());
    for (frame, &centroid) in centroids.iter().enumerate().take(power.ncols()) {
        let mut total = 0.0_f64;
        let mut spread = 0.0_f64;
        for bin in 0..power.nrows() {
            let p = power[[bin, frame]].max(0.0) as f64;
            let diff = bin as f64 * bin_hz - centroid as f64;
            total += p;
            spread += p * diff * diff;
        }
        out.push(if total <= 0.0 {
            0.0
        } else {
            (spread / total).sqrt() as f32
        });
    }
    out
}

/// Frequency below which `ROLLOFF_FRACTION` of frame energy lies.
pub(crate) fn rolloff_frames(power: &Array2<f32>, sample_rate: u32, fft_len: usize) -> Vec<f32> {
    let bin_hz = sample_rate.max(1) as f64 / fft_len.max(1) as f64;
    let nyquist = sample_rate.max(1) as f32 * 0.5;
    column_map(power, |column| {
        let total: f64 = column.iter().map(|&p| p.max(0.0) as f64).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let target = total * ROLLOFF_FRACTION;
        let mut cumulative = 0.0_f64;
        for (bin, &p) in column.iter().enumerate() {
            cumulative += p.max(0.0) as f64;
            if cumulative >= target {
                return (bin as f64 * bin_hz) as f32;
            }
        }
        nyquist
    })
}

fn frame_map(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    f: impl Fn(&[f32]) -> f32,
) -> Vec<f32> {
    let frame_size = frame_size.max(1);
    let hop_size = hop_size.max(1);
    if samples.is_empty() {
        return vec![0.0];
    }
    let mut out = Vec::with_capacity(samples.len() / hop_size + 1);
    let mut start = 0usize;
    while start < samples.len() {
        let end = (start + frame_size).min(samples.len());
        out.push(f(&samples[start..end]));
        start += hop_size;
    }
    out
}

fn column_map(power: &Array2<f32>, f: impl Fn(&[f32]) -> f32) -> Vec<f32> {
    let mut column = vec![0.0_f32; power.nrows()];
    let mut out = Vec::with_capacity(power.ncols());
    for frame in 0..power.ncols() {
        for (bin, cell) in column.iter_mut().enumerate() {
            *cell = power[[bin, frame]];
        }
        out.push(f(&column));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_unit_signal_is_one() {
        let frames = rms_frames(&[1.0_f32; 4096], 2048, 512);
        assert!(frames.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn zero_crossing_rate_of_alternating_signal_is_high() {
        let samples: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let frames = zero_crossing_frames(&samples, 2048, 512);
        assert!(frames[0] > 0.9);
    }

    #[test]
    fn centroid_tracks_single_bin() {
        let mut power = Array2::zeros((1025, 3));
        for frame in 0..3 {
            power[[100, frame]] = 1.0;
        }
        let centroids = centroid_frames(&power, 22_050, 2048);
        let expected = 100.0 * 22_050.0 / 2048.0;
        assert!(centroids.iter().all(|&c| (c - expected).abs() < 1.0));
        let bandwidths = bandwidth_frames(&power, 22_050, 2048, &centroids);
        assert!(bandwidths.iter().all(|&b| b < 1.0));
    }

    #[test]
    fn rolloff_of_silence_is_zero() {
        let power = Array2::zeros((1025, 4));
        assert!(rolloff_frames(&power, 22_050, 2048).iter().all(|&v| v == 0.0));
    }
}
