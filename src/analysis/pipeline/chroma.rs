//! Pitch-class energy (chroma) and its tonal-centroid projection.

use ndarray::Array2;

/// Number of pitch classes in an octave.
pub(crate) const PITCH_CLASS_COUNT: usize = 12;
/// Rows in the tonal-centroid (tonnetz) projection.
pub(crate) const TONNETZ_DIMS: usize = 6;

const A4_HZ: f32 = 440.0;
const A4_MIDI: f32 = 69.0;

/// Chroma matrix of shape `(12, frames)` from a power spectrogram.
///
/// Each FFT bin contributes its energy to the pitch class nearest its center
/// frequency; every frame is normalized so its strongest class reads 1.0.
pub(crate) fn chroma_from_power(
    power: &Array2<f32>,
    sample_rate: u32,
    fft_len: usize,
) -> Array2<f32> {
    let bins = power.nrows();
    let frames = power.ncols();
    let bin_hz = sample_rate.max(1) as f32 / fft_len.max(1) as f32;

    let mut bin_class = vec![None::<usize>; bins];
    for (bin, slot) in bin_class.iter_mut().enumerate().skip(1) {
        let freq = bin as f32 * bin_hz;
        let midi = A4_MIDI + 12.0 * (freq / A4_HZ).log2();
        let class = ((midi.round() as i64 % 12) + 12) % 12;
        *slot = Some(class as usize);
    }

    let mut chroma = Array2::zeros((PITCH_CLASS_COUNT, frames));
    for frame in 0..frames {
        let mut accum = [0.0_f32; PITCH_CLASS_COUNT];
        for bin in 0..bins {
            if let Some(class) = bin_class[bin] {
                accum[class] += power[[bin, frame]].max(0.0);
            }
        }
        let peak = accum.iter().copied().fold(0.0_f32, f32::max);
        if peak > 0.0 {
            for (class, &energy) in accum.iter().enumerate() {
                chroma[[class, frame]] = energy / peak;
            }
        }
    }
    chroma
}

/// Mean energy per pitch class across all frames.
pub(crate) fn mean_chroma(chroma: &Array2<f32>) -> [f32; PITCH_CLASS_COUNT] {
    let frames = chroma.ncols().max(1) as f32;
    let mut mean = [0.0_f32; PITCH_CLASS_COUNT];
    for (class, slot) in mean.iter_mut().enumerate() {
        let mut sum = 0.0_f64;
        for frame in 0..chroma.ncols() {
            sum += chroma[[class, frame]] as f64;
        }
        *slot = (sum / frames as f64) as f32;
    }
    mean
}

/// Tonal-centroid projection of a chroma matrix, shape `(6, frames)`.
///
/// Rows pair sine/cosine coordinates on the circles of fifths, minor thirds
/// and major thirds; frames are L1-normalized before projection.
pub(crate) fn tonnetz_from_chroma(chroma: &Array2<f32>) -> Array2<f32> {
    let frames = chroma.ncols();
    let basis = tonnetz_basis();
    let mut tonnetz = Array2::zeros((TONNETZ_DIMS, frames));
    for frame in 0..frames {
        let mut total = 0.0_f32;
        for class in 0..PITCH_CLASS_COUNT {
            total += chroma[[class, frame]].max(0.0);
        }
        if total <= 0.0 {
            continue;
        }
        for dim in 0..TONNETZ_DIMS {
            let mut sum = 0.0_f32;
            for class in 0..PITCH_CLASS_COUNT {
                sum += basis[dim][class] * chroma[[class, frame]].max(0.0) / total;
            }
            tonnetz[[dim, frame]] = sum;
        }
    }
    tonnetz
}

fn tonnetz_basis() -> [[f32; PITCH_CLASS_COUNT]; TONNETZ_DIMS] {
    use std::f32::consts::PI;
    // Circle angles per pitch class: fifths, minor thirds, major thirds.
    let angles = [7.0 * PI / 6.0, 3.0 * PI / 2.0, 2.0 * PI / 3.0];
    let radii = [1.0_f32, 1.0, 0.5];
    let mut basis = [[0.0_f32; PITCH_CLASS_COUNT]; TONNETZ_DIMS];
    for (circle, (&angle, &radius)) in angles.iter().zip(radii.iter()).enumerate() {
        for class in 0..PITCH_CLASS_COUNT {
            let theta = angle * class as f32;
            basis[2 * circle][class] = radius * theta.sin();
            basis[2 * circle + 1][class] = radius * theta.cos();
        }
    }
    basis
}
