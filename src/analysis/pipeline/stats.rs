use serde::Serialize;

/// Element-wise summary of a descriptor tensor.
///
/// Temporal and spectral detail is deliberately discarded in favor of this
/// compact signature; classifiers are trained on exactly these four moments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub min: f32,
    pub mean: f32,
    pub max: f32,
    pub variance: f32,
}

impl SummaryStats {
    /// Reduce a tensor's elements to min/mean/max/variance.
    ///
    /// An empty or all-zero input reduces to all zeros; degenerate input is
    /// not an error anywhere in the pipeline.
    pub fn from_elements<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f64;
        let mut sum_sq = 0.0_f64;
        let mut count = 0usize;
        for value in values {
            min = min.min(value);
            max = max.max(value);
            sum += value as f64;
            sum_sq += value as f64 * value as f64;
            count += 1;
        }
        if count == 0 {
            return Self::zero();
        }
        let n = count as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        Self {
            min,
            mean: mean as f32,
            max,
            variance: variance as f32,
        }
    }

    /// Summary of a scalar estimate: min, mean and max collapse to the value
    /// and the variance is exactly zero.
    pub fn scalar(value: f32) -> Self {
        Self {
            min: value,
            mean: value,
            max: value,
            variance: 0.0,
        }
    }

    pub fn zero() -> Self {
        Self::scalar(0.0)
    }

    /// The four moments in serialization order.
    pub fn as_array(&self) -> [f32; 4] {
        [self.min, self.mean, self.max, self.variance]
    }
}
