//! Classifier weight packs loaded from JSON artifacts.
//!
//! Artifacts are opaque to the rest of the system: a loader turns a path
//! into a validated in-memory model, and predictions go through plain slice
//! interfaces so analyzers never see the weight layout.

mod gbdt;
mod mlp;

use std::path::PathBuf;

pub use gbdt::{GbdtModel, Stump};
pub use mlp::MlpModel;

/// Errors raised while loading a model artifact; fatal to pool construction.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    /// The artifact file could not be read.
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not valid JSON for this model type.
    #[error("Malformed model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The artifact parsed but its dimensions are inconsistent.
    #[error("Model artifact {path} failed validation: {detail}")]
    Validate { path: PathBuf, detail: String },
}

/// Errors raised by a model invocation at predict time.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The input vector does not match the model's expected length.
    #[error("Model expects {expected} input values, got {got}")]
    InputShape { expected: usize, got: usize },
}

/// Numerically-stable softmax over raw logits.
pub(crate) fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0_f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best_index = 0usize;
    let mut best_value = f32::NEG_INFINITY;
    for (index, &value) in values.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best_index = index;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[0.5, 1.5, -2.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);
    }

    #[test]
    fn argmax_breaks_ties_toward_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.2, 0.6, 0.0, 0.0]), 2);
        assert_eq!(argmax(&[0.4, 0.4, 0.1]), 0);
        assert_eq!(argmax(&[0.0; 5]), 0);
    }
}
