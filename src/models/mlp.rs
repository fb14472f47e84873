use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{softmax, InferenceError, ModelLoadError};

/// Two-layer ReLU network over a flattened fixed-shape feature tensor.
///
/// The artifact records the tensor geometry it was trained on
/// (`input_bands` feature rows by `input_frames` time frames); feature code
/// shapes its tensor from these fields rather than from constants, so a
/// retrained artifact with a different frame budget is picked up without a
/// code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModel {
    /// Artifact format version.
    pub model_version: i64,
    /// Feature rows per input tensor.
    pub input_bands: usize,
    /// Time frames per input tensor.
    pub input_frames: usize,
    /// Hidden layer width.
    pub hidden_size: usize,
    /// Number of output classes.
    pub num_classes: usize,
    /// Hidden weights, `hidden_size x input_len` row-major.
    pub weights1: Vec<f32>,
    /// Hidden biases.
    pub bias1: Vec<f32>,
    /// Output weights, `num_classes x hidden_size` row-major.
    pub weights2: Vec<f32>,
    /// Output biases.
    pub bias2: Vec<f32>,
    /// Per-input normalization means.
    pub feature_mean: Vec<f32>,
    /// Per-input normalization deviations.
    pub feature_std: Vec<f32>,
}

impl MlpModel {
    /// Load and validate an artifact from JSON.
    pub fn load_json(path: &Path) -> Result<Self, ModelLoadError> {
        let bytes = std::fs::read(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self =
            serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate().map_err(|detail| ModelLoadError::Validate {
            path: path.to_path_buf(),
            detail,
        })?;
        Ok(model)
    }

    /// Flattened input length the network consumes.
    pub fn input_len(&self) -> usize {
        self.input_bands * self.input_frames
    }

    /// Check that every weight vector matches the declared geometry.
    pub fn validate(&self) -> Result<(), String> {
        let input = self.input_len();
        if input == 0 {
            return Err("Model input shape must be non-zero".to_string());
        }
        if self.num_classes < 2 {
            return Err("Model needs at least two classes".to_string());
        }
        if self.hidden_size == 0 {
            return Err("Hidden layer must be non-empty".to_string());
        }
        let checks = [
            ("weights1", self.weights1.len(), input * self.hidden_size),
            ("bias1", self.bias1.len(), self.hidden_size),
            (
                "weights2",
                self.weights2.len(),
                self.hidden_size * self.num_classes,
            ),
            ("bias2", self.bias2.len(), self.num_classes),
            ("feature_mean", self.feature_mean.len(), input),
            ("feature_std", self.feature_std.len(), input),
        ];
        for (name, got, expected) in checks {
            if got != expected {
                return Err(format!("{name} holds {got} values, expected {expected}"));
            }
        }
        Ok(())
    }

    /// Class probabilities for one flattened input tensor.
    pub fn predict_proba(&self, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let expected = self.input_len();
        if input.len() != expected {
            return Err(InferenceError::InputShape {
                expected,
                got: input.len(),
            });
        }

        let mut normalized = vec![0.0_f32; expected];
        for i in 0..expected {
            let std = self.feature_std[i].max(1e-6);
            normalized[i] = (input[i] - self.feature_mean[i]) / std;
        }

        let mut hidden = vec![0.0_f32; self.hidden_size];
        for (h, activation) in hidden.iter_mut().enumerate() {
            let mut sum = self.bias1[h];
            let base = h * expected;
            for i in 0..expected {
                sum += self.weights1[base + i] * normalized[i];
            }
            *activation = sum.max(0.0);
        }

        let mut logits = vec![0.0_f32; self.num_classes];
        for (c, logit) in logits.iter_mut().enumerate() {
            let mut sum = self.bias2[c];
            let base = c * self.hidden_size;
            for (h, &activation) in hidden.iter().enumerate() {
                sum += self.weights2[base + h] * activation;
            }
            *logit = sum;
        }

        Ok(softmax(&logits))
    }
}
