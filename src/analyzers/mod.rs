//! Analyzer components turning signals into labeled results.

pub mod genre;
pub mod instrument;
pub mod key_tempo;

use serde::Serialize;

use crate::models::{GbdtModel, InferenceError, MlpModel};

/// What went wrong when an analysis fails outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The input signal could not be decoded or run through the pipeline.
    Decode,
    /// The model rejected the prepared input.
    Inference,
}

/// Outcome of one pooled analysis.
///
/// `Unavailable` (every slot busy, try again later) is deliberately distinct
/// from `Failure` (this input or invocation is broken); callers must be able
/// to tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisResult {
    Success {
        label: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        probabilities: Option<Vec<(String, f32)>>,
    },
    Unavailable,
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl AnalysisResult {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AnalysisResult::Unavailable)
    }

    /// The predicted label when the analysis succeeded.
    pub fn success_label(&self) -> Option<&str> {
        match self {
            AnalysisResult::Success { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// Prediction seam the genre analyzer needs from a pooled model.
pub trait GenreClassifier {
    fn predict_class(&self, features: &[f32]) -> Result<usize, InferenceError>;
}

impl GenreClassifier for GbdtModel {
    fn predict_class(&self, features: &[f32]) -> Result<usize, InferenceError> {
        GbdtModel::predict_class(self, features)
    }
}

/// Prediction seam the instrument analyzer needs from a pooled model.
pub trait InstrumentClassifier {
    /// Time frames the model's input tensor must carry.
    fn input_frames(&self) -> usize;

    fn predict_proba(&self, input: &[f32]) -> Result<Vec<f32>, InferenceError>;
}

impl InstrumentClassifier for MlpModel {
    fn input_frames(&self) -> usize {
        self.input_frames
    }

    fn predict_proba(&self, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        MlpModel::predict_proba(self, input)
    }
}
