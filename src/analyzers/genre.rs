//! Genre classification over the summary feature vector.

use std::sync::Arc;

use crate::analysis::audio::AudioSignal;
use crate::analysis::pipeline::{self, DEFAULT_N_MFCC};
use crate::analyzers::{AnalysisResult, FailureKind, GenreClassifier};
use crate::models::GbdtModel;
use crate::pool::ModelPool;

/// Class index to genre name, in the order the classifier was trained with.
pub const GENRE_LABELS: [&str; 11] = [
    "Bengali",
    "Bhangra",
    "Carnatic",
    "Dandiya",
    "Hindustani",
    "Kolattam",
    "Manipuri",
    "Nepali",
    "Rajasthani",
    "Uttarakhandi",
    "Assamese",
];

/// Maps a signal to one of the fixed genre labels using a pooled model.
pub struct GenreAnalyzer<M: GenreClassifier = GbdtModel> {
    pool: Arc<ModelPool<M>>,
}

impl<M: GenreClassifier> GenreAnalyzer<M> {
    pub fn new(pool: Arc<ModelPool<M>>) -> Self {
        Self { pool }
    }

    /// Extract features, claim a slot, predict, and map to a label.
    ///
    /// Feature extraction happens before any slot is claimed so a saturated
    /// pool is never held up by pipeline work. Every failure is folded into
    /// the result; the slot cannot leak.
    pub fn analyze(&self, signal: &AudioSignal) -> AnalysisResult {
        let features = match pipeline::extract(signal, DEFAULT_N_MFCC) {
            Ok(features) => features,
            Err(err) => {
                tracing::warn!(error = %err, "Genre feature extraction failed");
                return AnalysisResult::Failure {
                    kind: FailureKind::Decode,
                    detail: err.to_string(),
                };
            }
        };
        let flat = features.flatten();

        match self.pool.with_slot(|model| model.predict_class(&flat)) {
            None => {
                tracing::warn!("No free genre model slot");
                AnalysisResult::Unavailable
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Genre inference failed");
                AnalysisResult::Failure {
                    kind: FailureKind::Inference,
                    detail: err.to_string(),
                }
            }
            Some(Ok(class)) => match GENRE_LABELS.get(class) {
                Some(label) => {
                    tracing::debug!(label = *label, class, "Genre predicted");
                    AnalysisResult::Success {
                        label: (*label).to_string(),
                        probabilities: None,
                    }
                }
                None => AnalysisResult::Failure {
                    kind: FailureKind::Inference,
                    detail: format!("Predicted class {class} is outside the label table"),
                },
            },
        }
    }
}
