//! Instrument classification over a fixed-shape spectro-cepstral tensor.

use std::sync::Arc;

use ndarray::Array2;

use crate::analysis::audio::AudioSignal;
use crate::analysis::pipeline::{
    complex_spectrogram, mel_spectrogram, mfcc_from_mel, power_spectrogram, power_to_db,
    FeatureError, STFT_FRAME_SIZE, STFT_HOP_SIZE,
};
use crate::analyzers::{AnalysisResult, FailureKind, InstrumentClassifier};
use crate::models::{argmax, MlpModel};
use crate::pool::ModelPool;

/// Class index to instrument name, in training order.
pub const INSTRUMENT_LABELS: [&str; 5] = ["Dhol", "Flute", "Sitar", "Tabla", "Veena"];

/// Only the head of the clip carries the attack content the model wants.
pub const INSTRUMENT_CLIP_SECONDS: f32 = 5.0;

pub(crate) const INSTRUMENT_MEL_BANDS: usize = 128;
pub(crate) const INSTRUMENT_MFCC_COUNT: usize = 13;

/// Feature rows in the stacked tensor: mel bands above, cepstra below.
pub const INSTRUMENT_FEATURE_BANDS: usize = INSTRUMENT_MEL_BANDS + INSTRUMENT_MFCC_COUNT;

/// Build the `(141, target_frames)` input tensor for the instrument model.
///
/// A log-magnitude mel spectrogram and 13 cepstral coefficients are computed
/// over the first five seconds and stacked along the feature axis. The time
/// axis is padded with zeros on the right when short and truncated on the
/// right when long, so every clip produces an identically-shaped tensor.
/// `target_frames` comes from the model artifact, never from a constant here.
pub fn feature_tensor(
    signal: &AudioSignal,
    target_frames: usize,
) -> Result<Array2<f32>, FeatureError> {
    if signal.is_empty() {
        return Err(FeatureError::EmptySignal);
    }
    let clip = signal.head(INSTRUMENT_CLIP_SECONDS);
    let spectrum = complex_spectrogram(clip, STFT_FRAME_SIZE, STFT_HOP_SIZE);
    let power = power_spectrogram(&spectrum);
    let mel = mel_spectrogram(
        &power,
        signal.sample_rate(),
        STFT_FRAME_SIZE,
        INSTRUMENT_MEL_BANDS,
    );
    let log_mel = power_to_db(&mel);
    let mfcc = mfcc_from_mel(&mel, INSTRUMENT_MFCC_COUNT);

    let frames = target_frames.min(log_mel.ncols());
    let mut tensor = Array2::zeros((INSTRUMENT_FEATURE_BANDS, target_frames));
    for band in 0..INSTRUMENT_MEL_BANDS {
        for frame in 0..frames {
            tensor[[band, frame]] = log_mel[[band, frame]];
        }
    }
    for coefficient in 0..INSTRUMENT_MFCC_COUNT {
        for frame in 0..frames {
            tensor[[INSTRUMENT_MEL_BANDS + coefficient, frame]] = mfcc[[coefficient, frame]];
        }
    }
    Ok(tensor)
}

/// Maps a signal to an instrument label plus the full class distribution.
pub struct InstrumentAnalyzer<M: InstrumentClassifier = MlpModel> {
    pool: Arc<ModelPool<M>>,
}

impl<M: InstrumentClassifier> InstrumentAnalyzer<M> {
    pub fn new(pool: Arc<ModelPool<M>>) -> Self {
        Self { pool }
    }

    /// Build the tensor, claim a slot, and report every class probability.
    ///
    /// Arg-max ties resolve to the lowest class index. Failures release the
    /// slot and fold into the result.
    pub fn analyze(&self, signal: &AudioSignal) -> AnalysisResult {
        let Some(target_frames) = self.pool.first_model().map(InstrumentClassifier::input_frames)
        else {
            tracing::warn!("Instrument pool holds no models");
            return AnalysisResult::Unavailable;
        };
        let tensor = match feature_tensor(signal, target_frames) {
            Ok(tensor) => tensor,
            Err(err) => {
                tracing::warn!(error = %err, "Instrument feature extraction failed");
                return AnalysisResult::Failure {
                    kind: FailureKind::Decode,
                    detail: err.to_string(),
                };
            }
        };
        let flat: Vec<f32> = tensor.iter().copied().collect();

        match self.pool.with_slot(|model| model.predict_proba(&flat)) {
            None => {
                tracing::warn!("No free instrument model slot");
                AnalysisResult::Unavailable
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Instrument inference failed");
                AnalysisResult::Failure {
                    kind: FailureKind::Inference,
                    detail: err.to_string(),
                }
            }
            Some(Ok(probabilities)) => {
                if probabilities.len() != INSTRUMENT_LABELS.len() {
                    return AnalysisResult::Failure {
                        kind: FailureKind::Inference,
                        detail: format!(
                            "Model produced {} probabilities for {} classes",
                            probabilities.len(),
                            INSTRUMENT_LABELS.len()
                        ),
                    };
                }
                let best = argmax(&probabilities);
                let label = INSTRUMENT_LABELS[best].to_string();
                tracing::debug!(label = %label, "Instrument predicted");
                let named = INSTRUMENT_LABELS
                    .iter()
                    .zip(probabilities.iter())
                    .map(|(name, &p)| ((*name).to_string(), p))
                    .collect();
                AnalysisResult::Success {
                    label,
                    probabilities: Some(named),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InferenceError;

    const TEST_FRAMES: usize = 216;

    struct FixedProbs(Vec<f32>);

    impl InstrumentClassifier for FixedProbs {
        fn input_frames(&self) -> usize {
            TEST_FRAMES
        }

        fn predict_proba(&self, _input: &[f32]) -> Result<Vec<f32>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    fn signal_of_seconds(seconds: f32) -> AudioSignal {
        let sr = crate::analysis::ANALYSIS_SAMPLE_RATE;
        let samples: Vec<f32> = (0..(seconds * sr as f32) as usize)
            .map(|i| (2.0 * std::f32::consts::PI * 330.0 * i as f32 / sr as f32).sin())
            .collect();
        AudioSignal::new(samples, sr)
    }

    #[test]
    fn tensor_shape_is_fixed_for_any_duration() {
        for seconds in [1.0_f32, 5.0, 9.0] {
            let tensor = feature_tensor(&signal_of_seconds(seconds), TEST_FRAMES).unwrap();
            assert_eq!(tensor.dim(), (INSTRUMENT_FEATURE_BANDS, TEST_FRAMES));
        }
    }

    #[test]
    fn short_clip_pads_with_zeros_on_the_right() {
        let tensor = feature_tensor(&signal_of_seconds(1.0), TEST_FRAMES).unwrap();
        // One second at 22050 with hop 512 gives 44 frames; the tail is padding.
        for band in 0..INSTRUMENT_FEATURE_BANDS {
            assert_eq!(tensor[[band, TEST_FRAMES - 1]], 0.0);
        }
    }

    #[test]
    fn tie_breaks_toward_lowest_class_index() {
        let pool = Arc::new(ModelPool::from_models(
            "instrument",
            vec![FixedProbs(vec![0.3, 0.3, 0.2, 0.1, 0.1])],
        ));
        let analyzer = InstrumentAnalyzer::new(pool);
        let result = analyzer.analyze(&signal_of_seconds(2.0));
        assert_eq!(result.success_label(), Some("Dhol"));
    }

    #[test]
    fn sitar_vector_resolves_to_sitar() {
        let pool = Arc::new(ModelPool::from_models(
            "instrument",
            vec![FixedProbs(vec![0.2, 0.2, 0.6, 0.0, 0.0])],
        ));
        let analyzer = InstrumentAnalyzer::new(pool);
        let result = analyzer.analyze(&signal_of_seconds(2.0));
        assert_eq!(result.success_label(), Some("Sitar"));
        match result {
            AnalysisResult::Success {
                probabilities: Some(probs),
                ..
            } => {
                assert_eq!(probs.len(), 5);
                assert_eq!(probs[2].0, "Sitar");
            }
            other => panic!("expected success with probabilities, got {other:?}"),
        }
    }

    #[test]
    fn wrong_class_count_is_an_inference_failure() {
        let pool = Arc::new(ModelPool::from_models(
            "instrument",
            vec![FixedProbs(vec![0.5, 0.5])],
        ));
        let analyzer = InstrumentAnalyzer::new(pool.clone());
        assert!(matches!(
            analyzer.analyze(&signal_of_seconds(1.0)),
            AnalysisResult::Failure {
                kind: FailureKind::Inference,
                ..
            }
        ));
        assert_eq!(pool.free_slots(), 1);
    }

    #[test]
    fn empty_pool_reports_unavailable() {
        let pool: Arc<ModelPool<FixedProbs>> =
            Arc::new(ModelPool::from_models("instrument", vec![]));
        let analyzer = InstrumentAnalyzer::new(pool);
        assert!(analyzer.analyze(&signal_of_seconds(1.0)).is_unavailable());
    }
}
