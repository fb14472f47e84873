use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{argmax, softmax, InferenceError, ModelLoadError};

/// Single-split weak learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stump {
    /// Feature index the split reads.
    pub feature_index: u16,
    /// Split threshold in feature units.
    pub threshold: f32,
    /// Contribution when `feature <= threshold`.
    pub left_value: f32,
    /// Contribution when `feature > threshold`.
    pub right_value: f32,
}

impl Stump {
    fn response(&self, features: &[f32]) -> f32 {
        let value = features
            .get(self.feature_index as usize)
            .copied()
            .unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Gradient-boosted stump ensemble for multi-class classification.
///
/// The artifact carries one stump per class per boosting round plus the
/// initial logits; prediction is a weighted sum of stump responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Artifact format version.
    pub model_version: i64,
    /// Number of `f32` values the model consumes per prediction.
    pub feature_len: usize,
    /// Number of output classes.
    pub num_classes: usize,
    /// Shrinkage applied to every stump response.
    pub learning_rate: f32,
    /// Starting logits before any boosting round.
    pub init_raw: Vec<f32>,
    /// Boosting rounds, each holding one stump per class.
    pub rounds: Vec<Vec<Stump>>,
}

impl GbdtModel {
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

    /// Check structural invariants of the weight pack.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_classes < 2 {
            return Err("Model needs at least two classes".to_string());
        }
        if self.feature_len == 0 {
            return Err("Model feature length must be non-zero".to_string());
        }
        if self.init_raw.len() != self.num_classes {
            return Err(format!(
                "init_raw holds {} logits but the model has {} classes",
                self.init_raw.len(),
                self.num_classes
            ));
        }
        for (round_index, round) in self.rounds.iter().enumerate() {
            if round.len() != self.num_classes {
                return Err(format!(
                    "Round {round_index} holds {} stumps, expected {}",
                    round.len(),
                    self.num_classes
                ));
            }
            for stump in round {
                if stump.feature_index as usize >= self.feature_len {
                    return Err(format!(
                        "Round {round_index} reads feature {} beyond length {}",
                        stump.feature_index, self.feature_len
                    ));
                }
            }
        }
        Ok(())
    }

    /// Raw logits for one feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        if features.len() != self.feature_len {
            return Err(InferenceError::InputShape {
                expected: self.feature_len,
                got: features.len(),
            });
        }
        let mut raw = self.init_raw.clone();
        for round in &self.rounds {
            for (class, stump) in round.iter().enumerate() {
                raw[class] += self.learning_rate * stump.response(features);
            }
        }
        Ok(raw)
    }

    /// Class probabilities for one feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        Ok(softmax(&self.predict_raw(features)?))
    }

    /// Most likely class index; ties resolve to the lowest index.
    pub fn predict_class(&self, features: &[f32]) -> Result<usize, InferenceError> {
        Ok(argmax(&self.predict_raw(features)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_model() -> GbdtModel {
        GbdtModel {
            model_version: 1,
            feature_len: 2,
            num_classes: 2,
            learning_rate: 1.0,
            init_raw: vec![0.0, 0.0],
            rounds: vec![vec![
                Stump {
                    feature_index: 0,
                    threshold: 0.0,
                    left_value: 1.0,
                    right_value: -1.0,
                },
                Stump {
                    feature_index: 0,
                    threshold: 0.0,
                    left_value: -1.0,
                    right_value: 1.0,
                },
            ]],
        }
    }

    #[test]
    fn stump_split_selects_side() {
        let model = two_class_model();
        assert_eq!(model.predict_class(&[0.0, 0.0]).unwrap(), 0);
        assert_eq!(model.predict_class(&[1.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn wrong_input_length_is_rejected() {
        let model = two_class_model();
        assert!(matches!(
            model.predict_class(&[0.0; 5]),
            Err(InferenceError::InputShape {
                expected: 2,
                got: 5
            })
        ));
    }

    #[test]
    fn validation_catches_bad_round_width() {
        let mut model = two_class_model();
        model.rounds[0].pop();
        assert!(model.validate().is_err());
    }

    #[test]
    fn validation_catches_out_of_range_feature() {
        let mut model = two_class_model();
        model.rounds[0][0].feature_index = 9;
        assert!(model.validate().is_err());
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = two_class_model();
        let probs = model.predict_proba(&[0.5, 0.0]).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }
}
