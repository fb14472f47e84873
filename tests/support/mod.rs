//! Shared fixtures: synthetic signals, WAV files and tiny model artifacts.

#![allow(dead_code)]

use std::path::Path;

use ragasense::analysis::audio::AudioSignal;
use ragasense::analysis::ANALYSIS_SAMPLE_RATE;
use ragasense::models::{GbdtModel, MlpModel};

/// A pure sine tone at the analysis sample rate.
pub fn sine_signal(freq: f32, seconds: f32) -> AudioSignal {
    let sr = ANALYSIS_SAMPLE_RATE;
    let samples: Vec<f32> = (0..(seconds * sr as f32) as usize)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin() * 0.8)
        .collect();
    AudioSignal::new(samples, sr)
}

/// Write mono float samples as a WAV clip.
pub fn write_test_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create wav parent dirs");
    }
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav writer");
    for &sample in samples {
        writer.write_sample(sample).expect("write wav sample");
    }
    writer.finalize().expect("finalize wav");
}

/// A stumpless genre artifact whose initial logits always pick `class`.
pub fn genre_model_favoring(class: usize) -> GbdtModel {
    let mut init_raw = vec![0.0_f32; 11];
    init_raw[class] = 2.5;
    GbdtModel {
        model_version: 1,
        feature_len: 120,
        num_classes: 11,
        learning_rate: 0.1,
        init_raw,
        rounds: Vec::new(),
    }
}

/// An instrument artifact whose output bias always picks `class`.
pub fn instrument_model_favoring(class: usize, input_frames: usize) -> MlpModel {
    let input_bands = 141;
    let input_len = input_bands * input_frames;
    let hidden_size = 2;
    let num_classes = 5;
    let mut bias2 = vec![0.0_f32; num_classes];
    bias2[class] = 3.0;
    MlpModel {
        model_version: 1,
        input_bands,
        input_frames,
        hidden_size,
        num_classes,
        weights1: vec![0.0; input_len * hidden_size],
        bias1: vec![0.0; hidden_size],
        weights2: vec![0.0; hidden_size * num_classes],
        bias2,
        feature_mean: vec![0.0; input_len],
        feature_std: vec![1.0; input_len],
    }
}

/// Serialize a model artifact to JSON at `path`.
pub fn write_artifact<T: serde::Serialize>(path: &Path, model: &T) {
    let bytes = serde_json::to_vec(model).expect("serialize artifact");
    std::fs::write(path, bytes).expect("write artifact");
}
