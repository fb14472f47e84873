//! Pipeline-level properties: layout, determinism and transform memoization.

mod support;

use ragasense::analysis::pipeline::{
    self, FeatureVector, TransformCache, BASE_DESCRIPTORS, DEFAULT_N_MFCC, TRANSFORM_HARMONIC,
    TRANSFORM_MEL, TRANSFORM_PERCUSSIVE, TRANSFORM_STFT,
};
use support::sine_signal;

#[test]
fn vector_is_120_scalars_in_fixed_order() {
    let signal = sine_signal(440.0, 3.0);
    let features = pipeline::extract(&signal, DEFAULT_N_MFCC).expect("extract");
    let flat = features.flatten();
    assert_eq!(flat.len(), FeatureVector::scalar_len(DEFAULT_N_MFCC));
    assert_eq!(flat.len(), 120);

    let names: Vec<&str> = features.rows().iter().map(|row| row.name.as_str()).collect();
    assert_eq!(&names[..10], &BASE_DESCRIPTORS);
    for (i, name) in names[10..].iter().enumerate() {
        assert_eq!(*name, format!("mfcc_{i}"));
    }
}

#[test]
fn sine_clip_tempo_row_has_zero_variance() {
    let signal = sine_signal(440.0, 3.0);
    let features = pipeline::extract(&signal, DEFAULT_N_MFCC).expect("extract");
    let tempo = &features.rows()[0];
    assert_eq!(tempo.name, "tempo");
    assert_eq!(tempo.stats.variance, 0.0);
    assert_eq!(tempo.stats.min, tempo.stats.max);
}

#[test]
fn extraction_is_deterministic_across_calls() {
    let signal = sine_signal(261.63, 2.0);
    let first = pipeline::extract(&signal, DEFAULT_N_MFCC).expect("first");
    let second = pipeline::extract(&signal, DEFAULT_N_MFCC).expect("second");
    assert_eq!(first.flatten(), second.flatten());
}

#[test]
fn expensive_transforms_run_exactly_once() {
    let signal = sine_signal(440.0, 2.0);
    let mut cache = TransformCache::new();
    let _ = pipeline::extract_with_cache(&signal, DEFAULT_N_MFCC, &mut cache).expect("extract");
    assert_eq!(cache.compute_count(TRANSFORM_STFT), 1);
    assert_eq!(cache.compute_count(TRANSFORM_HARMONIC), 1);
    assert_eq!(cache.compute_count(TRANSFORM_PERCUSSIVE), 1);
    assert_eq!(cache.compute_count(TRANSFORM_MEL), 1);
}

#[test]
fn silent_clip_produces_the_zero_signature() {
    let signal = ragasense::analysis::audio::AudioSignal::new(vec![0.0; 44_100], 22_050);
    let features = pipeline::extract(&signal, DEFAULT_N_MFCC).expect("extract");
    assert!(features.flatten().iter().all(|&v| v == 0.0));
}

#[test]
fn mfcc_count_scales_the_vector() {
    let signal = sine_signal(392.0, 1.0);
    for n_mfcc in [13_usize, 20, 40] {
        let features = pipeline::extract(&signal, n_mfcc).expect("extract");
        assert_eq!(features.flatten().len(), 4 * (10 + n_mfcc));
    }
}
