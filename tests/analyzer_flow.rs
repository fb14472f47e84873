//! End-to-end flows: decode, analyze, aggregate, and saturate the pools.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use ragasense::analysis::audio::load_clip;
use ragasense::analyzers::genre::{GenreAnalyzer, GENRE_LABELS};
use ragasense::analyzers::instrument::{feature_tensor, INSTRUMENT_FEATURE_BANDS};
use ragasense::analyzers::{AnalysisResult, GenreClassifier};
use ragasense::config::AnalyzerConfig;
use ragasense::models::{GbdtModel, InferenceError, MlpModel};
use ragasense::orchestrator::AnalysisOrchestrator;
use ragasense::pool::ModelPool;
use support::{
    genre_model_favoring, instrument_model_favoring, sine_signal, write_artifact, write_test_wav,
};

const INPUT_FRAMES: usize = 216;

fn orchestrator_with(genre_class: usize, instrument_class: usize) -> AnalysisOrchestrator {
    let genre_models: Vec<GbdtModel> = (0..2).map(|_| genre_model_favoring(genre_class)).collect();
    let instrument_models: Vec<MlpModel> = (0..2)
        .map(|_| instrument_model_favoring(instrument_class, INPUT_FRAMES))
        .collect();
    AnalysisOrchestrator::with_pools(
        Arc::new(ModelPool::from_models("genre", genre_models)),
        Arc::new(ModelPool::from_models("instrument", instrument_models)),
    )
}

#[test]
fn wav_clip_round_trips_through_analyze_file() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    let signal = sine_signal(440.0, 3.0);
    write_test_wav(&wav, signal.samples(), signal.sample_rate());

    let orchestrator = orchestrator_with(4, 2);
    let analysis = orchestrator.analyze_file(&wav).expect("analyze");

    assert_eq!(analysis.genre.success_label(), Some("Hindustani"));
    assert_eq!(analysis.instrument.success_label(), Some("Sitar"));
    let key_tempo = analysis.key_tempo.expect("key/tempo present");
    assert_eq!(key_tempo.key, "A");
}

#[test]
fn analysis_serializes_with_distinct_statuses() {
    let orchestrator = orchestrator_with(0, 0);
    let analysis = orchestrator.analyze_signal(&sine_signal(330.0, 2.0));
    let json = serde_json::to_string(&analysis).expect("serialize");
    assert!(json.contains("\"status\":\"success\""));
    assert!(json.contains("\"Dhol\""));

    let busy = serde_json::to_string(&AnalysisResult::Unavailable).expect("serialize");
    assert_eq!(busy, "{\"status\":\"unavailable\"}");
}

#[test]
fn decode_failure_is_distinct_from_busy_and_inference() {
    let dir = tempfile::tempdir().unwrap();
    let not_audio = dir.path().join("junk.wav");
    std::fs::write(&not_audio, b"this is not a wav file at all").unwrap();

    let orchestrator = orchestrator_with(0, 0);
    assert!(orchestrator.analyze_file(&not_audio).is_err());
}

#[test]
fn orchestrator_from_config_loads_real_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let genre_path = dir.path().join("genre.json");
    let instrument_path = dir.path().join("instrument.json");
    write_artifact(&genre_path, &genre_model_favoring(7));
    write_artifact(
        &instrument_path,
        &instrument_model_favoring(1, INPUT_FRAMES),
    );

    let config = AnalyzerConfig {
        genre_model: genre_path,
        instrument_model: instrument_path,
        genre_slots: 2,
        instrument_slots: 2,
    };
    let orchestrator = AnalysisOrchestrator::new(&config).expect("pools initialize");
    let analysis = orchestrator.analyze_signal(&sine_signal(392.0, 2.0));
    assert_eq!(analysis.genre.success_label(), Some("Nepali"));
    assert_eq!(analysis.instrument.success_label(), Some("Flute"));
}

#[test]
fn missing_artifact_is_fatal_at_startup() {
    let config = AnalyzerConfig {
        genre_model: "/definitely/not/here.json".into(),
        instrument_model: "/definitely/not/here/either.json".into(),
        genre_slots: 2,
        instrument_slots: 2,
    };
    assert!(AnalysisOrchestrator::new(&config).is_err());
}

#[test]
fn corrupt_artifact_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let genre_path = dir.path().join("genre.json");
    std::fs::write(&genre_path, b"{\"model_version\": 1").unwrap();
    let instrument_path = dir.path().join("instrument.json");
    write_artifact(
        &instrument_path,
        &instrument_model_favoring(0, INPUT_FRAMES),
    );

    let config = AnalyzerConfig {
        genre_model: genre_path,
        instrument_model: instrument_path,
        genre_slots: 1,
        instrument_slots: 1,
    };
    assert!(AnalysisOrchestrator::new(&config).is_err());
}

#[test]
fn instrument_tensor_shape_is_stable_for_all_durations() {
    for seconds in [2.0_f32, 5.0, 8.0] {
        let tensor = feature_tensor(&sine_signal(440.0, seconds), INPUT_FRAMES).expect("tensor");
        assert_eq!(tensor.dim(), (INSTRUMENT_FEATURE_BANDS, INPUT_FRAMES));
    }
}

#[test]
fn loaded_wav_matches_direct_signal_features() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("clip.wav");
    let signal = sine_signal(440.0, 1.0);
    write_test_wav(&wav, signal.samples(), signal.sample_rate());
    let loaded = load_clip(&wav, None).expect("load");
    assert_eq!(loaded.sample_rate(), signal.sample_rate());
    assert_eq!(loaded.samples().len(), signal.samples().len());
}

/// Classifier that parks inside inference until the main thread lets go,
/// keeping its slot busy for the duration.
struct ParkedClassifier {
    inside: Arc<AtomicUsize>,
    release: Arc<Barrier>,
}

impl GenreClassifier for ParkedClassifier {
    fn predict_class(&self, _features: &[f32]) -> Result<usize, InferenceError> {
        self.inside.fetch_add(1, Ordering::SeqCst);
        self.release.wait();
        Ok(0)
    }
}

#[test]
fn two_slot_pool_with_three_requests_rejects_exactly_one() {
    let inside = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Barrier::new(3));
    let models = (0..2)
        .map(|_| ParkedClassifier {
            inside: inside.clone(),
            release: release.clone(),
        })
        .collect();
    let pool = Arc::new(ModelPool::from_models("genre", models));
    let analyzer = Arc::new(GenreAnalyzer::new(pool));

    let first = {
        let analyzer = analyzer.clone();
        std::thread::spawn(move || analyzer.analyze(&sine_signal(440.0, 1.0)))
    };
    let second = {
        let analyzer = analyzer.clone();
        std::thread::spawn(move || analyzer.analyze(&sine_signal(330.0, 1.0)))
    };

    // Both in-flight analyses must hold their slots before the third request.
    while inside.load(Ordering::SeqCst) < 2 {
        std::thread::yield_now();
    }
    let third = analyzer.analyze(&sine_signal(220.0, 1.0));
    assert!(third.is_unavailable(), "saturated pool must reject");

    release.wait();
    let first = first.join().unwrap();
    let second = second.join().unwrap();
    for result in [&first, &second] {
        let label = result.success_label().expect("in-flight requests succeed");
        assert!(GENRE_LABELS.contains(&label));
    }
}
