//! Composition of the analyzers behind a single analyze-this-file call.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::analysis::audio::{self, AudioSignal, DecodeError};
use crate::analyzers::genre::GenreAnalyzer;
use crate::analyzers::instrument::InstrumentAnalyzer;
use crate::analyzers::key_tempo::{self, KeyTempo};
use crate::analyzers::AnalysisResult;
use crate::config::AnalyzerConfig;
use crate::models::{GbdtModel, MlpModel, ModelLoadError};
use crate::pool::ModelPool;

/// Aggregated outcome of analyzing one file.
///
/// The genre and instrument fields carry their own success/busy/failure
/// state; key and tempo are absent only when that stage could not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileAnalysis {
    pub genre: AnalysisResult,
    pub instrument: AnalysisResult,
    pub key_tempo: Option<KeyTempo>,
}

/// Owns both model pools and answers `analyze_file` requests.
pub struct AnalysisOrchestrator {
    genre: GenreAnalyzer,
    instrument: InstrumentAnalyzer,
}

impl AnalysisOrchestrator {
    /// Initialize both pools from configured artifacts.
    ///
    /// A missing or malformed artifact is fatal here; startup code decides
    /// whether to abort or run with reduced capability.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, ModelLoadError> {
        let genre_pool = ModelPool::initialize(
            "genre",
            config.genre_slots,
            &config.genre_model,
            GbdtModel::load_json,
        )?;
        let instrument_pool = ModelPool::initialize(
            "instrument",
            config.instrument_slots,
            &config.instrument_model,
            MlpModel::load_json,
        )?;
        Ok(Self::with_pools(
            Arc::new(genre_pool),
            Arc::new(instrument_pool),
        ))
    }

    /// Build around preconstructed pools.
    pub fn with_pools(
        genre_pool: Arc<ModelPool<GbdtModel>>,
        instrument_pool: Arc<ModelPool<MlpModel>>,
    ) -> Self {
        Self {
            genre: GenreAnalyzer::new(genre_pool),
            instrument: InstrumentAnalyzer::new(instrument_pool),
        }
    }

    /// Decode a file once and run all three analyses over the signal.
    ///
    /// Each analyzer bounds its own view of the signal, so a single decode
    /// serves genre (full clip), instrument (first five seconds) and
    /// key/tempo (first ten seconds). A pooled analyzer reporting
    /// `Unavailable` is retried exactly once; a busy system after that is
    /// surfaced to the caller, never looped on.
    pub fn analyze_file(&self, path: &Path) -> Result<FileAnalysis, DecodeError> {
        if let Some(duration) = audio::probe_duration_seconds(path) {
            tracing::info!(path = %path.display(), duration_seconds = duration, "Analyzing clip");
        } else {
            tracing::info!(path = %path.display(), "Analyzing clip");
        }
        let signal = audio::load_clip(path, None)?;
        Ok(self.analyze_signal(&signal))
    }

    /// Analyze an already-decoded signal; the entry point for callers that
    /// hold samples rather than files.
    pub fn analyze_signal(&self, signal: &AudioSignal) -> FileAnalysis {
        let genre = retry_once_if_busy(|| self.genre.analyze(signal));
        let instrument = retry_once_if_busy(|| self.instrument.analyze(signal));
        let key_tempo = match key_tempo::analyze(signal) {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::warn!(error = %err, "Key/tempo analysis failed");
                None
            }
        };
        FileAnalysis {
            genre,
            instrument,
            key_tempo,
        }
    }
}

fn retry_once_if_busy(run: impl Fn() -> AnalysisResult) -> AnalysisResult {
    let first = run();
    if !first.is_unavailable() {
        return first;
    }
    tracing::debug!("Pool busy, retrying once");
    run()
}
