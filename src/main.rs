//! Command-line entry point: analyze one clip and print the result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use ragasense::config::AnalyzerConfig;
use ragasense::logging;
use ragasense::orchestrator::AnalysisOrchestrator;

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let (clip, config_path) = match parse_args() {
        Ok(parsed) => parsed,
        Err(usage) => {
            eprintln!("{usage}");
            return ExitCode::FAILURE;
        }
    };

    let config = match AnalyzerConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = match AnalysisOrchestrator::new(&config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            tracing::error!(error = %err, "Classifier unusable, aborting");
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.analyze_file(&clip) {
        Ok(analysis) => match serde_json::to_string_pretty(&analysis) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                tracing::error!(error = %err, "Could not serialize analysis");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "Analysis failed");
            ExitCode::FAILURE
        }
    }
}

fn parse_args() -> Result<(PathBuf, Option<PathBuf>), String> {
    let mut args = std::env::args_os().skip(1);
    let mut clip = None;
    let mut config = None;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| "--config requires a path".to_string())?;
            config = Some(PathBuf::from(value));
        } else if clip.is_none() {
            clip = Some(PathBuf::from(arg));
        } else {
            return Err(usage());
        }
    }
    clip.map(|clip| (clip, config)).ok_or_else(usage)
}

fn usage() -> String {
    "Usage: ragasense <clip> [--config <config.toml>]".to_string()
}
