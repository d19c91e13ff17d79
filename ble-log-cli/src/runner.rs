//! Per-log processing
//!
//! One run = analyze one log, render its artifacts, persist them. Runs share
//! nothing but the read-only analyzer, so several can execute in parallel.

use ble_log_decoder::report::{self, json, txt};
use ble_log_decoder::{
    AnalysisResult, Analyzer, DecoderError, ReplayFormat, ReplayScript, ReportOptions,
};
use std::path::{Path, PathBuf};

/// Output settings shared by every run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_dir: Option<PathBuf>,
    pub report: ReportOptions,
    pub replay: Option<ReplayFormat>,
    pub replay_delay_ms: u64,
    pub write: bool,
}

/// What happened to one log
#[derive(Debug)]
pub struct RunOutcome {
    pub log: PathBuf,
    /// Rendered text report, or the fatal error that ended the run
    pub report: Result<String, DecoderError>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<DecoderError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.report.is_ok() && self.failures.is_empty()
    }
}

/// Artifact path for a log: `<dir>/<stem><suffix>`
pub fn artifact_path(log: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = log
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| log.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}", stem, suffix))
}

/// Analyze one log and persist its artifacts
pub fn process_log(analyzer: &Analyzer, log: &Path, settings: &RunSettings) -> RunOutcome {
    let mut outcome = RunOutcome {
        log: log.to_path_buf(),
        report: Ok(String::new()),
        written: Vec::new(),
        failures: Vec::new(),
    };

    let result = match analyzer.analyze_file(log) {
        Ok(result) => result,
        Err(e) => {
            log::error!("{:?}: {}", log, e);
            outcome.report = Err(e);
            return outcome;
        }
    };

    let text = txt::render(&result, &settings.report);
    if settings.write {
        persist(&result, &text, log, settings, &mut outcome);
    }
    outcome.report = Ok(text);
    outcome
}

/// Write every artifact; one failure does not stop the others
fn persist(
    result: &AnalysisResult,
    text: &str,
    log: &Path,
    settings: &RunSettings,
    outcome: &mut RunOutcome,
) {
    let dir = settings.output_dir.as_deref();
    let mut artifacts = vec![(artifact_path(log, dir, "_analysis.txt"), Ok(text.to_string()))];
    artifacts.push((artifact_path(log, dir, "_analysis.json"), json::render(result)));

    if let Some(format) = settings.replay {
        let script = ReplayScript::from_result(result, settings.replay_delay_ms);
        let suffix = format!("_replay.{}", format.extension());
        artifacts.push((artifact_path(log, dir, &suffix), script.render(format)));
    }

    for (path, contents) in artifacts {
        match contents.and_then(|contents| report::write_artifact(&path, &contents)) {
            Ok(()) => outcome.written.push(path),
            Err(e) => {
                log::error!("{}", e);
                outcome.failures.push(e);
            }
        }
    }
}
