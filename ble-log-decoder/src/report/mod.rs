//! Report generation
//!
//! Renders an [`AnalysisResult`](crate::AnalysisResult) as a text summary, a
//! structured JSON artifact and an optional replay script skeleton. Rendering
//! never touches a device; writing is limited to [`write_artifact`].

pub mod json;
pub mod replay;
pub mod txt;

use crate::types::{DecoderError, Result};
use std::fs;
use std::path::Path;

pub use json::{Artifact, ArtifactCommand};
pub use replay::{ReplayFormat, ReplayScript, ReplayStep, DEFAULT_REPLAY_DELAY_MS};

/// Presentation options for the text report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Commands listed in full (the rest are summarised)
    pub limit: usize,
    /// Payloads listed in the frequency section
    pub top_payloads: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            top_payloads: 5,
        }
    }
}

impl ReportOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Write one artifact to disk
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| DecoderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {:?} ({} bytes)", path, contents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_artifact(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_artifact_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        match write_artifact(&path, "hello") {
            Err(DecoderError::OutputWriteFailed { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected {:?}", other),
        }
    }
}
