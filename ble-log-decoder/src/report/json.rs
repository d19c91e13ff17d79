//! Structured JSON artifact
//!
//! The one output other tooling may consume. Top-level keys and their shapes
//! are stable: `services`, `characteristics`, `commands`, `frequency`, plus
//! `stats`. All maps are ordered, so the same result always serializes to the
//! same bytes.

use crate::types::{AnalysisResult, Confidence, LineStats, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One entry of `commands`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCommand {
    pub index: usize,
    pub identifier: String,
    pub payload_hex: String,
    pub label: String,
    pub line: usize,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The structured artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub services: BTreeSet<String>,
    /// Handle (four hex digits) → identifier
    pub characteristics: BTreeMap<String, String>,
    pub commands: Vec<ArtifactCommand>,
    /// Payload hex → occurrence count
    pub frequency: BTreeMap<String, usize>,
    #[serde(default)]
    pub stats: LineStats,
}

impl Artifact {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            services: result.services.clone(),
            characteristics: result
                .characteristics
                .iter()
                .map(|(handle, id)| (handle.to_string(), id.clone()))
                .collect(),
            commands: result
                .commands
                .iter()
                .map(|cmd| ArtifactCommand {
                    index: cmd.index,
                    identifier: cmd.identifier.clone(),
                    payload_hex: cmd.payload_hex(),
                    label: cmd.label.clone(),
                    line: cmd.line,
                    confidence: cmd.confidence,
                    timestamp: cmd.timestamp.clone(),
                })
                .collect(),
            frequency: result.frequency.clone(),
            stats: result.stats,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse an artifact produced by [`Artifact::to_json_string`]
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Render a result as the JSON artifact
pub fn render(result: &AnalysisResult) -> Result<String> {
    Artifact::from_result(result).to_json_string()
}
