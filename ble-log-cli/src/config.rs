//! Configuration loading and parsing
//!
//! Everything here is optional: a missing section falls back to defaults and
//! command-line flags override whatever the file says.

use anyhow::{Context, Result};
use ble_log_decoder::{DecoderConfig, KnowledgeBase, ReplayFormat, DEFAULT_REPLAY_DELAY_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Where artifacts go (default: next to each log)
    pub output_dir: Option<PathBuf>,
    /// Commands listed in the text report
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub replay: Option<ReplayFormat>,
    #[serde(default = "default_replay_delay")]
    pub replay_delay_ms: u64,
}

fn default_limit() -> usize {
    20
}

fn default_replay_delay() -> u64 {
    DEFAULT_REPLAY_DELAY_MS
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            limit: default_limit(),
            replay: None,
            replay_delay_ms: default_replay_delay(),
        }
    }
}

/// Extra knowledge entries layered over the built-in tables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
    #[serde(default)]
    pub fallback: Vec<FallbackEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignatureEntry {
    /// Three bytes as hex, e.g. "0D0100"
    pub bytes: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackEntry {
    /// Leading byte as hex, e.g. "0D"
    pub byte: String,
    pub label: String,
}

impl KnowledgeConfig {
    /// Built-in knowledge plus the configured entries
    pub fn build(&self) -> Result<KnowledgeBase> {
        let mut knowledge = KnowledgeBase::builtin();
        for entry in &self.signatures {
            knowledge
                .add_signature_hex(&entry.bytes, entry.label.clone())
                .with_context(|| format!("Invalid signature entry '{}'", entry.label))?;
        }
        for entry in &self.fallback {
            knowledge
                .add_category_hex(&entry.byte, entry.label.clone())
                .with_context(|| format!("Invalid fallback entry '{}'", entry.label))?;
        }
        Ok(knowledge)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ble_log_decoder::Dialect;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            files = ["capture.log"]

            [decoder]
            dialects = ["packet_logger", "console"]

            [output]
            limit = 50
            replay = "swift"

            [[knowledge.signatures]]
            bytes = "0D0100"
            label = "SSID Broadcast"

            [[knowledge.fallback]]
            byte = "07"
            label = "Status Command"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.files.len(), 1);
        assert!(!config.decoder.is_enabled(Dialect::EventRecord));
        assert_eq!(config.decoder.identifier_prefix, "FFF");
        assert_eq!(config.output.limit, 50);
        assert_eq!(config.output.replay, Some(ReplayFormat::Swift));
        assert_eq!(config.output.replay_delay_ms, 200);

        let knowledge = config.knowledge.build().unwrap();
        assert_eq!(knowledge.lookup_signature(&[0x0d, 0x01, 0x00]), Some("SSID Broadcast"));
        assert_eq!(knowledge.lookup_category(0x07), Some("Status Command"));
    }

    #[test]
    fn test_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.files.is_empty());
        assert_eq!(config.output.limit, 20);
        assert!(config.output.replay.is_none());
        assert_eq!(config.knowledge.build().unwrap().stats().num_signatures, 8);
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [[knowledge.signatures]]
            bytes = "0D01"
            label = "Too short"
            "#,
        )
        .unwrap();
        assert!(config.knowledge.build().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\nreplay_delay_ms = 500\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.output.replay_delay_ms, 500);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
