//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library.
//! Output locations, report formats and the like belong to the application layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported log dialects, in recognition priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Line-delimited JSON event records (`log stream --style ndjson`)
    EventRecord,
    /// ATT-level capture text (PacketLogger export)
    PacketLogger,
    /// Free-text console/debug output with embedded hex
    Console,
}

impl Dialect {
    /// All dialects in priority order
    pub const ALL: [Dialect; 3] = [Dialect::EventRecord, Dialect::PacketLogger, Dialect::Console];
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::EventRecord => write!(f, "event_record"),
            Dialect::PacketLogger => write!(f, "packet_logger"),
            Dialect::Console => write!(f, "console"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "event_record" | "ndjson" | "json" => Ok(Dialect::EventRecord),
            "packet_logger" | "packetlogger" | "att" => Ok(Dialect::PacketLogger),
            "console" | "text" => Ok(Dialect::Console),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Enabled dialects; recognition order is always the fixed priority order
    #[serde(default = "default_dialects")]
    pub dialects: Vec<Dialect>,

    /// Prefix of the identifier family the console recognizer looks for
    /// (an identifier is this prefix followed by hex digits, four characters total)
    #[serde(default = "default_identifier_prefix")]
    pub identifier_prefix: String,

    /// Whether console lines with bracketed hex but no write are kept as raw data
    #[serde(default = "default_true")]
    pub record_raw_data: bool,
}

fn default_dialects() -> Vec<Dialect> {
    Dialect::ALL.to_vec()
}

fn default_identifier_prefix() -> String {
    "FFF".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            dialects: default_dialects(),
            identifier_prefix: default_identifier_prefix(),
            record_raw_data: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: restrict recognition to the given dialects
    pub fn with_dialects(mut self, dialects: Vec<Dialect>) -> Self {
        self.dialects = dialects;
        self
    }

    /// Builder method: set the identifier family prefix
    pub fn with_identifier_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = prefix.into();
        self
    }

    /// Builder method: keep or drop raw data observations
    pub fn with_raw_data(mut self, enabled: bool) -> Self {
        self.record_raw_data = enabled;
        self
    }

    /// Check if a dialect should be recognized
    pub fn is_enabled(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_dialects(vec![Dialect::PacketLogger])
            .with_identifier_prefix("FE")
            .with_raw_data(false);

        assert!(config.is_enabled(Dialect::PacketLogger));
        assert!(!config.is_enabled(Dialect::Console));
        assert_eq!(config.identifier_prefix, "FE");
        assert!(!config.record_raw_data);
    }

    #[test]
    fn test_defaults_enable_everything() {
        let config = DecoderConfig::new();
        for dialect in Dialect::ALL {
            assert!(config.is_enabled(dialect));
        }
        assert_eq!(config.identifier_prefix, "FFF");
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("ndjson".parse::<Dialect>(), Ok(Dialect::EventRecord));
        assert_eq!("packet-logger".parse::<Dialect>(), Ok(Dialect::PacketLogger));
        assert!("pcap".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Console.to_string(), "console");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DecoderConfig = serde_json::from_str(r#"{"identifier_prefix": "FEE"}"#).unwrap();
        assert_eq!(config.dialects.len(), 3);
        assert!(config.record_raw_data);
    }
}
