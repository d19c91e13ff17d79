//! Core types for the BLE log decoder library
//!
//! This module defines the events the decoder extracts from capture logs and the
//! aggregate it builds from them. Events are plain data: they know the line they
//! came from but nothing about the run that produced them.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that end a run (or a single output step)
///
/// Problems inside individual lines are never errors: undecodable lines, unmatched
/// lines and malformed hex are counted in [`LineStats`] instead.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Cannot open log file {path:?}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log after {lines_processed} lines: {source}")]
    ReadFailed {
        lines_processed: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid knowledge base entry: {0}")]
    InvalidKnowledge(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Attribute handle of a characteristic within one captured session
///
/// Handles are log-local. `0x12` and `0x0012` are the same handle; both display
/// as `0012`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub u16);

impl Handle {
    /// Parse a handle from hex text, with or without a `0x` prefix
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if digits.is_empty() {
            return None;
        }
        u16::from_str_radix(digits, 16).ok().map(Handle)
    }

    /// Label used when no identifier is known for this handle
    pub fn fallback_label(&self) -> String {
        format!("Handle_{}", self)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl FromStr for Handle {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        Handle::parse_hex(s)
            .ok_or_else(|| DecoderError::InvalidKnowledge(format!("not a handle: {:?}", s)))
    }
}

/// Identifier used for writes that carry neither a handle nor an identifier
pub const UNKNOWN_HANDLE_LABEL: &str = "Handle_unknown";

/// Raw bytes extracted from a hex run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Full bytes recovered from the run
    pub bytes: Vec<u8>,
    /// True if odd-length or invalid residue was dropped
    pub truncated: bool,
}

impl Payload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Canonical upper-case hex with no separators (`010100`)
    pub fn hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

/// A structured protocol event recovered from one log line
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    /// A service (or bare identifier) seen during discovery
    ServiceDiscovered {
        line: usize,
        timestamp: Option<String>,
        identifier: String,
    },

    /// A characteristic bound to a handle
    CharacteristicDiscovered {
        line: usize,
        timestamp: Option<String>,
        identifier: String,
        handle: Handle,
    },

    /// A write to the device
    WriteIssued {
        line: usize,
        timestamp: Option<String>,
        handle: Option<Handle>,
        /// Identifier mentioned on the same line, if any
        identifier: Option<String>,
        payload: Payload,
    },

    /// A read request
    ReadRequested {
        line: usize,
        timestamp: Option<String>,
        handle: Option<Handle>,
        identifier: Option<String>,
    },

    /// A notification or indication from the device
    NotifyReceived {
        line: usize,
        timestamp: Option<String>,
        handle: Option<Handle>,
        identifier: Option<String>,
        payload: Option<Payload>,
    },

    /// Hex data that is not attributable to a write
    RawDataObserved {
        line: usize,
        timestamp: Option<String>,
        payload: Payload,
    },
}

impl LogEvent {
    /// Source line this event was extracted from
    pub fn line(&self) -> usize {
        match self {
            LogEvent::ServiceDiscovered { line, .. }
            | LogEvent::CharacteristicDiscovered { line, .. }
            | LogEvent::WriteIssued { line, .. }
            | LogEvent::ReadRequested { line, .. }
            | LogEvent::NotifyReceived { line, .. }
            | LogEvent::RawDataObserved { line, .. } => *line,
        }
    }

    /// Timestamp text copied from the input, if the line had one
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            LogEvent::ServiceDiscovered { timestamp, .. }
            | LogEvent::CharacteristicDiscovered { timestamp, .. }
            | LogEvent::WriteIssued { timestamp, .. }
            | LogEvent::ReadRequested { timestamp, .. }
            | LogEvent::NotifyReceived { timestamp, .. }
            | LogEvent::RawDataObserved { timestamp, .. } => timestamp.as_deref(),
        }
    }

    /// Payload carried by this event (if any)
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            LogEvent::WriteIssued { payload, .. } | LogEvent::RawDataObserved { payload, .. } => {
                Some(payload)
            }
            LogEvent::NotifyReceived { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// True for the events the sequence is reconstructed from
    pub fn is_write(&self) -> bool {
        matches!(self, LogEvent::WriteIssued { .. })
    }

    /// Short name of the event kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            LogEvent::ServiceDiscovered { .. } => "service",
            LogEvent::CharacteristicDiscovered { .. } => "characteristic",
            LogEvent::WriteIssued { .. } => "write",
            LogEvent::ReadRequested { .. } => "read",
            LogEvent::NotifyReceived { .. } => "notify",
            LogEvent::RawDataObserved { .. } => "raw",
        }
    }
}

/// How a label was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Exact 3-byte signature match
    Exact,
    /// Leading-byte category guess
    Heuristic,
    /// No knowledge, label only names the leading byte
    Generic,
    /// Empty payload
    Unknown,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Exact => write!(f, "exact"),
            Confidence::Heuristic => write!(f, "heuristic"),
            Confidence::Generic => write!(f, "generic"),
            Confidence::Unknown => write!(f, "unknown"),
        }
    }
}

/// One reconstructed command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEntry {
    /// 1-based position in the reconstructed sequence
    pub index: usize,
    /// Source line of the write
    pub line: usize,
    pub timestamp: Option<String>,
    pub handle: Option<Handle>,
    /// Resolved identifier or a `Handle_*` fallback
    pub identifier: String,
    pub payload: Vec<u8>,
    pub label: String,
    pub confidence: Confidence,
}

impl CommandEntry {
    pub fn payload_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }
}

/// Hex data seen outside of writes
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub line: usize,
    pub payload: Vec<u8>,
    pub label: String,
}

/// Handle → identifier associations learned from discovery events
pub type AddressMap = BTreeMap<Handle, String>;

/// Per-run line accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStats {
    /// Lines read from the input
    pub total_lines: usize,
    /// Lines that produced at least one event
    pub matched_lines: usize,
    /// Lines that produced nothing (includes decode errors and blank lines)
    pub skipped_lines: usize,
    /// Lines that were not valid UTF-8
    pub decode_errors: usize,
    /// Payloads whose trailing hex residue was dropped
    pub malformed_payloads: usize,
}

/// Everything one analysis run recovered from a log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// Discovered identifiers
    pub services: BTreeSet<String>,
    /// Final handle map
    pub characteristics: AddressMap,
    /// Full reconstructed write sequence
    pub commands: Vec<CommandEntry>,
    /// Payload hex → number of writes carrying it
    pub frequency: BTreeMap<String, usize>,
    /// Hex data observed outside writes
    pub raw_data: Vec<RawObservation>,
    pub reads: usize,
    pub notifies: usize,
    pub stats: LineStats,
}

impl AnalysisResult {
    /// Frequency table sorted by descending count, ties by payload hex
    pub fn most_frequent(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self
            .frequency
            .iter()
            .map(|(hex, count)| (hex.as_str(), *count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }
}

/// Convert an input timestamp to seconds, for gap computation
///
/// Accepts the unified-log form (`2024-05-01 10:22:33.123456+0900`), a naive
/// date-time, or a bare time of day. Returns `None` for anything else.
pub fn timestamp_seconds(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%z") {
        return Some(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        let utc = dt.and_utc();
        return Some(utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 / 1e9);
    }
    if let Ok(t) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
        return Some(t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 / 1e9);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_parsing() {
        assert_eq!(Handle::parse_hex("0x0012"), Some(Handle(0x12)));
        assert_eq!(Handle::parse_hex("12"), Some(Handle(0x12)));
        assert_eq!(Handle::parse_hex("0x"), None);
        assert_eq!(Handle::parse_hex("0x123456"), None);
        assert_eq!(Handle(0x12).to_string(), "0012");
        assert_eq!(Handle(0x2a).fallback_label(), "Handle_002A");
    }

    #[test]
    fn test_payload_hex() {
        let payload = Payload::new(vec![0x0d, 0x01, 0x00]);
        assert_eq!(payload.hex(), "0D0100");
        assert!(!payload.is_empty());
        assert!(Payload::default().is_empty());
    }

    #[test]
    fn test_event_accessors() {
        let event = LogEvent::WriteIssued {
            line: 7,
            timestamp: Some("10:00:00.5".to_string()),
            handle: None,
            identifier: None,
            payload: Payload::new(vec![1]),
        };
        assert_eq!(event.line(), 7);
        assert_eq!(event.timestamp(), Some("10:00:00.5"));
        assert!(event.is_write());
        assert_eq!(event.kind(), "write");
        assert_eq!(event.payload().map(|p| p.bytes.len()), Some(1));
    }

    #[test]
    fn test_timestamp_seconds() {
        assert_eq!(timestamp_seconds("00:00:01.500"), Some(1.5));
        let a = timestamp_seconds("2024-05-01 10:22:33.100000+0900").unwrap();
        let b = timestamp_seconds("2024-05-01 10:22:33.300000+0900").unwrap();
        assert!((b - a - 0.2).abs() < 1e-6);
        assert!(timestamp_seconds("yesterday").is_none());
    }

    #[test]
    fn test_most_frequent_ordering() {
        let mut result = AnalysisResult::default();
        result.frequency.insert("AA".to_string(), 1);
        result.frequency.insert("BB".to_string(), 3);
        result.frequency.insert("01".to_string(), 1);
        let sorted = result.most_frequent();
        assert_eq!(sorted, vec![("BB", 3), ("01", 1), ("AA", 1)]);
    }
}
