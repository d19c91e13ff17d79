//! BLE Log Decoder Library
//!
//! A reusable library for reconstructing a device's write-command protocol from
//! captured BLE communication logs (PacketLogger exports, unified-log `ndjson`
//! streams, application console output).
//!
//! # Architecture
//!
//! Every analysis run is a single forward pass:
//! - Recognizers (one per log dialect) turn lines into [`LogEvent`]s
//! - Discovery events build a handle → identifier map
//! - Writes are classified against a [`KnowledgeBase`] of known payloads
//! - The ordered command sequence and payload frequencies form an [`AnalysisResult`]
//! - The [`report`] module renders results as text, JSON and replay skeletons
//!
//! The library does NOT:
//! - Capture traffic or talk to devices
//! - Validate reconstructed sequences
//! - Guarantee that labels are correct (they are heuristic)
//!
//! File naming, configuration files and multi-log orchestration live in the
//! application layer (ble-log-cli).
//!
//! # Example Usage
//!
//! ```
//! use ble_log_decoder::{report, Analyzer};
//! use std::io::Cursor;
//!
//! let log = "Characteristic UUID: FFF3 Handle: 0x0012\n\
//!            ATT Write Request Handle: 0x0012 Value: 02 00 01\n";
//!
//! let analyzer = Analyzer::new();
//! let result = analyzer.analyze_reader(Cursor::new(log)).unwrap();
//!
//! assert_eq!(result.commands[0].identifier, "FFF3");
//! assert_eq!(result.commands[0].label, "WiFi Enable");
//!
//! let json = report::json::render(&result).unwrap();
//! assert!(json.contains("\"payloadHex\": \"020001\""));
//! ```

// Public modules
pub mod analyzer;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod formats;
pub mod knowledge;
pub mod report;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use analyzer::Analyzer;
pub use assembler::SequenceAssembler;
pub use classifier::{Classification, CommandClassifier};
pub use config::{DecoderConfig, Dialect};
pub use extractor::EventExtractor;
pub use formats::{FormatMatcher, LineContext, LineRecognizer};
pub use knowledge::{KnowledgeBase, KnowledgeStats};
pub use report::{Artifact, ReplayFormat, ReplayScript, ReportOptions, DEFAULT_REPLAY_DELAY_MS};
pub use resolver::AddressResolver;
pub use types::{
    AddressMap, AnalysisResult, CommandEntry, Confidence, DecoderError, Handle, LineStats,
    LogEvent, Payload, RawObservation, Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
