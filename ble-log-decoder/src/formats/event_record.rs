//! Structured event-record recognizer
//!
//! Unified-log streams exported with `--style ndjson` put one JSON object per
//! line. The interesting text is in `eventMessage`; the record's `timestamp`
//! is carried onto every event found in it. The message itself is scanned with
//! the text recognizers, so an ATT line wrapped in a record is read exactly
//! like a bare one.

use super::{ConsoleRecognizer, LineContext, LineRecognizer, PacketLoggerRecognizer};
use crate::config::DecoderConfig;
use crate::types::LogEvent;
use serde_json::Value;

/// Message fields, in lookup order
const MESSAGE_FIELDS: [&str; 3] = ["eventMessage", "message", "msg"];

/// Recognizer for line-delimited JSON records
pub struct EventRecordRecognizer {
    inner: Vec<Box<dyn LineRecognizer>>,
}

impl EventRecordRecognizer {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            inner: vec![
                Box::new(PacketLoggerRecognizer::new()),
                Box::new(ConsoleRecognizer::new(config)),
            ],
        }
    }

    /// Split a record into (message, timestamp)
    fn parse_record(text: &str) -> Option<(String, Option<String>)> {
        let trimmed = text.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        let record: Value = serde_json::from_str(trimmed).ok()?;
        let object = record.as_object()?;

        let message = MESSAGE_FIELDS
            .iter()
            .find_map(|field| object.get(*field).and_then(Value::as_str))?
            .to_string();
        let timestamp = object
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some((message, timestamp))
    }
}

impl Default for EventRecordRecognizer {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl LineRecognizer for EventRecordRecognizer {
    fn name(&self) -> &'static str {
        "event_record"
    }

    fn recognize(&self, text: &str, ctx: &LineContext) -> Vec<LogEvent> {
        let Some((message, timestamp)) = Self::parse_record(text) else {
            return Vec::new();
        };

        let inner_ctx = LineContext {
            line: ctx.line,
            timestamp,
        };

        for recognizer in &self.inner {
            let events = recognizer.recognize(&message, &inner_ctx);
            if !events.is_empty() {
                return events;
            }
        }
        Vec::new()
    }

    fn claims(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.starts_with('{')
            && serde_json::from_str::<Value>(trimmed).map_or(false, |record| record.is_object())
    }
}
