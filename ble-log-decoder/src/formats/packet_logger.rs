//! PacketLogger (ATT-level) text recognizer
//!
//! Handles exported capture text such as:
//!
//! ```text
//! Mar 12 10:23:45.120  ATT Receive  Primary Service UUID: FFF0
//! Mar 12 10:23:45.180  ATT Receive  Characteristic UUID: FFF3 Handle: 0x0012
//! Mar 12 10:23:46.001  ATT Send     ATT Write Request Handle: 0x0012 Value: 01 01 00
//! Mar 12 10:23:46.090  ATT Receive  Handle Value Notification Handle: 0x0015 Value: 01
//! ```
//!
//! Discovery events are emitted before the access event of the same line so
//! that a write can resolve a handle bound on its own line.

use super::patterns::{find_handle, find_timestamp, mentions_notify, mentions_read, mentions_write};
use super::payload::{find_value_field, find_write_operand};
use super::{LineContext, LineRecognizer};
use crate::types::{Handle, LogEvent};
use once_cell::sync::Lazy;
use regex::Regex;

static ATT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bATT\b").unwrap());

static SERVICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bservice\s+uuid\s*[:=]\s*(?:0x)?([0-9a-f]{4})\b").unwrap()
});

static CHARACTERISTIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcharacteristic\b").unwrap());

static UUID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\buuid\s*[:=]\s*(?:0x)?([0-9a-f]{4})\b").unwrap());

/// Declarations name the attribute that carries the value separately
static VALUE_HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bvalue\s+handle\s*[:=]?\s*0x([0-9a-f]{1,4})\b").unwrap()
});

static WRITE_RESPONSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwrite\s+response\b").unwrap());

/// Recognizer for ATT-level capture text
#[derive(Debug, Clone, Default)]
pub struct PacketLoggerRecognizer;

impl PacketLoggerRecognizer {
    pub fn new() -> Self {
        Self
    }

    fn characteristic(text: &str) -> Option<(String, Handle)> {
        if !CHARACTERISTIC_RE.is_match(text) {
            return None;
        }
        let identifier = UUID_RE.captures(text)?.get(1)?.as_str().to_ascii_uppercase();
        let handle = VALUE_HANDLE_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Handle::parse_hex(m.as_str()))
            .or_else(|| find_handle(text))?;
        Some((identifier, handle))
    }
}

impl LineRecognizer for PacketLoggerRecognizer {
    fn name(&self) -> &'static str {
        "packet_logger"
    }

    fn recognize(&self, text: &str, ctx: &LineContext) -> Vec<LogEvent> {
        let mut events = Vec::new();
        let timestamp = ctx.timestamp.clone().or_else(|| find_timestamp(text));

        if let Some(caps) = SERVICE_RE.captures(text) {
            if let Some(m) = caps.get(1) {
                events.push(LogEvent::ServiceDiscovered {
                    line: ctx.line,
                    timestamp: timestamp.clone(),
                    identifier: m.as_str().to_ascii_uppercase(),
                });
            }
        }

        if let Some((identifier, handle)) = Self::characteristic(text) {
            events.push(LogEvent::CharacteristicDiscovered {
                line: ctx.line,
                timestamp: timestamp.clone(),
                identifier,
                handle,
            });
        }

        if !ATT_RE.is_match(text) {
            return events;
        }

        let handle = find_handle(text);

        if mentions_write(text) && !WRITE_RESPONSE_RE.is_match(text) {
            let payload = find_value_field(text).or_else(|| find_write_operand(text));
            if payload.is_some() || handle.is_some() {
                events.push(LogEvent::WriteIssued {
                    line: ctx.line,
                    timestamp,
                    handle,
                    identifier: None,
                    payload: payload.unwrap_or_default(),
                });
            }
        } else if mentions_notify(text) {
            if handle.is_some() {
                events.push(LogEvent::NotifyReceived {
                    line: ctx.line,
                    timestamp,
                    handle,
                    identifier: None,
                    payload: find_value_field(text),
                });
            }
        } else if mentions_read(text) && handle.is_some() {
            events.push(LogEvent::ReadRequested {
                line: ctx.line,
                timestamp,
                handle,
                identifier: None,
            });
        }

        events
    }
}
