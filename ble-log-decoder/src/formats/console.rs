//! Free-text console recognizer
//!
//! Console and debug output has no fixed layout. Lines are classified by
//! keywords (`write`, `notify`, `read`, `characteristic`), identifier mentions,
//! handle references and embedded hex:
//!
//! ```text
//! 10:23:46.001 BLE: writeValue [0x01, 0x01, 0x00] for FFF3
//! 10:23:46.200 sending write 0x0D 0x01 0x00
//! 10:23:46.310 didUpdateValueFor FFF7 value: 01 00
//! ```
//!
//! A `write` keyword alone is not enough: the line must also carry a payload or
//! a handle reference.

use super::patterns::{
    find_handle, find_timestamp, mentions_notify, mentions_read, mentions_word, mentions_write,
    IdentifierPattern,
};
use super::payload::{find_bracketed, find_payload, mask_value_fields};
use super::{LineContext, LineRecognizer};
use crate::config::DecoderConfig;
use crate::types::LogEvent;

/// Recognizer for unstructured console text
#[derive(Debug, Clone)]
pub struct ConsoleRecognizer {
    identifiers: IdentifierPattern,
    record_raw_data: bool,
}

impl ConsoleRecognizer {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            identifiers: IdentifierPattern::new(&config.identifier_prefix),
            record_raw_data: config.record_raw_data,
        }
    }
}

impl Default for ConsoleRecognizer {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl LineRecognizer for ConsoleRecognizer {
    fn name(&self) -> &'static str {
        "console"
    }

    fn recognize(&self, text: &str, ctx: &LineContext) -> Vec<LogEvent> {
        let mut events = Vec::new();
        let timestamp = ctx.timestamp.clone().or_else(|| find_timestamp(text));
        let identifiers = self.identifiers.find_all(&mask_value_fields(text));
        let identifier = identifiers.first().cloned();
        let handle = find_handle(text);

        if let (Some(id), Some(handle)) = (&identifier, handle) {
            if mentions_word(text, "characteristic") {
                events.push(LogEvent::CharacteristicDiscovered {
                    line: ctx.line,
                    timestamp: timestamp.clone(),
                    identifier: id.clone(),
                    handle,
                });
            }
        }

        for id in &identifiers {
            events.push(LogEvent::ServiceDiscovered {
                line: ctx.line,
                timestamp: timestamp.clone(),
                identifier: id.clone(),
            });
        }

        let payload = find_payload(text);

        if mentions_write(text) {
            if payload.is_some() || handle.is_some() {
                events.push(LogEvent::WriteIssued {
                    line: ctx.line,
                    timestamp,
                    handle,
                    identifier,
                    payload: payload.unwrap_or_default(),
                });
            }
        } else if mentions_notify(text) {
            if handle.is_some() || identifier.is_some() || payload.is_some() {
                events.push(LogEvent::NotifyReceived {
                    line: ctx.line,
                    timestamp,
                    handle,
                    identifier,
                    payload,
                });
            }
        } else if mentions_read(text) {
            if handle.is_some() || identifier.is_some() {
                events.push(LogEvent::ReadRequested {
                    line: ctx.line,
                    timestamp,
                    handle,
                    identifier,
                });
            }
        } else if self.record_raw_data && identifier.is_some() {
            if let Some(payload) = find_bracketed(text) {
                events.push(LogEvent::RawDataObserved {
                    line: ctx.line,
                    timestamp,
                    payload,
                });
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Handle;

    fn recognize(line: &str) -> Vec<LogEvent> {
        ConsoleRecognizer::default().recognize(line, &LineContext::new(5))
    }

    #[test]
    fn test_write_with_prefixed_bytes() {
        let events = recognize("10:23:46.200 sending write 0x0D 0x01 0x00");
        match &events[..] {
            [LogEvent::WriteIssued {
                line,
                timestamp,
                handle,
                identifier,
                payload,
            }] => {
                assert_eq!(*line, 5);
                assert_eq!(timestamp.as_deref(), Some("10:23:46.200"));
                assert_eq!(*handle, None);
                assert_eq!(*identifier, None);
                assert_eq!(payload.bytes, vec![0x0d, 0x01, 0x00]);
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_write_mentioning_identifier() {
        let events = recognize("BLE: writeValue [0x01, 0x01, 0x00] for FFF3");
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], LogEvent::ServiceDiscovered { identifier, .. } if identifier == "FFF3"));
        assert!(matches!(
            &events[1],
            LogEvent::WriteIssued { identifier: Some(id), .. } if id == "FFF3"
        ));
    }

    #[test]
    fn test_write_with_bare_pairs() {
        for line in ["write 01 01 00", "Write: 0D 01 00"] {
            let events = recognize(line);
            assert!(
                matches!(&events[..], [LogEvent::WriteIssued { payload, .. }] if payload.bytes.len() == 3),
                "line: {}",
                line
            );
        }
    }

    #[test]
    fn test_letter_only_value_is_payload_not_identifier() {
        let events = recognize("Value: FFFF write handle 0x0012");
        match &events[..] {
            [LogEvent::WriteIssued {
                handle, identifier, payload, ..
            }] => {
                assert_eq!(*handle, Some(Handle(0x12)));
                assert_eq!(*identifier, None);
                assert_eq!(payload.bytes, vec![0xff, 0xff]);
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_write_keyword_alone_is_ignored() {
        assert!(recognize("write completed successfully").is_empty());
        assert!(recognize("rewrite cache").is_empty());
    }

    #[test]
    fn test_write_with_handle_only() {
        let events = recognize("write handle 0x0012 queued");
        assert!(matches!(
            &events[..],
            [LogEvent::WriteIssued { handle: Some(Handle(0x12)), payload, .. }] if payload.is_empty()
        ));
    }

    #[test]
    fn test_characteristic_binding() {
        let events = recognize("discovered characteristic FFF3 handle 0x0012");
        assert!(matches!(
            &events[0],
            LogEvent::CharacteristicDiscovered { handle: Handle(0x12), .. }
        ));
    }

    #[test]
    fn test_notify_and_read() {
        let events = recognize("didUpdateValueFor FFF7 value: 01 00");
        assert!(matches!(
            events.last(),
            Some(LogEvent::NotifyReceived { payload: Some(p), .. }) if p.bytes == vec![0x01, 0x00]
        ));

        let events = recognize("readValue for FFF5");
        assert!(matches!(events.last(), Some(LogEvent::ReadRequested { .. })));
    }

    #[test]
    fn test_raw_data() {
        let events = recognize("FFF4 status [01 02 03]");
        assert!(matches!(
            events.last(),
            Some(LogEvent::RawDataObserved { payload, .. }) if payload.bytes == vec![1, 2, 3]
        ));

        let config = DecoderConfig::new().with_raw_data(false);
        let events = ConsoleRecognizer::new(&config).recognize("FFF4 status [01 02 03]", &LineContext::new(1));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_chatter_is_ignored() {
        assert!(recognize("Scanning for peripherals...").is_empty());
        assert!(recognize("\u{fffd}\u{fffd}garbage").is_empty());
    }
}
