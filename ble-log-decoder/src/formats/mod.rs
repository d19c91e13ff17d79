//! Log dialect recognizers
//!
//! This module contains one recognizer per supported log dialect.
//! Each recognizer classifies a single line on its own; state that spans lines
//! (the handle map) lives in the caller.

use crate::config::{DecoderConfig, Dialect};
use crate::types::LogEvent;

pub mod console;
pub mod event_record;
pub mod packet_logger;
pub mod patterns;
pub mod payload;

// Re-export recognizer types
pub use console::ConsoleRecognizer;
pub use event_record::EventRecordRecognizer;
pub use packet_logger::PacketLoggerRecognizer;

/// Where a line came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineContext {
    /// 1-based line number in the source log
    pub line: usize,
    /// Timestamp already known from an enclosing record
    pub timestamp: Option<String>,
}

impl LineContext {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            timestamp: None,
        }
    }
}

/// Common trait for all line recognizers
///
/// A recognizer returns the events found on one line, in emission order, or an
/// empty vector if the line does not belong to its dialect. New dialects are
/// added by implementing this trait.
pub trait LineRecognizer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Classify one line
    fn recognize(&self, text: &str, ctx: &LineContext) -> Vec<LogEvent>;

    /// Whether the line belongs to this dialect even when nothing was found in it
    ///
    /// A claimed line is not offered to lower-priority recognizers.
    fn claims(&self, _text: &str) -> bool {
        false
    }
}

/// Tries recognizers in priority order; the first non-empty result wins
pub struct FormatMatcher {
    recognizers: Vec<Box<dyn LineRecognizer>>,
}

impl FormatMatcher {
    /// Build the matcher for the dialects enabled in `config`
    pub fn new(config: &DecoderConfig) -> Self {
        let mut recognizers: Vec<Box<dyn LineRecognizer>> = Vec::new();
        for dialect in Dialect::ALL {
            if !config.is_enabled(dialect) {
                continue;
            }
            match dialect {
                Dialect::EventRecord => {
                    recognizers.push(Box::new(EventRecordRecognizer::new(config)));
                }
                Dialect::PacketLogger => {
                    recognizers.push(Box::new(PacketLoggerRecognizer::new()));
                }
                Dialect::Console => {
                    recognizers.push(Box::new(ConsoleRecognizer::new(config)));
                }
            }
        }
        Self { recognizers }
    }

    /// Build a matcher from an explicit recognizer list
    pub fn with_recognizers(recognizers: Vec<Box<dyn LineRecognizer>>) -> Self {
        Self { recognizers }
    }

    /// Append a recognizer with the lowest priority
    pub fn push(&mut self, recognizer: Box<dyn LineRecognizer>) {
        self.recognizers.push(recognizer);
    }

    /// Names of the active recognizers, in priority order
    pub fn recognizer_names(&self) -> Vec<&'static str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Classify one line
    pub fn match_line(&self, text: &str, line: usize) -> Vec<LogEvent> {
        let ctx = LineContext::new(line);
        for recognizer in &self.recognizers {
            let events = recognizer.recognize(text, &ctx);
            if !events.is_empty() {
                log::trace!(
                    "line {}: {} produced {} event(s)",
                    line,
                    recognizer.name(),
                    events.len()
                );
                return events;
            }
            if recognizer.claims(text) {
                log::trace!("line {}: claimed by {}", line, recognizer.name());
                return Vec::new();
            }
        }
        Vec::new()
    }
}

impl Default for FormatMatcher {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;

    struct Fixed;

    impl LineRecognizer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, text: &str, ctx: &LineContext) -> Vec<LogEvent> {
            if text.starts_with("RAW ") {
                vec![LogEvent::RawDataObserved {
                    line: ctx.line,
                    timestamp: None,
                    payload: Payload::new(vec![0xee]),
                }]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_priority_order() {
        let matcher = FormatMatcher::default();
        assert_eq!(
            matcher.recognizer_names(),
            vec!["event_record", "packet_logger", "console"]
        );
    }

    #[test]
    fn test_disabled_dialects_are_skipped() {
        let config = DecoderConfig::new().with_dialects(vec![Dialect::EventRecord]);
        let matcher = FormatMatcher::new(&config);
        assert!(matcher.match_line("write 0x01 0x02", 1).is_empty());
    }

    #[test]
    fn test_custom_recognizer() {
        let mut matcher = FormatMatcher::with_recognizers(Vec::new());
        matcher.push(Box::new(Fixed));
        let events = matcher.match_line("RAW anything", 3);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line(), 3);
        assert!(matcher.match_line("other", 4).is_empty());
    }

    #[test]
    fn test_first_non_empty_wins() {
        let matcher = FormatMatcher::default();
        // Claimed by the packet logger recognizer, never reaches the console one
        let events = matcher.match_line("ATT Write Request Handle: 0x0012 Value: 01 01 00", 1);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_write());
    }

    #[test]
    fn test_claimed_record_is_not_rescanned_as_text() {
        let matcher = FormatMatcher::default();
        let line = r#"{"eventMessage":"write queued","formatString":"write handle 0x0012 Value: 01 01 00"}"#;
        assert!(matcher.match_line(line, 1).is_empty());
        // Broken JSON is still plain text
        assert_eq!(matcher.match_line("{ write 0x0D 0x01 0x00", 2).len(), 1);
    }
}
