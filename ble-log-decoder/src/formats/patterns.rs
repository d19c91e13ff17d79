//! Patterns shared by the text recognizers

use crate::types::Handle;
use once_cell::sync::Lazy;
use regex::Regex;

/// `Handle: 0x0012`, `handle 0x12`, `handle=0x0012`
pub(crate) static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhandle\s*[:=]?\s*0x([0-9a-f]{1,4})\b").unwrap());

/// Time of day with fractional seconds
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2}:\d{2}:\d{2}\.\d+)\b").unwrap());

/// `write`, `writing`, `written`, also inside `writeValue` or `didWrite`
pub(crate) static WRITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)writ(?:e|ing|ten)").unwrap());

static READ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bread(?:value|request|response|ing)?\b").unwrap());

static NOTIFY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)notif(?:y|ication)|\bindication\b|didupdatevalue").unwrap()
});

/// First handle reference on the line
pub fn find_handle(line: &str) -> Option<Handle> {
    HANDLE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Handle::parse_hex(m.as_str()))
}

/// First time-of-day timestamp on the line
pub fn find_timestamp(line: &str) -> Option<String> {
    TIMESTAMP_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Case-insensitive write keyword anywhere on the line
pub fn mentions_write(line: &str) -> bool {
    WRITE_RE.is_match(line)
}

pub fn mentions_read(line: &str) -> bool {
    READ_RE.is_match(line)
}

pub fn mentions_notify(line: &str) -> bool {
    NOTIFY_RE.is_match(line)
}

pub fn mentions_word(line: &str, word: &str) -> bool {
    line.to_ascii_lowercase().contains(word)
}

static DEFAULT_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:0000)?(FFF[0-9a-f])\b").unwrap());

/// Matcher for one identifier family (e.g. `FFF0`..`FFFF`)
///
/// An identifier is the family prefix padded with hex digits to four
/// characters. Short identifiers embedded in the Bluetooth base UUID
/// (`0000FFF3-0000-1000-8000-00805F9B34FB`) are recognized too.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim();
        let padding = 4usize.saturating_sub(prefix.len());
        let pattern = format!(
            r"(?i)\b(?:0000)?({}[0-9a-f]{{{}}})\b",
            regex::escape(prefix),
            padding
        );
        let regex = Regex::new(&pattern).unwrap_or_else(|e| {
            log::warn!("identifier prefix {:?} rejected ({}), using FFF", prefix, e);
            DEFAULT_IDENTIFIER_RE.clone()
        });
        Self { regex }
    }

    /// All distinct identifiers on the line, upper-cased, in order of appearance
    pub fn find_all(&self, line: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for caps in self.regex.captures_iter(line) {
            if let Some(m) = caps.get(1) {
                let id = m.as_str().to_ascii_uppercase();
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        found
    }

    pub fn find_first(&self, line: &str) -> Option<String> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
    }
}

impl Default for IdentifierPattern {
    fn default() -> Self {
        Self::new("FFF")
    }
}
