//! Known-command knowledge base
//!
//! Static tables mapping payload signatures to semantic labels. The built-in
//! tables come from earlier captures of the same device family; callers may add
//! entries when they build the base, but a base is never modified while a run
//! classifies with it.

use crate::types::{DecoderError, Result};
use std::collections::BTreeMap;

/// Number of leading bytes compared for an exact match
pub const SIGNATURE_LEN: usize = 3;

/// A fixed-length payload prefix
pub type Signature = [u8; SIGNATURE_LEN];

const BUILTIN_SIGNATURES: &[(Signature, &str)] = &[
    ([0x01, 0x01, 0x00], "Power/Init Command"),
    ([0x02, 0x00, 0x01], "WiFi Enable"),
    ([0x04, 0x01, 0x00], "AP Mode Enable"),
    ([0x0A, 0x00, 0x01], "Remote Control"),
    ([0x0B, 0x00, 0x01], "Broadcast ON"),
    ([0x0C, 0x00, 0x01], "Server Start"),
    ([0x0E, 0x00, 0x01], "Accept Connection"),
    ([0x0F, 0x01, 0x00], "Phocus Mode"),
];

const BUILTIN_CATEGORIES: &[(u8, &str)] = &[
    (0x01, "Power/Init Command"),
    (0x02, "Enable Command"),
    (0x04, "Mode Command"),
    (0x05, "Identifier/Name Command"),
    (0x0D, "SSID Command"),
];

/// Signature and category tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    /// Exact 3-byte prefixes
    signatures: BTreeMap<Signature, String>,
    /// Broad categories keyed by leading byte
    categories: BTreeMap<u8, String>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in tables
    pub fn builtin() -> Self {
        let mut kb = Self::new();
        for (signature, label) in BUILTIN_SIGNATURES {
            kb.add_signature(*signature, *label);
        }
        for (byte, label) in BUILTIN_CATEGORIES {
            kb.add_category(*byte, *label);
        }
        kb
    }

    /// Add or replace an exact signature
    pub fn add_signature(&mut self, signature: Signature, label: impl Into<String>) {
        self.signatures.insert(signature, label.into());
    }

    /// Add or replace a leading-byte category
    pub fn add_category(&mut self, leading_byte: u8, label: impl Into<String>) {
        self.categories.insert(leading_byte, label.into());
    }

    /// Add a signature written as hex (`"0A0001"`, `"0a 00 01"`, `"0x0A,0x00,0x01"`)
    pub fn add_signature_hex(&mut self, hex_text: &str, label: impl Into<String>) -> Result<()> {
        let bytes = parse_exact_hex(hex_text)?;
        let signature: Signature = bytes.as_slice().try_into().map_err(|_| {
            DecoderError::InvalidKnowledge(format!(
                "signature {:?} must be exactly {} bytes, got {}",
                hex_text,
                SIGNATURE_LEN,
                bytes.len()
            ))
        })?;
        self.add_signature(signature, label);
        Ok(())
    }

    /// Add a category whose leading byte is written as hex (`"0D"`, `"0x0d"`)
    pub fn add_category_hex(&mut self, hex_text: &str, label: impl Into<String>) -> Result<()> {
        match parse_exact_hex(hex_text)?.as_slice() {
            [byte] => {
                self.add_category(*byte, label);
                Ok(())
            }
            other => Err(DecoderError::InvalidKnowledge(format!(
                "category byte {:?} must be exactly 1 byte, got {}",
                hex_text,
                other.len()
            ))),
        }
    }

    /// Exact signature lookup on the payload's first bytes
    pub fn lookup_signature(&self, payload: &[u8]) -> Option<&str> {
        let prefix: &Signature = payload.get(..SIGNATURE_LEN)?.try_into().ok()?;
        self.signatures.get(prefix).map(String::as_str)
    }

    /// Category lookup on the leading byte
    pub fn lookup_category(&self, leading_byte: u8) -> Option<&str> {
        self.categories.get(&leading_byte).map(String::as_str)
    }

    /// Get knowledge base statistics
    pub fn stats(&self) -> KnowledgeStats {
        KnowledgeStats {
            num_signatures: self.signatures.len(),
            num_categories: self.categories.len(),
        }
    }
}

/// Strict hex parsing for configuration input: every digit must be used
fn parse_exact_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();
    hex::decode(&digits)
        .map_err(|e| DecoderError::InvalidKnowledge(format!("invalid hex {:?}: {}", text, e)))
}

/// Knowledge base statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeStats {
    /// Number of exact signatures
    pub num_signatures: usize,
    /// Number of leading-byte categories
    pub num_categories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_knowledge_base() {
        let kb = KnowledgeBase::new();
        let stats = kb.stats();
        assert_eq!(stats.num_signatures, 0);
        assert_eq!(stats.num_categories, 0);
        assert!(kb.lookup_signature(&[1, 1, 0]).is_none());
    }

    #[test]
    fn test_builtin_tables() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.stats().num_signatures, 8);
        assert_eq!(kb.lookup_signature(&[0x01, 0x01, 0x00, 0xff]), Some("Power/Init Command"));
        assert_eq!(kb.lookup_signature(&[0x0d, 0x01, 0x00]), None);
        assert_eq!(kb.lookup_signature(&[0x01, 0x01]), None);
        assert_eq!(kb.lookup_category(0x0d), Some("SSID Command"));
        assert_eq!(kb.lookup_category(0x7f), None);
    }

    #[test]
    fn test_add_from_hex() {
        let mut kb = KnowledgeBase::new();
        kb.add_signature_hex("0x0D, 0x01, 0x00", "SSID Broadcast").unwrap();
        kb.add_category_hex("7f", "Vendor Command").unwrap();
        assert_eq!(kb.lookup_signature(&[0x0d, 0x01, 0x00]), Some("SSID Broadcast"));
        assert_eq!(kb.lookup_category(0x7f), Some("Vendor Command"));

        assert!(kb.add_signature_hex("0D01", "too short").is_err());
        assert!(kb.add_signature_hex("0D010", "odd").is_err());
        assert!(kb.add_category_hex("0D01", "too long").is_err());
    }

    #[test]
    fn test_replacing_entries() {
        let mut kb = KnowledgeBase::builtin();
        kb.add_signature([0x01, 0x01, 0x00], "WiFi Power ON");
        assert_eq!(kb.lookup_signature(&[0x01, 0x01, 0x00]), Some("WiFi Power ON"));
        assert_eq!(kb.stats().num_signatures, 8);
    }
}
