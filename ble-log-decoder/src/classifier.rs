//! Command classification
//!
//! Maps a payload to a semantic label. Exact signature matches take precedence
//! over the leading-byte categories, and every payload gets some label.

use crate::knowledge::KnowledgeBase;
use crate::types::Confidence;

/// Label for empty payloads
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A label and how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub confidence: Confidence,
}

/// Command classifier over a fixed knowledge base
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    knowledge: KnowledgeBase,
}

impl CommandClassifier {
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Label for a payload
    pub fn classify(&self, payload: &[u8]) -> String {
        self.classify_detailed(payload).label
    }

    /// Label plus confidence
    ///
    /// 1. empty payload → `Unknown`
    /// 2. exact 3-byte signature → signature label
    /// 3. leading byte category → category label
    /// 4. otherwise `Command 0xNN`
    pub fn classify_detailed(&self, payload: &[u8]) -> Classification {
        let Some(&leading) = payload.first() else {
            return Classification {
                label: UNKNOWN_LABEL.to_string(),
                confidence: Confidence::Unknown,
            };
        };

        if let Some(label) = self.knowledge.lookup_signature(payload) {
            return Classification {
                label: label.to_string(),
                confidence: Confidence::Exact,
            };
        }

        if let Some(label) = self.knowledge.lookup_category(leading) {
            return Classification {
                label: label.to_string(),
                confidence: Confidence::Heuristic,
            };
        }

        Classification {
            label: format!("Command 0x{:02X}", leading),
            confidence: Confidence::Generic,
        }
    }
}

impl Default for CommandClassifier {
    fn default() -> Self {
        Self::new(KnowledgeBase::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        let classifier = CommandClassifier::default();
        let result = classifier.classify_detailed(&[]);
        assert_eq!(result.label, "Unknown");
        assert_eq!(result.confidence, Confidence::Unknown);
    }

    #[test]
    fn test_exact_match_ignores_trailing_bytes() {
        let classifier = CommandClassifier::default();
        assert_eq!(classifier.classify(&[0x02, 0x00, 0x01]), "WiFi Enable");
        assert_eq!(classifier.classify(&[0x02, 0x00, 0x01, 0x99, 0x98]), "WiFi Enable");
        assert_eq!(
            classifier.classify_detailed(&[0x0a, 0x00, 0x01]).confidence,
            Confidence::Exact
        );
    }

    #[test]
    fn test_exact_match_beats_category() {
        let classifier = CommandClassifier::default();
        // 0x04 is also the "Mode Command" category
        assert_eq!(classifier.classify(&[0x04, 0x01, 0x00]), "AP Mode Enable");
        assert_eq!(classifier.classify(&[0x04, 0x02]), "Mode Command");
    }

    #[test]
    fn test_category_fallback() {
        let classifier = CommandClassifier::default();
        let result = classifier.classify_detailed(&[0x0d, 0x01, 0x00]);
        assert_eq!(result.label, "SSID Command");
        assert_eq!(result.confidence, Confidence::Heuristic);
        assert_eq!(classifier.classify(&[0x01]), "Power/Init Command");
    }

    #[test]
    fn test_generic_label() {
        let classifier = CommandClassifier::default();
        let result = classifier.classify_detailed(&[0xab, 0x00, 0x00]);
        assert_eq!(result.label, "Command 0xAB");
        assert_eq!(result.confidence, Confidence::Generic);
    }

    #[test]
    fn test_total_over_all_leading_bytes() {
        let classifier = CommandClassifier::new(KnowledgeBase::new());
        for byte in 0..=u8::MAX {
            let label = classifier.classify(&[byte, 0, 0]);
            assert_eq!(label, format!("Command 0x{:02X}", byte));
        }
    }

    #[test]
    fn test_deterministic() {
        let classifier = CommandClassifier::default();
        let payload = [0x0f, 0x01, 0x00, 0x05];
        assert_eq!(classifier.classify(&payload), classifier.classify(&payload));
    }
}
