//! Command sequence assembly
//!
//! Consumes events in source order and builds the reconstructed write sequence,
//! the payload frequency table and the other parts of [`AnalysisResult`].
//! Handle bindings are applied as they appear in the log, so each write is
//! resolved with the knowledge available at its own line; the result carries
//! the map as it stands at the end.

use crate::classifier::CommandClassifier;
use crate::resolver::AddressResolver;
use crate::types::{
    AnalysisResult, CommandEntry, LineStats, LogEvent, RawObservation,
};
use std::collections::{BTreeMap, BTreeSet};

/// Incremental builder for one run's result
pub struct SequenceAssembler<'a> {
    classifier: &'a CommandClassifier,
    resolver: AddressResolver,
    services: BTreeSet<String>,
    commands: Vec<CommandEntry>,
    frequency: BTreeMap<String, usize>,
    raw_data: Vec<RawObservation>,
    reads: usize,
    notifies: usize,
}

impl<'a> SequenceAssembler<'a> {
    pub fn new(classifier: &'a CommandClassifier) -> Self {
        Self {
            classifier,
            resolver: AddressResolver::new(),
            services: BTreeSet::new(),
            commands: Vec::new(),
            frequency: BTreeMap::new(),
            raw_data: Vec::new(),
            reads: 0,
            notifies: 0,
        }
    }

    /// Batch form: assemble a complete event sequence
    pub fn assemble(
        events: &[LogEvent],
        classifier: &'a CommandClassifier,
        stats: LineStats,
    ) -> AnalysisResult {
        let mut assembler = Self::new(classifier);
        for event in events {
            assembler.push(event);
        }
        assembler.finish(stats)
    }

    /// Resolver state so far
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Number of commands assembled so far
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consume the next event in source order
    pub fn push(&mut self, event: &LogEvent) {
        self.resolver.observe(event);

        match event {
            LogEvent::ServiceDiscovered { identifier, .. } => {
                self.services.insert(identifier.clone());
            }
            LogEvent::CharacteristicDiscovered { .. } => {}
            LogEvent::WriteIssued {
                line,
                timestamp,
                handle,
                identifier,
                payload,
            } => {
                let classification = self.classifier.classify_detailed(&payload.bytes);
                let entry = CommandEntry {
                    index: self.commands.len() + 1,
                    line: *line,
                    timestamp: timestamp.clone(),
                    handle: *handle,
                    identifier: self.resolver.resolve_entry(*handle, identifier.as_deref()),
                    payload: payload.bytes.clone(),
                    label: classification.label,
                    confidence: classification.confidence,
                };
                if !payload.is_empty() {
                    *self.frequency.entry(payload.hex()).or_insert(0) += 1;
                }
                log::debug!(
                    "command #{} line {}: {} {} ({})",
                    entry.index,
                    entry.line,
                    entry.identifier,
                    entry.payload_hex(),
                    entry.label
                );
                self.commands.push(entry);
            }
            LogEvent::ReadRequested { .. } => self.reads += 1,
            LogEvent::NotifyReceived { .. } => self.notifies += 1,
            LogEvent::RawDataObserved { line, payload, .. } => {
                self.raw_data.push(RawObservation {
                    line: *line,
                    payload: payload.bytes.clone(),
                    label: self.classifier.classify(&payload.bytes),
                });
            }
        }
    }

    /// Produce the final result
    pub fn finish(self, stats: LineStats) -> AnalysisResult {
        AnalysisResult {
            services: self.services,
            characteristics: self.resolver.into_map(),
            commands: self.commands,
            frequency: self.frequency,
            raw_data: self.raw_data,
            reads: self.reads,
            notifies: self.notifies,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, Handle, Payload};

    fn write(line: usize, handle: Option<u16>, bytes: &[u8]) -> LogEvent {
        LogEvent::WriteIssued {
            line,
            timestamp: None,
            handle: handle.map(Handle),
            identifier: None,
            payload: Payload::new(bytes.to_vec()),
        }
    }

    fn bind(line: usize, identifier: &str, handle: u16) -> LogEvent {
        LogEvent::CharacteristicDiscovered {
            line,
            timestamp: None,
            identifier: identifier.to_string(),
            handle: Handle(handle),
        }
    }

    #[test]
    fn test_duplicate_payloads() {
        let classifier = CommandClassifier::default();
        let events = vec![write(3, None, &[2, 0, 1]), write(9, None, &[2, 0, 1])];
        let result = SequenceAssembler::assemble(&events, &classifier, LineStats::default());

        assert_eq!(result.commands.len(), 2);
        assert_eq!(result.commands[0].index, 1);
        assert_eq!(result.commands[1].index, 2);
        assert_eq!(result.commands[0].line, 3);
        assert_eq!(result.commands[1].line, 9);
        assert_eq!(result.frequency.len(), 1);
        assert_eq!(result.frequency.get("020001"), Some(&2));
    }

    #[test]
    fn test_resolution_uses_bindings_seen_so_far() {
        let classifier = CommandClassifier::default();
        let events = vec![
            write(1, Some(0x12), &[1, 1, 0]),
            bind(2, "FFF3", 0x12),
            write(3, Some(0x12), &[1, 1, 0]),
        ];
        let result = SequenceAssembler::assemble(&events, &classifier, LineStats::default());

        assert_eq!(result.commands[0].identifier, "Handle_0012");
        assert_eq!(result.commands[1].identifier, "FFF3");
        assert_eq!(result.commands[1].label, "Power/Init Command");
        assert_eq!(result.commands[1].confidence, Confidence::Exact);
        assert_eq!(result.characteristics.get(&Handle(0x12)).map(String::as_str), Some("FFF3"));
    }

    #[test]
    fn test_empty_payload_write_not_counted() {
        let classifier = CommandClassifier::default();
        let events = vec![write(1, Some(0x12), &[]), write(2, None, &[0x0d])];
        let result = SequenceAssembler::assemble(&events, &classifier, LineStats::default());

        assert_eq!(result.commands.len(), 2);
        assert_eq!(result.commands[0].label, "Unknown");
        let total: usize = result.frequency.values().sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_other_events() {
        let classifier = CommandClassifier::default();
        let events = vec![
            LogEvent::ServiceDiscovered {
                line: 1,
                timestamp: None,
                identifier: "FFF0".to_string(),
            },
            LogEvent::ReadRequested {
                line: 2,
                timestamp: None,
                handle: None,
                identifier: Some("FFF5".to_string()),
            },
            LogEvent::NotifyReceived {
                line: 3,
                timestamp: None,
                handle: None,
                identifier: None,
                payload: None,
            },
            LogEvent::RawDataObserved {
                line: 4,
                timestamp: None,
                payload: Payload::new(vec![0x04, 0x01, 0x00]),
            },
        ];
        let mut assembler = SequenceAssembler::new(&classifier);
        for event in &events {
            assembler.push(event);
        }
        assert!(assembler.is_empty());
        assert!(assembler.resolver().is_empty());

        let result = assembler.finish(LineStats::default());
        assert!(result.services.contains("FFF0"));
        assert_eq!(result.reads, 1);
        assert_eq!(result.notifies, 1);
        assert_eq!(result.raw_data.len(), 1);
        assert_eq!(result.raw_data[0].label, "AP Mode Enable");
        assert!(result.frequency.is_empty());
    }
}
