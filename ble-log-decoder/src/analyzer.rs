//! Main analyzer API
//!
//! This module provides the primary interface for the decoder library.
//! The Analyzer struct holds the recognizers and the classifier; each call to
//! one of the `analyze_*` methods is an independent run with its own handle
//! map and result.

use crate::assembler::SequenceAssembler;
use crate::classifier::CommandClassifier;
use crate::config::DecoderConfig;
use crate::extractor::EventExtractor;
use crate::formats::FormatMatcher;
use crate::knowledge::{KnowledgeBase, KnowledgeStats};
use crate::types::{AnalysisResult, DecoderError, LineStats, LogEvent, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The main analyzer struct - entry point for all analysis operations
pub struct Analyzer {
    matcher: FormatMatcher,
    classifier: CommandClassifier,
}

impl Analyzer {
    /// Create an analyzer with the default configuration and built-in knowledge
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default(), KnowledgeBase::builtin())
    }

    /// Create an analyzer with explicit configuration and knowledge base
    ///
    /// # Example
    /// ```
    /// use ble_log_decoder::{Analyzer, DecoderConfig, Dialect, KnowledgeBase};
    ///
    /// let mut knowledge = KnowledgeBase::builtin();
    /// knowledge.add_signature_hex("0D0100", "SSID Broadcast").unwrap();
    ///
    /// let config = DecoderConfig::new().with_dialects(vec![Dialect::PacketLogger]);
    /// let analyzer = Analyzer::with_config(&config, knowledge);
    /// assert_eq!(analyzer.knowledge_stats().num_signatures, 9);
    /// ```
    pub fn with_config(config: &DecoderConfig, knowledge: KnowledgeBase) -> Self {
        Self {
            matcher: FormatMatcher::new(config),
            classifier: CommandClassifier::new(knowledge),
        }
    }

    /// Create an analyzer from a prepared matcher (e.g. with custom recognizers)
    pub fn with_matcher(matcher: FormatMatcher, knowledge: KnowledgeBase) -> Self {
        Self {
            matcher,
            classifier: CommandClassifier::new(knowledge),
        }
    }

    pub fn classifier(&self) -> &CommandClassifier {
        &self.classifier
    }

    pub fn matcher(&self) -> &FormatMatcher {
        &self.matcher
    }

    /// Get statistics about the loaded knowledge base
    pub fn knowledge_stats(&self) -> KnowledgeStats {
        self.classifier.knowledge().stats()
    }

    /// Open a log file for analysis
    pub fn open(path: &Path) -> Result<BufReader<File>> {
        let file = File::open(path).map_err(|source| DecoderError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BufReader::new(file))
    }

    /// Analyze a log file
    ///
    /// # Example
    /// ```no_run
    /// use ble_log_decoder::Analyzer;
    /// use std::path::Path;
    ///
    /// let analyzer = Analyzer::new();
    /// let result = analyzer.analyze_file(Path::new("capture.log")).unwrap();
    /// for command in &result.commands {
    ///     println!("{} {} {}", command.identifier, command.payload_hex(), command.label);
    /// }
    /// ```
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        log::info!("Analyzing log file: {:?}", path);
        let reader = Self::open(path)?;
        self.analyze_reader(reader)
    }

    /// Analyze any buffered line stream
    pub fn analyze_reader<R: BufRead>(&self, reader: R) -> Result<AnalysisResult> {
        let mut extractor = EventExtractor::new(reader, &self.matcher);
        let mut assembler = SequenceAssembler::new(&self.classifier);

        for event in &mut extractor {
            assembler.push(&event?);
        }

        let stats = extractor.stats();
        if stats.decode_errors > 0 {
            log::warn!("{} line(s) were not valid UTF-8 and were skipped", stats.decode_errors);
        }
        log::info!(
            "Processed {} lines: {} matched, {} skipped, {} commands",
            stats.total_lines,
            stats.matched_lines,
            stats.skipped_lines,
            assembler.len()
        );

        Ok(assembler.finish(stats))
    }

    /// Extract events without assembling them
    pub fn extract_events<R: BufRead>(&self, reader: R) -> EventExtractor<'_, R> {
        EventExtractor::new(reader, &self.matcher)
    }

    /// Assemble a previously extracted event sequence
    pub fn assemble(&self, events: &[LogEvent], stats: LineStats) -> AnalysisResult {
        SequenceAssembler::assemble(events, &self.classifier, stats)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
