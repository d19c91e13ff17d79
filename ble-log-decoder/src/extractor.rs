//! Event extraction
//!
//! Drives the format matcher over a line stream in a single forward pass. Only
//! the events of the current line are buffered, so inputs of any length can be
//! streamed.

use crate::formats::FormatMatcher;
use crate::types::{DecoderError, LineStats, LogEvent, Result};
use std::collections::VecDeque;
use std::io::BufRead;

/// Iterator over the events of a log stream
///
/// Lines are numbered from 1. Lines that are not valid UTF-8, blank lines and
/// lines no recognizer accepts are counted as skipped. A read error is yielded
/// once and ends the iteration.
pub struct EventExtractor<'a, R: BufRead> {
    reader: R,
    matcher: &'a FormatMatcher,
    buf: Vec<u8>,
    pending: VecDeque<LogEvent>,
    stats: LineStats,
    finished: bool,
}

impl<'a, R: BufRead> EventExtractor<'a, R> {
    pub fn new(reader: R, matcher: &'a FormatMatcher) -> Self {
        Self {
            reader,
            matcher,
            buf: Vec::new(),
            pending: VecDeque::new(),
            stats: LineStats::default(),
            finished: false,
        }
    }

    /// Line statistics so far
    pub fn stats(&self) -> LineStats {
        self.stats
    }

    /// Drain the stream into an ordered event sequence
    pub fn collect_events(mut self) -> Result<(Vec<LogEvent>, LineStats)> {
        let mut events = Vec::new();
        for event in &mut self {
            events.push(event?);
        }
        Ok((events, self.stats))
    }

    /// Read and classify the next line; returns false at end of input
    fn advance(&mut self) -> Result<bool> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| DecoderError::ReadFailed {
                lines_processed: self.stats.total_lines,
                source,
            })?;
        if read == 0 {
            return Ok(false);
        }

        self.stats.total_lines += 1;
        let line = self.stats.total_lines;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        let text = match std::str::from_utf8(&self.buf) {
            Ok(text) => text,
            Err(e) => {
                log::trace!("line {}: not valid UTF-8 ({})", line, e);
                self.stats.decode_errors += 1;
                self.stats.skipped_lines += 1;
                return Ok(true);
            }
        };

        if text.trim().is_empty() {
            self.stats.skipped_lines += 1;
            return Ok(true);
        }

        let events = self.matcher.match_line(text, line);
        if events.is_empty() {
            log::trace!("line {}: no dialect matched", line);
            self.stats.skipped_lines += 1;
            return Ok(true);
        }

        self.stats.matched_lines += 1;
        for event in events {
            if event.payload().map_or(false, |p| p.truncated) {
                log::debug!("line {}: dropped malformed hex residue", line);
                self.stats.malformed_payloads += 1;
            }
            log::debug!("line {}: {} event", line, event.kind());
            self.pending.push_back(event);
        }
        Ok(true)
    }
}

impl<'a, R: BufRead> Iterator for EventExtractor<'a, R> {
    type Item = Result<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            match self.advance() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
