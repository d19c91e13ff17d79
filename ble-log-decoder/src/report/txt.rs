//! Plain-text summary report

use super::ReportOptions;
use crate::types::{timestamp_seconds, AnalysisResult, CommandEntry};
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 60;

/// Render the human-readable summary of one run
pub fn render(result: &AnalysisResult, options: &ReportOptions) -> String {
    let mut out = String::new();
    if let Err(e) = write_report(&mut out, result, options) {
        log::warn!("text report incomplete: {}", e);
    }
    out
}

fn write_report(out: &mut String, result: &AnalysisResult, options: &ReportOptions) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);

    writeln!(out, "BLE Protocol Analysis")?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;

    let stats = &result.stats;
    writeln!(
        out,
        "Lines: {} total, {} matched, {} skipped",
        stats.total_lines, stats.matched_lines, stats.skipped_lines
    )?;
    if stats.decode_errors > 0 {
        writeln!(out, "Undecodable lines: {}", stats.decode_errors)?;
    }
    if stats.malformed_payloads > 0 {
        writeln!(out, "Malformed payloads: {}", stats.malformed_payloads)?;
    }
    writeln!(
        out,
        "Events: {} writes, {} reads, {} notifies",
        result.commands.len(),
        result.reads,
        result.notifies
    )?;
    writeln!(out)?;

    if !result.services.is_empty() {
        writeln!(out, "Discovered identifiers:")?;
        for id in &result.services {
            writeln!(out, "  {}", id)?;
        }
        writeln!(out)?;
    }

    if !result.characteristics.is_empty() {
        writeln!(out, "Handle map:")?;
        for (handle, id) in &result.characteristics {
            writeln!(out, "  0x{} -> {}", handle, id)?;
        }
        writeln!(out)?;
    }

    if result.commands.is_empty() {
        writeln!(out, "No write commands found.")?;
        if !result.raw_data.is_empty() {
            writeln!(out)?;
            writeln!(out, "Raw data observations:")?;
            writeln!(out, "{}", thin)?;
            for raw in result.raw_data.iter().take(options.limit) {
                writeln!(
                    out,
                    "  line {:>5}: {}  [{}]",
                    raw.line,
                    spaced_hex(&raw.payload),
                    raw.label
                )?;
            }
        }
        return Ok(());
    }

    writeln!(out, "Write command sequence:")?;
    writeln!(out, "{}", thin)?;
    let mut previous: Option<f64> = None;
    for cmd in result.commands.iter().take(options.limit) {
        write_command(out, cmd, &mut previous)?;
    }
    if result.commands.len() > options.limit {
        writeln!(
            out,
            "  ... {} more command(s) in the JSON artifact",
            result.commands.len() - options.limit
        )?;
    }
    writeln!(out)?;

    let frequent = result.most_frequent();
    if !frequent.is_empty() {
        writeln!(out, "Most frequent payloads:")?;
        for (hex, count) in frequent.into_iter().take(options.top_payloads) {
            writeln!(out, "  {}: {}x", hex, count)?;
        }
    }

    Ok(())
}

fn write_command(out: &mut String, cmd: &CommandEntry, previous: &mut Option<f64>) -> fmt::Result {
    let handle = cmd
        .handle
        .map(|h| format!("0x{}", h))
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        out,
        "{:3}. {} (handle {}) {}",
        cmd.index,
        cmd.identifier,
        handle,
        cmd.payload_hex()
    )?;
    writeln!(out, "     bytes: [{}]", spaced_hex(&cmd.payload))?;
    writeln!(out, "     label: {} ({})", cmd.label, cmd.confidence)?;

    let seconds = cmd.timestamp.as_deref().and_then(timestamp_seconds);
    if let (Some(now), Some(before)) = (seconds, *previous) {
        writeln!(out, "     gap:   {:.3}s", now - before)?;
    }
    if seconds.is_some() {
        *previous = seconds;
    }
    Ok(())
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, Handle, RawObservation};

    fn command(index: usize, timestamp: Option<&str>, payload: &[u8]) -> CommandEntry {
        CommandEntry {
            index,
            line: index * 2,
            timestamp: timestamp.map(str::to_string),
            handle: Some(Handle(0x12)),
            identifier: "FFF3".to_string(),
            payload: payload.to_vec(),
            label: "WiFi Enable".to_string(),
            confidence: Confidence::Exact,
        }
    }

    #[test]
    fn test_limit_and_gaps() {
        let mut result = AnalysisResult::default();
        result.commands.push(command(1, Some("10:00:00.000"), &[2, 0, 1]));
        result.commands.push(command(2, Some("10:00:00.250"), &[2, 0, 1]));
        result.commands.push(command(3, None, &[2, 0, 1]));
        result.frequency.insert("020001".to_string(), 3);

        let text = render(&result, &ReportOptions::default().with_limit(2));
        assert!(text.contains("  1. FFF3 (handle 0x0012) 020001"));
        assert!(text.contains("bytes: [02 00 01]"));
        assert!(text.contains("gap:   0.250s"));
        assert!(!text.contains("  3. FFF3"));
        assert!(text.contains("1 more command(s)"));
        assert!(text.contains("020001: 3x"));
    }

    #[test]
    fn test_raw_data_when_no_writes() {
        let mut result = AnalysisResult::default();
        result.raw_data.push(RawObservation {
            line: 4,
            payload: vec![0x04, 0x01, 0x00],
            label: "AP Mode Enable".to_string(),
        });

        let text = render(&result, &ReportOptions::default());
        assert!(text.contains("No write commands found."));
        assert!(text.contains("04 01 00  [AP Mode Enable]"));
    }

    #[test]
    fn test_empty_result() {
        let text = render(&AnalysisResult::default(), &ReportOptions::default());
        assert!(text.contains("Lines: 0 total"));
        assert!(!text.contains("Raw data"));
    }

    #[test]
    fn test_write_report_appends_and_succeeds() {
        let mut result = AnalysisResult::default();
        result.commands.push(command(1, Some("10:00:00.000"), &[2, 0, 1]));
        let options = ReportOptions::default();

        let mut out = String::from("header\n");
        assert!(write_report(&mut out, &result, &options).is_ok());
        assert_eq!(out, format!("header\n{}", render(&result, &options)));

        let mut previous = Some(0.0);
        let mut line = String::new();
        assert!(write_command(&mut line, &result.commands[0], &mut previous).is_ok());
        assert!(line.contains("gap:   36000.000s"));
        assert_eq!(previous, Some(36000.0));
    }
}
