//! Hex payload extraction
//!
//! A payload is a contiguous run of byte tokens: two hex digits, optionally
//! prefixed with `0x`, separated by whitespace or commas. Contiguous digit runs
//! (`0x010100`, `010100`) are split into pairs. Trailing odd or invalid residue
//! is dropped and flagged, never reported as an error.

use super::patterns::{HANDLE_RE, WRITE_RE};
use crate::types::Payload;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// `Value: ...`, `Data = ...`, `bytes = ...` fields
static VALUE_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:value|data|bytes)\s*[:=]\s*").unwrap());

/// Bracketed lists: `[01 02 03]`, `<0d0100>`
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[<]([^\[\]<>]*)[\]>]").unwrap());

/// Runs of `0x`-prefixed tokens
static PREFIXED_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b0x[0-9a-f]+(?:[\s,]+0x[0-9a-f]+)*").unwrap());

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s,]+").unwrap());

/// Where a run is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// After a `Value:` field, inside brackets, or a `0x` run
    Field,
    /// Loose words following a `write` keyword
    FreeText,
}

enum Token {
    /// Full bytes; `false` ends the run after this token
    Bytes(Vec<u8>, bool),
    /// Bytes followed by dropped residue; ends the run
    Truncated(Vec<u8>),
    /// Not a byte token; ends the run
    End,
}

fn trim_punctuation(token: &str) -> &str {
    token
        .trim_start_matches(['[', '(', '{', '<'])
        .trim_end_matches([']', ')', '}', '>', ';', '.', ':'])
}

fn pairs(digits: &str) -> Vec<u8> {
    digits
        .as_bytes()
        .chunks_exact(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .collect()
}

/// Whether a token made only of hex letters (`CAFE`, `added`) reads as a word
fn is_word(token: &str, scan: Scan) -> bool {
    let upper = token.chars().all(|c| c.is_ascii_uppercase());
    let lower = token.chars().all(|c| c.is_ascii_lowercase());
    if !(upper || lower) || token.len() % 2 == 1 {
        return true;
    }
    match scan {
        Scan::Field => false,
        Scan::FreeText => lower || token.len() > 2,
    }
}

fn classify_token(raw: &str, scan: Scan) -> Token {
    let closes_run = raw.ends_with([']', ')', '}', '>']);
    let token = trim_punctuation(raw);

    if let Some(digits) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        let hex_len = digits.chars().take_while(|c| c.is_ascii_hexdigit()).count();
        let bytes = pairs(&digits[..hex_len - hex_len % 2]);
        if hex_len % 2 == 1 || hex_len < digits.len() || hex_len == 0 {
            return Token::Truncated(bytes);
        }
        return Token::Bytes(bytes, !closes_run);
    }

    if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Token::End;
    }
    if !token.chars().any(|c| c.is_ascii_digit()) && is_word(token, scan) {
        return Token::End;
    }
    if token.len() % 2 == 1 {
        return Token::Truncated(pairs(&token[..token.len() - 1]));
    }
    Token::Bytes(pairs(token), !closes_run)
}

/// Read the run at the start of `text`; also returns the byte offset where it ends
fn scan_hex_run(text: &str, scan: Scan) -> (Payload, usize) {
    let mut payload = Payload::default();
    let mut end = 0;

    for m in TOKEN_RE.find_iter(text) {
        let raw = m.as_str();
        // An opening bracket after some bytes starts a new group
        if !payload.is_empty() && raw.starts_with(['[', '(', '{', '<']) {
            break;
        }
        match classify_token(raw, scan) {
            Token::Bytes(bytes, more) => {
                payload.bytes.extend(bytes);
                end = m.end();
                if !more {
                    break;
                }
            }
            Token::Truncated(bytes) => {
                payload.bytes.extend(bytes);
                payload.truncated = true;
                end = m.end();
                break;
            }
            Token::End => break,
        }
    }

    (payload, end)
}

/// Parse the byte run at the start of `text`
pub fn parse_hex_run(text: &str) -> Payload {
    scan_hex_run(text, Scan::Field).0
}

fn non_empty(payload: Payload) -> Option<Payload> {
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Byte ranges of the hex runs following `Value:`-style fields
fn value_field_spans(line: &str) -> Vec<(Range<usize>, Payload)> {
    VALUE_FIELD_RE
        .find_iter(line)
        .filter_map(|m| {
            let (payload, len) = scan_hex_run(&line[m.end()..], Scan::Field);
            non_empty(payload).map(|p| (m.end()..m.end() + len, p))
        })
        .collect()
}

/// Payload following an explicit `Value:`-style field
pub fn find_value_field(line: &str) -> Option<Payload> {
    value_field_spans(line).into_iter().next().map(|(_, p)| p)
}

/// The line with every `Value:` field's hex blanked out
///
/// Identifier lookups run on this so that a value such as `FFF3` is not read
/// as an identifier mention.
pub fn mask_value_fields(line: &str) -> String {
    let mut masked = line.to_string();
    for (span, _) in value_field_spans(line) {
        let blank = " ".repeat(span.len());
        masked.replace_range(span, &blank);
    }
    masked
}

/// Payload inside the first bracketed list that holds one
pub fn find_bracketed(line: &str) -> Option<Payload> {
    BRACKET_RE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .find_map(|inner| non_empty(parse_hex_run(inner.as_str())))
}

/// A run may only start on a plain byte pair or an even run of decimal digits
fn starts_free_run(raw: &str) -> bool {
    let token = trim_punctuation(raw);
    let plausible = token.len() == 2 || token.chars().all(|c| c.is_ascii_digit());
    plausible && matches!(classify_token(raw, Scan::FreeText), Token::Bytes(..))
}

/// Unprefixed bytes following the `write` keyword (`write 01 01 00`)
///
/// Handle references are masked first, so `Handle: 0x0012 01 01 00` yields
/// the three trailing bytes.
pub fn find_write_operand(line: &str) -> Option<Payload> {
    let masked = HANDLE_RE.replace_all(line, " ");
    let keyword = WRITE_RE.find(&masked)?;
    let rest = &masked[keyword.end()..];
    let start = TOKEN_RE.find_iter(rest).find(|t| starts_free_run(t.as_str()))?;
    non_empty(scan_hex_run(&rest[start.start()..], Scan::FreeText).0)
}

/// Locate a payload anywhere in a free-text line
///
/// Search order: explicit value field, bracketed list, `0x` token runs with
/// handle references masked out, then unprefixed bytes after `write`. Among
/// `0x` runs, byte lists (`0x0D 0x01`) are preferred over single wide
/// literals such as object addresses.
pub fn find_payload(line: &str) -> Option<Payload> {
    if let Some(payload) = find_value_field(line) {
        return Some(payload);
    }
    if let Some(payload) = find_bracketed(line) {
        return Some(payload);
    }

    let masked = HANDLE_RE.replace_all(line, " ");
    let runs: Vec<&str> = PREFIXED_RUN_RE
        .find_iter(&masked)
        .map(|m| m.as_str())
        .collect();

    let is_byte_list = |run: &&str| {
        run.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .all(|t| t.len() == 4)
    };

    runs.iter()
        .copied()
        .find(is_byte_list)
        .or_else(|| runs.first().copied())
        .and_then(|run| non_empty(parse_hex_run(run)))
        .or_else(|| find_write_operand(line))
}
