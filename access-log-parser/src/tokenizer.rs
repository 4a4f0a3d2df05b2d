//! Combined-log line tokenizer
//!
//! Extracts the six fields of an Apache "combined" access-log line:
//!
//! ```text
//! IP - - [timestamp] "request" status size "referrer" "user-agent"
//! ```
//!
//! The tokenizer works in explicit stages instead of one monolithic
//! pattern, so each field extraction is independently testable:
//!
//! 1. leading dotted-quad token -> `ip`
//! 2. bracket-delimited span -> `timestamp_raw` (brackets stripped)
//! 3. quote-delimited spans, by quote pairing - exactly three on a
//!    well-formed line: `request`, `referring_site`, `user_agent`
//! 4. the text between the first and second quoted spans -> the composite
//!    `response_blob` (status code and size, split later by the record
//!    builder)
//!
//! Quote pairing alone decides where the request ends and the referrer
//! begins; the tokenizer assigns no meaning to the quoted contents.
//! Tokenizing is a pure function over one line of text.

use crate::types::{ParseError, Result};

/// Number of fields extracted from every well-formed line
pub const FIELD_COUNT: usize = 6;

/// The six substrings extracted from one log line, borrowed from it
///
/// `response_blob` is a composite field: two whitespace-separated integer
/// tokens (status code, then byte size). Splitting and typed conversion
/// happen in the record builder, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSet<'a> {
    /// Dotted-quad client address
    pub ip: &'a str,
    /// Timestamp text without the surrounding brackets
    pub timestamp_raw: &'a str,
    /// First quoted span, quotes included
    pub request: &'a str,
    /// Status code and size, as found between request and referrer
    pub response_blob: &'a str,
    /// Second quoted span, quotes included
    pub referring_site: &'a str,
    /// Third quoted span, quotes included
    pub user_agent: &'a str,
}

impl<'a> TokenSet<'a> {
    /// Positional view of the fields, in line order
    ///
    /// The response blob sits between the request and the referrer on the
    /// line, which is why it comes fourth here rather than last.
    pub fn fields(&self) -> [&'a str; FIELD_COUNT] {
        [
            self.ip,
            self.timestamp_raw,
            self.request,
            self.response_blob,
            self.referring_site,
            self.user_agent,
        ]
    }
}

/// Tokenize one log line into its six fields
///
/// `line_number` is 1-based and only used for error reporting; the
/// function itself is pure. Any stage failure is a
/// [`ParseError::MalformedLine`] naming the stage and carrying the
/// offending line verbatim.
pub fn tokenize(line: &str, line_number: usize) -> Result<TokenSet<'_>> {
    // Tolerate CRLF input; the carriage return is not part of any field.
    let line = line.trim_end_matches('\r');

    let ip = leading_ip(line)
        .ok_or_else(|| malformed(line_number, line, "line does not start with a dotted-quad client address"))?;

    let timestamp_raw = bracketed_span(line)
        .ok_or_else(|| malformed(line_number, line, "missing bracket-delimited timestamp"))?;

    let quoted = quoted_spans(line)
        .ok_or_else(|| malformed(line_number, line, "unbalanced '\"' quoting"))?;
    if quoted.len() != 3 {
        return Err(malformed(
            line_number,
            line,
            format!("expected 3 quoted fields, found {}", quoted.len()),
        ));
    }

    let (request_span, referrer_span, agent_span) = (quoted[0], quoted[1], quoted[2]);
    let response_blob = line[request_span.1..referrer_span.0].trim();
    if !is_integer_pair(response_blob) {
        return Err(malformed(
            line_number,
            line,
            "expected status code and size between request and referrer",
        ));
    }

    Ok(TokenSet {
        ip,
        timestamp_raw,
        request: &line[request_span.0..request_span.1],
        response_blob,
        referring_site: &line[referrer_span.0..referrer_span.1],
        user_agent: &line[agent_span.0..agent_span.1],
    })
}

fn malformed(line_number: usize, line: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedLine {
        line: line_number,
        reason: reason.into(),
        text: line.to_string(),
    }
}

/// Stage 1: the whitespace-delimited token at the start of the line,
/// accepted when it is four dot-separated digit runs
fn leading_ip(line: &str) -> Option<&str> {
    let token = line.split_whitespace().next()?;
    let mut parts = 0;
    for part in token.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts += 1;
    }
    if parts == 4 {
        Some(token)
    } else {
        None
    }
}

/// Stage 2: the first `[...]` span, returned without the brackets
fn bracketed_span(line: &str) -> Option<&str> {
    let open = line.find('[')?;
    let close = line[open + 1..].find(']')? + open + 1;
    Some(&line[open + 1..close])
}

/// Stage 3: byte ranges of all `"..."` spans, quotes included
///
/// Returns `None` when a quote is left open at the end of the line.
fn quoted_spans(line: &str) -> Option<Vec<(usize, usize)>> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    for (idx, byte) in line.bytes().enumerate() {
        if byte != b'"' {
            continue;
        }
        match open.take() {
            // Range end is exclusive and includes the closing quote.
            Some(start) => spans.push((start, idx + 1)),
            None => open = Some(idx),
        }
    }
    if open.is_some() {
        None
    } else {
        Some(spans)
    }
}

/// Stage 4 shape check: exactly two whitespace-separated digit runs
fn is_integer_pair(blob: &str) -> bool {
    let mut tokens = 0;
    for token in blob.split_whitespace() {
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        tokens += 1;
    }
    tokens == 2
}
