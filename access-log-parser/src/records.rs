//! Record builder
//!
//! Turns raw log lines into a typed [`RecordTable`] in two passes:
//!
//! 1. a whole-file structural pass that tokenizes every line and aborts on
//!    the first line that does not produce the six expected fields;
//! 2. a typed pass that splits the composite response blob and converts
//!    timestamp, status code and size.
//!
//! The passes are deliberately separate so that structural errors are
//! always reported before value errors, and a table is either complete or
//! not produced at all.

use crate::tokenizer::{tokenize, TokenSet};
use crate::types::{LogRecord, ParseError, RecordTable, Result};
use chrono::DateTime;
use std::path::Path;

/// Timestamp layout inside the brackets: `10/Oct/2023:13:55:36 +0000`
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

impl RecordTable {
    /// Read an access-log file and build the full record table
    ///
    /// The whole file is loaded before parsing starts; this is a batch
    /// tool and the file is expected to fit in memory. An empty file is
    /// an error, not an empty table.
    pub fn from_path(path: &Path) -> Result<Self> {
        log::info!("Reading access log: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = content.lines().collect();
        Self::from_lines(&lines)
    }

    /// Build the record table from already-split lines
    ///
    /// Line order is preserved: `table.records()[i]` comes from
    /// `lines[i]`, and `table.len()` equals `lines.len()` on success.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        if lines.is_empty() {
            return Err(ParseError::EmptyFile);
        }

        // Structural pass: every line must tokenize into six fields
        // before any value is converted.
        let mut token_sets = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            token_sets.push(tokenize(line.as_ref(), idx + 1)?);
        }
        log::debug!("All {} lines tokenized with uniform shape", token_sets.len());

        // Typed pass: convert each token set into a record.
        let mut records = Vec::with_capacity(token_sets.len());
        for (idx, tokens) in token_sets.iter().enumerate() {
            records.push(build_record(tokens, idx + 1)?);
        }

        log::info!("Parsed {} log records", records.len());
        Ok(RecordTable::new(records))
    }
}

/// Convert one token set into a typed record
fn build_record(tokens: &TokenSet<'_>, line_number: usize) -> Result<LogRecord> {
    // The tokenizer guarantees the blob shape, but the split stays here:
    // the blob is a single composite field until typed conversion.
    let mut blob = tokens.response_blob.split_whitespace();
    let (code_raw, size_raw) = match (blob.next(), blob.next()) {
        (Some(code), Some(size)) => (code, size),
        _ => {
            return Err(field_error(
                line_number,
                "response_blob",
                tokens.response_blob,
                "expected two whitespace-separated integers",
            ))
        }
    };

    let timestamp = DateTime::parse_from_str(tokens.timestamp_raw, TIMESTAMP_FORMAT)
        .map_err(|e| field_error(line_number, "timestamp", tokens.timestamp_raw, e))?;

    let response_code: u16 = code_raw
        .parse()
        .map_err(|e| field_error(line_number, "response_code", code_raw, e))?;

    let response_size: u64 = size_raw
        .parse()
        .map_err(|e| field_error(line_number, "response_size", size_raw, e))?;

    Ok(LogRecord {
        ip: tokens.ip.to_string(),
        timestamp,
        request: tokens.request.to_string(),
        referring_site: tokens.referring_site.to_string(),
        user_agent: tokens.user_agent.to_string(),
        response_code,
        response_size,
    })
}

fn field_error(
    line_number: usize,
    field: &'static str,
    value: &str,
    reason: impl ToString,
) -> ParseError {
    ParseError::FieldParse {
        line: line_number,
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn sample_lines() -> Vec<String> {
        vec![
            "1.2.3.4 - - [10/Oct/2023:13:55:36 +0000] \"GET /index.html HTTP/1.1\" 200 1024 \"-\" \"curl/7.68.0\"".to_string(),
            "5.6.7.8 - - [10/Oct/2023:13:56:01 +0200] \"POST /login HTTP/1.1\" 401 512 \"https://example.com/\" \"Mozilla/5.0\"".to_string(),
            "1.2.3.4 - - [10/Oct/2023:13:57:12 +0000] \"GET /missing HTTP/1.1\" 404 0 \"-\" \"curl/7.68.0\"".to_string(),
        ]
    }

    #[test]
    fn test_table_length_matches_line_count() {
        let lines = sample_lines();
        let table = RecordTable::from_lines(&lines).unwrap();
        assert_eq!(table.len(), lines.len());
    }

    #[test]
    fn test_input_order_is_preserved() {
        let table = RecordTable::from_lines(&sample_lines()).unwrap();
        let ips: Vec<&str> = table.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["1.2.3.4", "5.6.7.8", "1.2.3.4"]);
    }

    #[test]
    fn test_typed_fields() {
        let table = RecordTable::from_lines(&sample_lines()).unwrap();
        let second = &table.records()[1];
        assert_eq!(second.request, "\"POST /login HTTP/1.1\"");
        assert_eq!(second.referring_site, "\"https://example.com/\"");
        assert_eq!(second.user_agent, "\"Mozilla/5.0\"");
        assert_eq!(second.response_code, 401);
        assert_eq!(second.response_size, 512);

        // The +0200 offset must survive parsing untouched.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let expected = offset.with_ymd_and_hms(2023, 10, 10, 13, 56, 1).unwrap();
        assert_eq!(second.timestamp, expected);
    }

    #[test]
    fn test_malformed_line_reports_correct_index() {
        let mut lines = sample_lines();
        lines[1] = "5.6.7.8 - - [10/Oct/2023:13:56:01 +0200 \"POST /login HTTP/1.1\" 401 512 \"-\" \"ua\"".to_string();
        let err = RecordTable::from_lines(&lines).unwrap_err();
        match err {
            ParseError::MalformedLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_structural_errors_reported_before_value_errors() {
        // Line 1 has a bad timestamp value (a field error); line 3 fails
        // to tokenize at all. The structural pass runs first, so the
        // malformed line wins even though it comes later in the file.
        let lines = vec![
            "1.2.3.4 - - [99/Zzz/2023:13:55:36 +0000] \"GET / HTTP/1.1\" 200 10 \"-\" \"ua\"",
            "5.6.7.8 - - [10/Oct/2023:13:56:01 +0000] \"GET / HTTP/1.1\" 200 10 \"-\" \"ua\"",
            "not a log line at all",
        ];
        let err = RecordTable::from_lines(&lines).unwrap_err();
        match err {
            ParseError::MalformedLine { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_is_a_field_error() {
        let lines = vec![
            "1.2.3.4 - - [99/Zzz/2023:13:55:36 +0000] \"GET / HTTP/1.1\" 200 10 \"-\" \"ua\"",
        ];
        let err = RecordTable::from_lines(&lines).unwrap_err();
        match err {
            ParseError::FieldParse { line, field, value, .. } => {
                assert_eq!(line, 1);
                assert_eq!(field, "timestamp");
                assert_eq!(value, "99/Zzz/2023:13:55:36 +0000");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_code_overflow_is_a_field_error() {
        // Structurally valid (two digit runs) but does not fit in u16.
        let lines = vec![
            "1.2.3.4 - - [10/Oct/2023:13:55:36 +0000] \"GET / HTTP/1.1\" 99999999 10 \"-\" \"ua\"",
        ];
        let err = RecordTable::from_lines(&lines).unwrap_err();
        match err {
            ParseError::FieldParse { field, .. } => assert_eq!(field, "response_code"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let lines: Vec<String> = Vec::new();
        assert!(matches!(
            RecordTable::from_lines(&lines),
            Err(ParseError::EmptyFile)
        ));
    }
}
