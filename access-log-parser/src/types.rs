//! Core types for the access-log parser library
//!
//! This module defines the typed record set that the parser produces and the
//! error taxonomy shared by the tokenizer, the record builder, and the
//! report engine. The parser is batch-oriented: a `RecordTable` is built
//! once from a whole file and is read-only afterwards.

use crate::reports::ReportKind;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Timestamp type used throughout the library.
///
/// The UTC offset from the log line is kept as parsed; timestamps are never
/// normalized to UTC, so minute bucketing and rendering can carry the
/// original zone through.
pub type Timestamp = DateTime<FixedOffset>;

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// One fully typed row derived from a single access-log line
///
/// The quoted fields (`request`, `referring_site`, `user_agent`) are kept
/// as opaque text including their surrounding quotes, exactly as they
/// appear on the line. The client address is opaque too - it is shaped
/// like a dotted quad but not validated as a routable IP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Client address (dotted-quad token at the start of the line)
    pub ip: String,
    /// Request timestamp with its original UTC offset
    pub timestamp: Timestamp,
    /// Raw HTTP request line, quotes included (e.g. `"GET / HTTP/1.1"`)
    pub request: String,
    /// Referrer field, quotes included (`"-"` when absent)
    pub referring_site: String,
    /// User agent field, quotes included
    pub user_agent: String,
    /// HTTP response status code
    pub response_code: u16,
    /// Response body size in bytes
    pub response_size: u64,
}

/// An ordered, immutable collection of log records
///
/// Record order matches input line order. The table is built once by the
/// record builder and only read afterwards; every report is a pure
/// function over `&RecordTable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTable {
    records: Vec<LogRecord>,
}

impl RecordTable {
    pub(crate) fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    /// All records in input order
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Number of records (equals the number of input lines)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in input order
    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Errors raised while turning raw text into a `RecordTable`
///
/// All of these are fatal for the whole run: a table is either complete or
/// not produced at all, so a structural problem on one line can never
/// silently skew every report computed downstream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A line does not tokenize into the six expected fields
    #[error("line {line}: malformed log line ({reason}): {text:?}")]
    MalformedLine {
        /// 1-based line number in the input file
        line: usize,
        /// Which tokenizer stage rejected the line
        reason: String,
        /// The offending line, verbatim
        text: String,
    },

    /// A field tokenized but failed typed conversion
    #[error("line {line}: field '{field}' has invalid value {value:?}: {reason}")]
    FieldParse {
        /// 1-based line number in the input file
        line: usize,
        /// Name of the field that failed to convert
        field: &'static str,
        /// Raw token value
        value: String,
        reason: String,
    },

    /// The input file contains no lines at all
    #[error("log file contains no lines")]
    EmptyFile,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the report engine over a valid `RecordTable`
///
/// Distinct from `ParseError` on purpose: an unknown report code points at
/// CLI misuse, not at bad input data.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report selector is not one of the known codes
    #[error("unknown report code {code:?} (valid codes: {})", ReportKind::code_list())]
    UnknownReport { code: String },

    /// Strict size policy: a fixed-size report cannot be filled
    #[error("{report}: needs {needed} distinct entries but only {available} are present")]
    InsufficientData {
        report: ReportKind,
        needed: usize,
        available: usize,
    },

    /// The requested report is undefined over an empty table
    #[error("{report}: cannot be computed over an empty record table")]
    EmptyTable { report: ReportKind },
}
