//! Access Log Parser Library
//!
//! A stateless, reusable library for parsing Apache combined-format
//! access logs and computing a fixed set of aggregate reports.
//!
//! # Architecture
//!
//! Data flows strictly forward through three stages:
//! - Tokenizer: extracts the six fields of one raw line (multi-stage,
//!   quote-pairing based, no monolithic pattern)
//! - Record builder: validates the whole file structurally, then converts
//!   every line into a typed [`LogRecord`] inside an immutable
//!   [`RecordTable`]
//! - Report engine: pure grouping/ranking/bucketing functions over the
//!   table, dispatched through the closed [`ReportKind`] enum
//!
//! The library does NOT:
//! - Parse command-line arguments
//! - Print or format output tables
//! - Stream input (the whole file is parsed before any report runs)
//!
//! All of that is in the application layer (access-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use access_log_parser::{run_report, RecordTable, ReportKind, ReportOptions};
//! use std::path::Path;
//!
//! let table = RecordTable::from_path(Path::new("access.log")).unwrap();
//! let output = run_report(ReportKind::Top10Pages, &table, &ReportOptions::default()).unwrap();
//! println!("{:?}", output);
//! ```

// Public modules
pub mod records;
pub mod reports;
pub mod tokenizer;
pub mod types;

// Re-export main types for convenience
pub use reports::{
    run_report, CountRow, IpPageRow, MinuteRow, ReportKind, ReportOptions, ReportOutput,
    SizePolicy,
};
pub use tokenizer::{tokenize, TokenSet, FIELD_COUNT};
pub use types::{LogRecord, ParseError, RecordTable, ReportError, Result, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: one line in, one record out, every field typed.
        let lines = vec![
            "1.2.3.4 - - [10/Oct/2023:13:55:36 +0000] \"GET /index.html HTTP/1.1\" 200 1024 \"-\" \"curl/7.68.0\"",
        ];
        let table = RecordTable::from_lines(&lines).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].response_code, 200);
    }
}
