//! End-to-end pipeline test: write a log file to disk, parse it, and run
//! every report through the dispatcher the way the CLI does.

use access_log_parser::{
    run_report, ParseError, RecordTable, ReportKind, ReportOptions, ReportOutput,
};
use std::io::Write;
use tempfile::NamedTempFile;

const FIXTURE: &str = "\
203.0.113.7 - - [10/Oct/2023:13:55:36 +0000] \"GET /index.html HTTP/1.1\" 200 1024 \"-\" \"curl/7.68.0\"
203.0.113.7 - - [10/Oct/2023:13:55:48 +0000] \"GET /style.css HTTP/1.1\" 200 310 \"http://example.com/\" \"curl/7.68.0\"
198.51.100.2 - - [10/Oct/2023:13:56:02 +0000] \"GET /index.html HTTP/1.1\" 304 0 \"-\" \"Mozilla/5.0\"
198.51.100.2 - - [10/Oct/2023:13:58:11 +0000] \"GET /missing HTTP/1.1\" 404 162 \"-\" \"Mozilla/5.0\"
203.0.113.7 - - [10/Oct/2023:13:58:59 +0000] \"POST /login HTTP/1.1\" 500 88 \"http://example.com/\" \"curl/7.68.0\"
";

fn write_fixture(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn parse_file_and_run_every_report() {
    let file = write_fixture(FIXTURE);
    let table = RecordTable::from_path(file.path()).unwrap();
    assert_eq!(table.len(), 5);

    let options = ReportOptions::default();

    match run_report(ReportKind::Top10Pages, &table, &options).unwrap() {
        ReportOutput::Counts(rows) => {
            assert_eq!(rows[0].key, "\"GET /index.html HTTP/1.1\"");
            assert_eq!(rows[0].count, 2);
        }
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::PercOk, &table, &options).unwrap() {
        // 200, 200, 304 out of 5.
        ReportOutput::Percentage(p) => assert_eq!(format!("{:.2}%", p), "60.00%"),
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::PercBad, &table, &options).unwrap() {
        ReportOutput::Percentage(p) => assert_eq!(format!("{:.2}%", p), "40.00%"),
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::Top10Bad, &table, &options).unwrap() {
        ReportOutput::Counts(rows) => {
            let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
            assert_eq!(
                keys,
                vec!["\"GET /missing HTTP/1.1\"", "\"POST /login HTTP/1.1\""]
            );
        }
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::Top10Ips, &table, &options).unwrap() {
        ReportOutput::Counts(rows) => {
            assert_eq!(rows[0].key, "203.0.113.7");
            assert_eq!(rows[0].count, 3);
        }
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::TopIpsPages, &table, &options).unwrap() {
        ReportOutput::IpPages(rows) => {
            assert!(!rows.is_empty());
            assert_eq!(rows[0].ip, "203.0.113.7");
        }
        other => panic!("unexpected output: {:?}", other),
    }

    match run_report(ReportKind::PerMin, &table, &options).unwrap() {
        ReportOutput::Minutes(rows) => {
            // 13:55 through 13:58 inclusive, 13:57 empty.
            assert_eq!(rows.len(), 4);
            let counts: Vec<u64> = rows.iter().map(|r| r.count).collect();
            assert_eq!(counts, vec![2, 1, 0, 2]);
        }
        other => panic!("unexpected output: {:?}", other),
    }
}

#[test]
fn malformed_file_fails_before_any_report() {
    let broken = FIXTURE.replace(
        "[10/Oct/2023:13:56:02 +0000]",
        "[10/Oct/2023:13:56:02 +0000",
    );
    let file = write_fixture(&broken);
    let err = RecordTable::from_path(file.path()).unwrap_err();
    match err {
        ParseError::MalformedLine { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn empty_file_is_rejected() {
    let file = write_fixture("");
    assert!(matches!(
        RecordTable::from_path(file.path()),
        Err(ParseError::EmptyFile)
    ));
}
