//! Access Log Report CLI Application
//!
//! Command-line front end for the access-log-parser library. It adds:
//! - Argument parsing and validation
//! - File loading
//! - Report rendering (text tables, optional JSON)
//! - Exit codes and user-facing error messages
//!
//! All parsing and report computation lives in the library; this binary
//! only wires the stages together and prints the result.

use access_log_parser::{run_report, RecordTable, ReportKind, ReportOptions, SizePolicy, Timestamp};
use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;

mod render;

/// Layout of the --time-from/--time-to values: `10-10-2023 13:55`
const WINDOW_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Access Log Reporter - aggregate reports over Apache combined access logs
#[derive(Parser, Debug)]
#[command(name = "access-log-cli")]
#[command(about = "Compute aggregate reports over an Apache combined access log", long_about = None)]
#[command(version)]
struct Args {
    /// Report to produce: TOP_10_PAGES, PERC_OK, PERC_BAD, TOP_10_BAD,
    /// TOP_10_IPS, TOP_IPS_PAGES or PER_MIN
    #[arg(value_name = "REPORT")]
    report_code: String,

    /// Path to the access log file
    #[arg(value_name = "FILE")]
    filename: PathBuf,

    /// Start of the PER_MIN window (inclusive), format: d-m-Y H:M
    #[arg(long, value_name = "TIME")]
    time_from: Option<String>,

    /// End of the PER_MIN window (inclusive), format: d-m-Y H:M
    #[arg(long, value_name = "TIME")]
    time_to: Option<String>,

    /// Fail when a fixed-size report cannot be filled instead of
    /// returning fewer rows
    #[arg(long)]
    strict: bool,

    /// Emit the report as JSON instead of a text table
    #[arg(long)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);
    log::info!("access-log-cli v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using parser library v{}", access_log_parser::VERSION);

    let kind: ReportKind = args.report_code.parse()?;

    if kind != ReportKind::PerMin && (args.time_from.is_some() || args.time_to.is_some()) {
        bail!("--time-from/--time-to only apply to the PER_MIN report");
    }

    let table = RecordTable::from_path(&args.filename)
        .with_context(|| format!("failed to parse log file {:?}", args.filename))?;
    log::debug!("Loaded {} records from {:?}", table.len(), args.filename);

    // Window bounds come in without a zone; interpret them in the offset
    // of the file's first record, the same offset PER_MIN renders in.
    let offset = table
        .records()
        .first()
        .map(|r| *r.timestamp.offset())
        .unwrap_or_else(|| Utc.fix());
    let options = ReportOptions {
        policy: if args.strict {
            SizePolicy::Strict
        } else {
            SizePolicy::BestEffort
        },
        time_from: parse_window_bound(args.time_from.as_deref(), offset)?,
        time_to: parse_window_bound(args.time_to.as_deref(), offset)?,
    };

    let output = run_report(kind, &table, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render::render_report(kind, &output));
    }

    Ok(())
}

/// Parse one optional window bound in the given UTC offset
fn parse_window_bound(raw: Option<&str>, offset: FixedOffset) -> Result<Option<Timestamp>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let naive = NaiveDateTime::parse_from_str(raw, WINDOW_FORMAT).with_context(|| {
        format!(
            "invalid time bound {:?}, expected format d-m-Y H:M (e.g. \"10-10-2023 13:55\")",
            raw
        )
    })?;
    // A fixed offset maps every local time exactly once.
    let bound = offset
        .from_local_datetime(&naive)
        .single()
        .with_context(|| format!("time bound {:?} is not representable", raw))?;
    Ok(Some(bound))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_window_bound() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let bound = parse_window_bound(Some("10-10-2023 13:55"), offset)
            .unwrap()
            .unwrap();
        assert_eq!(bound.day(), 10);
        assert_eq!(bound.month(), 10);
        assert_eq!(bound.hour(), 13);
        assert_eq!(bound.minute(), 55);
        assert_eq!(bound.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_parse_window_bound_absent() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert_eq!(parse_window_bound(None, offset).unwrap(), None);
    }

    #[test]
    fn test_parse_window_bound_rejects_other_formats() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert!(parse_window_bound(Some("2023-10-10 13:55"), offset).is_err());
        assert!(parse_window_bound(Some("not a time"), offset).is_err());
    }
}
