//! Text rendering for report output
//!
//! Turns a [`ReportOutput`] into the human-readable form printed on
//! stdout: aligned count tables for the ranking reports, one formatted
//! line for the percentage reports, and a timestamped table for the
//! per-minute volume report.

use access_log_parser::{CountRow, IpPageRow, MinuteRow, ReportKind, ReportOutput};
use std::fmt::Write;

/// Timestamp layout used for bucket labels, offset included
const BUCKET_FORMAT: &str = "%d/%b/%Y:%H:%M %z";

/// Render one report result as the text printed to stdout
pub fn render_report(kind: ReportKind, output: &ReportOutput) -> String {
    match output {
        ReportOutput::Counts(rows) => render_counts(kind, rows),
        ReportOutput::Percentage(percent) => render_percentage(kind, *percent),
        ReportOutput::IpPages(rows) => render_ip_pages(rows),
        ReportOutput::Minutes(rows) => render_minutes(rows),
    }
}

fn render_percentage(kind: ReportKind, percent: f64) -> String {
    let label = match kind {
        ReportKind::PercOk => "successful",
        _ => "unsuccessful",
    };
    format!("The rate of {} requests is {:.2}%\n", label, percent)
}

fn render_counts(kind: ReportKind, rows: &[CountRow]) -> String {
    if rows.is_empty() {
        return "(no matching records)\n".to_string();
    }

    let header = match kind {
        ReportKind::Top10Ips => "ip",
        _ => "request",
    };
    let width = rows
        .iter()
        .map(|r| r.key.len())
        .max()
        .unwrap_or(0)
        .max(header.len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:>7}", header, "count", width = width);
    for row in rows {
        let _ = writeln!(out, "{:<width$}  {:>7}", row.key, row.count, width = width);
    }
    out
}

fn render_ip_pages(rows: &[IpPageRow]) -> String {
    if rows.is_empty() {
        return "(no matching records)\n".to_string();
    }

    let ip_width = rows
        .iter()
        .map(|r| r.ip.len())
        .max()
        .unwrap_or(0)
        .max("ip".len());
    let request_width = rows
        .iter()
        .map(|r| r.request.len())
        .max()
        .unwrap_or(0)
        .max("request".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<ip_width$}  {:<request_width$}  {:>7}",
        "ip", "request", "count",
        ip_width = ip_width,
        request_width = request_width
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<ip_width$}  {:<request_width$}  {:>7}",
            row.ip, row.request, row.count,
            ip_width = ip_width,
            request_width = request_width
        );
    }
    out
}

fn render_minutes(rows: &[MinuteRow]) -> String {
    if rows.is_empty() {
        return "(no buckets in the requested window)\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<26}  {:>7}", "minute", "count");
    for row in rows {
        let label = row.bucket.format(BUCKET_FORMAT).to_string();
        let _ = writeln!(out, "{:<26}  {:>7}", label, row.count);
    }
    out
}
