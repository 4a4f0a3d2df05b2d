//! Report engine
//!
//! A closed set of aggregate reports over an immutable [`RecordTable`].
//! Every report is a pure read-only function; [`run_report`] dispatches on
//! the [`ReportKind`] enum so the set of reports is checked exhaustively
//! at compile time instead of through a string-keyed branch chain.
//!
//! Ranking reports share one deterministic ordering rule: count
//! descending, ties broken by first-seen input order. Re-running any
//! report over the same table yields the same rows.

use crate::types::{RecordTable, ReportError, Timestamp};
use chrono::{FixedOffset, TimeZone};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Row budget for the page and IP ranking reports
pub const TOP_N: usize = 10;
/// Row budget per IP in the per-IP page breakdown
pub const PAGES_PER_IP: usize = 5;
/// Width of one request-volume bucket, in seconds
pub const BUCKET_SECONDS: i64 = 60;

/// The closed set of report selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    /// Top 10 requested pages by request count
    Top10Pages,
    /// Percentage of requests answered with a 2xx/3xx status
    PercOk,
    /// Percentage of requests answered with anything else
    PercBad,
    /// Top 10 requested pages among failing requests
    Top10Bad,
    /// Top 10 client addresses by request count
    Top10Ips,
    /// Top 5 pages for each of the top 10 client addresses
    TopIpsPages,
    /// Request volume per minute over the observed time range
    PerMin,
}

impl ReportKind {
    /// All report kinds, in the order their codes are documented
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Top10Pages,
        ReportKind::PercOk,
        ReportKind::PercBad,
        ReportKind::Top10Bad,
        ReportKind::Top10Ips,
        ReportKind::TopIpsPages,
        ReportKind::PerMin,
    ];

    /// The selector code as accepted on the command line
    pub fn code(&self) -> &'static str {
        match self {
            ReportKind::Top10Pages => "TOP_10_PAGES",
            ReportKind::PercOk => "PERC_OK",
            ReportKind::PercBad => "PERC_BAD",
            ReportKind::Top10Bad => "TOP_10_BAD",
            ReportKind::Top10Ips => "TOP_10_IPS",
            ReportKind::TopIpsPages => "TOP_IPS_PAGES",
            ReportKind::PerMin => "PER_MIN",
        }
    }

    /// Comma-separated list of all valid codes, for error messages
    pub fn code_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.code() == s)
            .ok_or_else(|| ReportError::UnknownReport {
                code: s.to_string(),
            })
    }
}

/// What to do when a fixed-size report cannot be filled
///
/// The original tool asserted exact row counts unconditionally, which
/// blows up on small inputs. The policy makes that behavior an explicit
/// caller choice instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizePolicy {
    /// Return `min(budget, distinct entries)` rows
    #[default]
    BestEffort,
    /// Fail with [`ReportError::InsufficientData`] when the budget cannot
    /// be met
    Strict,
}

/// Caller-supplied knobs for [`run_report`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub policy: SizePolicy,
    /// Inclusive lower bound of the PER_MIN window
    pub time_from: Option<Timestamp>,
    /// Inclusive upper bound of the PER_MIN window
    pub time_to: Option<Timestamp>,
}

/// One ranked `(key, count)` row of a grouping report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub key: String,
    pub count: u64,
}

/// One `(ip, request, count)` row of the per-IP page breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpPageRow {
    pub ip: String,
    pub request: String,
    pub count: u64,
}

/// One 60-second bucket of the request-volume report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteRow {
    /// Start of the bucket, epoch-aligned, in the table's original offset
    pub bucket: Timestamp,
    pub count: u64,
}

/// The result of one report invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    Counts(Vec<CountRow>),
    Percentage(f64),
    IpPages(Vec<IpPageRow>),
    Minutes(Vec<MinuteRow>),
}

/// Run one report over the table
pub fn run_report(
    kind: ReportKind,
    table: &RecordTable,
    options: &ReportOptions,
) -> Result<ReportOutput, ReportError> {
    log::debug!("Running report {} over {} records", kind, table.len());
    match kind {
        ReportKind::Top10Pages => Ok(ReportOutput::Counts(top_pages(table, options.policy)?)),
        ReportKind::PercOk => Ok(ReportOutput::Percentage(success_rate(table)?)),
        ReportKind::PercBad => Ok(ReportOutput::Percentage(failure_rate(table)?)),
        ReportKind::Top10Bad => Ok(ReportOutput::Counts(top_bad_pages(table, options.policy)?)),
        ReportKind::Top10Ips => Ok(ReportOutput::Counts(top_ips(table, options.policy)?)),
        ReportKind::TopIpsPages => {
            Ok(ReportOutput::IpPages(top_ips_pages(table, options.policy)?))
        }
        ReportKind::PerMin => Ok(ReportOutput::Minutes(requests_per_minute(
            table,
            options.time_from,
            options.time_to,
        )?)),
    }
}

/// 2xx and 3xx count as successful, everything else does not
fn is_success(code: u16) -> bool {
    (200..400).contains(&code)
}

/// Top 10 requested pages by request count
pub fn top_pages(
    table: &RecordTable,
    policy: SizePolicy,
) -> Result<Vec<CountRow>, ReportError> {
    let ranked = ranked_counts(table.iter().map(|r| r.request.as_str()));
    take_top(ranked, TOP_N, policy, ReportKind::Top10Pages)
}

/// Top 10 requested pages among failing requests
pub fn top_bad_pages(
    table: &RecordTable,
    policy: SizePolicy,
) -> Result<Vec<CountRow>, ReportError> {
    let ranked = ranked_counts(
        table
            .iter()
            .filter(|r| !is_success(r.response_code))
            .map(|r| r.request.as_str()),
    );
    take_top(ranked, TOP_N, policy, ReportKind::Top10Bad)
}

/// Top 10 client addresses by request count
pub fn top_ips(table: &RecordTable, policy: SizePolicy) -> Result<Vec<CountRow>, ReportError> {
    let ranked = ranked_counts(table.iter().map(|r| r.ip.as_str()));
    take_top(ranked, TOP_N, policy, ReportKind::Top10Ips)
}

/// Percentage of requests with a successful status, in [0, 100]
pub fn success_rate(table: &RecordTable) -> Result<f64, ReportError> {
    rate(table, true)
}

/// Percentage of requests with an unsuccessful status, in [0, 100]
///
/// Counted directly rather than as `100 - success_rate` so the two
/// fractions always sum to exactly 100 over the same table.
pub fn failure_rate(table: &RecordTable) -> Result<f64, ReportError> {
    rate(table, false)
}

fn rate(table: &RecordTable, success: bool) -> Result<f64, ReportError> {
    if table.is_empty() {
        let report = if success {
            ReportKind::PercOk
        } else {
            ReportKind::PercBad
        };
        return Err(ReportError::EmptyTable { report });
    }
    let matching = table
        .iter()
        .filter(|r| is_success(r.response_code) == success)
        .count();
    Ok(matching as f64 / table.len() as f64 * 100.0)
}

/// Top 5 pages for each of the top 10 client addresses
///
/// Output rows are grouped by IP in top-10 rank order; within one IP the
/// pages are ordered by count descending with the usual first-seen
/// tie-break. Under [`SizePolicy::Strict`] an IP with fewer than 5
/// distinct requests fails the whole report.
pub fn top_ips_pages(
    table: &RecordTable,
    policy: SizePolicy,
) -> Result<Vec<IpPageRow>, ReportError> {
    let leaders = top_ips(table, policy)?;

    let mut rows = Vec::new();
    for leader in &leaders {
        let ranked = ranked_counts(
            table
                .iter()
                .filter(|r| r.ip == leader.key)
                .map(|r| r.request.as_str()),
        );
        if policy == SizePolicy::Strict && ranked.len() < PAGES_PER_IP {
            return Err(ReportError::InsufficientData {
                report: ReportKind::TopIpsPages,
                needed: PAGES_PER_IP,
                available: ranked.len(),
            });
        }
        rows.extend(ranked.into_iter().take(PAGES_PER_IP).map(|row| IpPageRow {
            ip: leader.key.clone(),
            request: row.key,
            count: row.count,
        }));
    }
    Ok(rows)
}

/// Request volume per 60-second bucket
///
/// Buckets are aligned to epoch minute boundaries, not to the first
/// record. The full observed min..=max range is emitted including
/// zero-count gaps, then filtered to the inclusive caller window; a bound
/// inside a bucket keeps that bucket. Bucket identity is computed from
/// absolute time, so records with different UTC offsets land in the right
/// bucket; bucket timestamps are rendered in the offset of the table's
/// first record.
pub fn requests_per_minute(
    table: &RecordTable,
    time_from: Option<Timestamp>,
    time_to: Option<Timestamp>,
) -> Result<Vec<MinuteRow>, ReportError> {
    let first = table
        .records()
        .first()
        .ok_or(ReportError::EmptyTable {
            report: ReportKind::PerMin,
        })?;
    let offset = *first.timestamp.offset();

    let mut counts: HashMap<i64, u64> = HashMap::new();
    let mut lo = i64::MAX;
    let mut hi = i64::MIN;
    for record in table {
        let bucket = record.timestamp.timestamp().div_euclid(BUCKET_SECONDS);
        *counts.entry(bucket).or_insert(0) += 1;
        lo = lo.min(bucket);
        hi = hi.max(bucket);
    }

    // Clamp the caller window to the observed range; the report never
    // extends past the data.
    let from = time_from
        .map(|t| t.timestamp().div_euclid(BUCKET_SECONDS))
        .map_or(lo, |b| b.max(lo));
    let to = time_to
        .map(|t| t.timestamp().div_euclid(BUCKET_SECONDS))
        .map_or(hi, |b| b.min(hi));

    let mut rows = Vec::new();
    for bucket in from..=to {
        rows.push(MinuteRow {
            bucket: bucket_start(bucket, offset, first.timestamp),
            count: counts.get(&bucket).copied().unwrap_or(0),
        });
    }
    Ok(rows)
}

/// Start of a bucket as a timestamp in the given offset
fn bucket_start(bucket: i64, offset: FixedOffset, fallback: Timestamp) -> Timestamp {
    // A fixed offset maps every instant exactly once; the fallback is
    // unreachable for buckets derived from real record timestamps.
    offset
        .timestamp_opt(bucket * BUCKET_SECONDS, 0)
        .single()
        .unwrap_or(fallback)
}

/// Group keys, count occurrences and order deterministically
///
/// Ordering is count descending; ties are broken by the key's first
/// occurrence in the input, so equal inputs in a different arrival order
/// still produce the same report for distinct counts, and re-runs over
/// the same table are always identical.
fn ranked_counts<'a, I>(keys: I) -> Vec<CountRow>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    for (idx, key) in keys.enumerate() {
        let entry = counts.entry(key).or_insert((0, idx));
        entry.0 += 1;
    }

    let mut grouped: Vec<(&str, u64, usize)> = counts
        .into_iter()
        .map(|(key, (count, first_seen))| (key, count, first_seen))
        .collect();
    grouped.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    grouped
        .into_iter()
        .map(|(key, count, _)| CountRow {
            key: key.to_string(),
            count,
        })
        .collect()
}

/// Apply the fixed-size budget under the given policy
fn take_top(
    mut ranked: Vec<CountRow>,
    budget: usize,
    policy: SizePolicy,
    report: ReportKind,
) -> Result<Vec<CountRow>, ReportError> {
    if policy == SizePolicy::Strict && ranked.len() < budget {
        return Err(ReportError::InsufficientData {
            report,
            needed: budget,
            available: ranked.len(),
        });
    }
    ranked.truncate(budget);
    Ok(ranked)
}
