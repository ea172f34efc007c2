//! Aggregation and anomaly tracking over parsed sshd entries
//!
//! A single forward pass counts every event kind, tracks distinct source
//! IPs and builds one [`Anomaly`] per source IP that produced suspicious
//! activity. Lines without an address share the empty-IP anomaly.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};

use super::correlation::find_ip_by_pid;
use crate::models::{Analysis, Anomaly, EventKind, LogEntry};

/// Format used for both ends of the analysis time range
const TIME_RANGE_FORMAT: &str = "%b %-d %H:%M";

/// Anomalies kept in first-seen order with an IP index
#[derive(Debug, Default)]
struct AnomalyTable {
    records: Vec<Anomaly>,
    index: HashMap<String, usize>,
}

impl AnomalyTable {
    /// Fetch the anomaly for `ip`, creating it with `first_seen` if new
    fn get_or_insert(&mut self, ip: &str, first_seen: Option<NaiveDateTime>) -> &mut Anomaly {
        let idx = match self.index.get(ip) {
            Some(&idx) => idx,
            None => {
                self.records.push(Anomaly::new(ip, first_seen));
                let idx = self.records.len() - 1;
                self.index.insert(ip.to_string(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    fn into_records(self) -> Vec<Anomaly> {
        self.records
    }
}

/// Build the analysis report for `entries`.
///
/// Entries without an event kind still count toward `total_events` and
/// `unique_ips`, but touch no per-kind counter or anomaly.
pub fn analyze(entries: &[LogEntry]) -> Analysis {
    let mut analysis = Analysis::default();
    let mut unique_ips: HashSet<&str> = HashSet::new();
    let mut anomalies = AnomalyTable::default();

    for entry in entries {
        analysis.total_events += 1;

        if !entry.source_ip.is_empty() {
            unique_ips.insert(entry.source_ip.as_str());
        }

        let kind = match entry.event_kind {
            Some(kind) => kind,
            None => continue,
        };
        analysis.increment(kind);

        if !kind.is_suspicious() {
            continue;
        }

        let anomaly = anomalies.get_or_insert(&entry.source_ip, entry.timestamp);
        anomaly.last_seen = entry.timestamp;
        anomaly.add_pid(&entry.pid);
        anomaly.add_username(&entry.username);
        anomaly.record(kind);

        if kind == EventKind::MaxAuthFailures {
            correlate_max_auth_failures(entries, entry, &mut anomalies);
        }
    }

    analysis.unique_ips = unique_ips.len();
    analysis.time_range = time_range(entries);
    analysis.anomalies = anomalies.into_records();

    log::debug!(
        "Analyzed {} event(s): {} unique IP(s), {} anomaly record(s)",
        analysis.total_events,
        analysis.unique_ips,
        analysis.anomalies.len()
    );

    analysis
}

/// Credit a "too many authentication failures" line to the address of its connection.
///
/// The line itself carries no IP, so it has already been counted against
/// its own (usually empty) source IP. Any other entry with the same PID
/// and an address names the attacking host, whose anomaly is counted too.
fn correlate_max_auth_failures(entries: &[LogEntry], entry: &LogEntry, anomalies: &mut AnomalyTable) {
    let ip = match find_ip_by_pid(entries, &entry.pid) {
        Some(ip) => ip,
        None => return,
    };

    let anomaly = anomalies.get_or_insert(ip, entry.timestamp);
    anomaly.max_auth_failures_count += 1;
    // Deduplicated like every other PID update, not appended only when already listed (see DESIGN.md).
    anomaly.add_pid(&entry.pid);
}

/// `"<first> - <last>"` over input order, empty without entries
fn time_range(entries: &[LogEntry]) -> String {
    match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => format!(
            "{} - {}",
            format_timestamp(first.timestamp),
            format_timestamp(last.timestamp)
        ),
        _ => String::new(),
    }
}

/// Missing timestamps render as the zero instant, January 1st at midnight
fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .or_else(zero_timestamp)
        .map(|ts| ts.format(TIME_RANGE_FORMAT).to_string())
        .unwrap_or_default()
}

fn zero_timestamp() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(crate::parser::classifier::IMPLICIT_YEAR, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
