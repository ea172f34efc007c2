use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::EventKind;

/// Aggregate report over a sequence of parsed sshd entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub total_events: usize,

    pub dns_warning_count: usize,
    pub invalid_user_count: usize,
    pub auth_request_count: usize,
    pub pam_message_count: usize,
    pub auth_failures_count: usize,
    pub auth_success_count: usize,
    pub connection_closed_count: usize,
    pub disconnect_count: usize,
    pub repeated_message_count: usize,
    pub max_auth_failures_count: usize,
    pub no_identification_count: usize,
    pub error_message_count: usize,

    /// Distinct non-empty source IPs across all entries
    pub unique_ips: usize,
    /// `"<first> - <last>"` from the first and last entry, empty without entries
    pub time_range: String,

    /// Per-IP suspicious activity, in first-seen order
    pub anomalies: Vec<Anomaly>,
}

impl Analysis {
    /// Counter for a single event kind
    pub fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::DnsWarning => self.dns_warning_count,
            EventKind::InvalidUser => self.invalid_user_count,
            EventKind::AuthRequest => self.auth_request_count,
            EventKind::PamMessage => self.pam_message_count,
            EventKind::AuthFailure => self.auth_failures_count,
            EventKind::AuthSuccess => self.auth_success_count,
            EventKind::ConnectionClosed => self.connection_closed_count,
            EventKind::Disconnect => self.disconnect_count,
            EventKind::RepeatedMessage => self.repeated_message_count,
            EventKind::MaxAuthFailures => self.max_auth_failures_count,
            EventKind::NoIdentification => self.no_identification_count,
            EventKind::ErrorMessage => self.error_message_count,
        }
    }

    pub(crate) fn increment(&mut self, kind: EventKind) {
        let counter = match kind {
            EventKind::DnsWarning => &mut self.dns_warning_count,
            EventKind::InvalidUser => &mut self.invalid_user_count,
            EventKind::AuthRequest => &mut self.auth_request_count,
            EventKind::PamMessage => &mut self.pam_message_count,
            EventKind::AuthFailure => &mut self.auth_failures_count,
            EventKind::AuthSuccess => &mut self.auth_success_count,
            EventKind::ConnectionClosed => &mut self.connection_closed_count,
            EventKind::Disconnect => &mut self.disconnect_count,
            EventKind::RepeatedMessage => &mut self.repeated_message_count,
            EventKind::MaxAuthFailures => &mut self.max_auth_failures_count,
            EventKind::NoIdentification => &mut self.no_identification_count,
            EventKind::ErrorMessage => &mut self.error_message_count,
        };
        *counter += 1;
    }

    /// Sort anomalies by IP so the report is stable across runs
    pub fn sort_anomalies(&mut self) {
        self.anomalies.sort_by(|a, b| a.ip.cmp(&b.ip));
    }

    /// Look up the anomaly recorded for an IP (the empty string is the unknown-IP bucket)
    pub fn anomaly(&self, ip: &str) -> Option<&Anomaly> {
        self.anomalies.iter().find(|a| a.ip == ip)
    }
}

/// Suspicious activity attributed to one source IP.
///
/// The empty IP is a valid key: it collects suspicious lines that carried no address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub ip: String,
    pub pids: Vec<String>,

    pub dns_warnings_count: usize,
    pub invalid_user_count: usize,
    pub auth_failures_count: usize,
    pub repeated_message_count: usize,
    pub max_auth_failures_count: usize,
    pub no_identification_count: usize,

    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
    pub usernames: Vec<String>,
}

impl Anomaly {
    pub fn new(ip: &str, first_seen: Option<NaiveDateTime>) -> Self {
        Anomaly {
            ip: ip.to_string(),
            first_seen,
            ..Default::default()
        }
    }

    /// Bump the counter for a suspicious kind; other kinds are ignored
    pub fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::DnsWarning => self.dns_warnings_count += 1,
            EventKind::InvalidUser => self.invalid_user_count += 1,
            EventKind::AuthFailure => self.auth_failures_count += 1,
            EventKind::RepeatedMessage => self.repeated_message_count += 1,
            EventKind::MaxAuthFailures => self.max_auth_failures_count += 1,
            EventKind::NoIdentification => self.no_identification_count += 1,
            _ => {}
        }
    }

    pub fn add_pid(&mut self, pid: &str) {
        if !self.pids.iter().any(|p| p == pid) {
            self.pids.push(pid.to_string());
        }
    }

    pub fn add_username(&mut self, username: &str) {
        if !self.usernames.iter().any(|u| u == username) {
            self.usernames.push(username.to_string());
        }
    }

    /// Sum of all suspicious counters
    pub fn total_suspicious(&self) -> usize {
        self.dns_warnings_count
            + self.invalid_user_count
            + self.auth_failures_count
            + self.repeated_message_count
            + self.max_auth_failures_count
            + self.no_identification_count
    }
}
