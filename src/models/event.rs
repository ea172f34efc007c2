use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification label assigned to a recognized sshd log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DnsWarning,
    InvalidUser,
    AuthRequest,
    PamMessage,
    AuthFailure,
    AuthSuccess,
    ConnectionClosed,
    Disconnect,
    RepeatedMessage,
    MaxAuthFailures,
    NoIdentification,
    #[serde(rename = "error")]
    ErrorMessage,
}

impl EventKind {
    /// Every kind, in the order the classifier tries them
    pub const ALL: [EventKind; 12] = [
        EventKind::RepeatedMessage,
        EventKind::ErrorMessage,
        EventKind::DnsWarning,
        EventKind::InvalidUser,
        EventKind::AuthRequest,
        EventKind::PamMessage,
        EventKind::AuthFailure,
        EventKind::AuthSuccess,
        EventKind::ConnectionClosed,
        EventKind::Disconnect,
        EventKind::MaxAuthFailures,
        EventKind::NoIdentification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DnsWarning => "dns_warning",
            EventKind::InvalidUser => "invalid_user",
            EventKind::AuthRequest => "auth_request",
            EventKind::PamMessage => "pam_message",
            EventKind::AuthFailure => "auth_failure",
            EventKind::AuthSuccess => "auth_success",
            EventKind::ConnectionClosed => "connection_closed",
            EventKind::Disconnect => "disconnect",
            EventKind::RepeatedMessage => "repeated_message",
            EventKind::MaxAuthFailures => "max_auth_failures",
            EventKind::NoIdentification => "no_identification",
            EventKind::ErrorMessage => "error",
        }
    }

    /// Kinds that feed per-IP anomaly tracking
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            EventKind::DnsWarning
                | EventKind::InvalidUser
                | EventKind::AuthFailure
                | EventKind::RepeatedMessage
                | EventKind::MaxAuthFailures
                | EventKind::NoIdentification
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sshd log line after classification.
///
/// Optional fields that were not present in the message are empty strings.
/// `timestamp` is `None` when the syslog prefix could not be parsed, and
/// `event_kind` is `None` only for unrecognized lines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub hostname: String,
    pub pid: String,
    pub event_kind: Option<EventKind>,
    pub source_ip: String,
    pub username: String,
    pub port: String,
    pub raw_message: String,
}

impl LogEntry {
    /// Start an entry for a raw line with nothing extracted yet
    pub fn from_raw(line: &str) -> Self {
        LogEntry {
            raw_message: line.to_string(),
            ..Default::default()
        }
    }
}
