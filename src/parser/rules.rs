//! Ordered message-body rules.
//!
//! The first rule whose predicate matches decides the event kind. Several
//! patterns overlap (a repeated "Failed password" line, an `error:` line
//! that mentions a disconnect), so the table order is part of the behavior.

use super::classifier::SshdParser;
use crate::models::{EventKind, LogEntry};

/// A (predicate, extractor) pair for one event kind
pub struct Rule {
    pub kind: EventKind,
    /// Receives the message body and its lowercase form
    pub matches: fn(&str, &str) -> bool,
    pub extract: fn(&SshdParser, &str, &mut LogEntry),
}

pub const RULES: &[Rule] = &[
    Rule {
        kind: EventKind::RepeatedMessage,
        matches: is_repeated,
        extract: extract_nothing,
    },
    Rule {
        kind: EventKind::ErrorMessage,
        matches: is_error,
        extract: extract_first_ip,
    },
    Rule {
        kind: EventKind::DnsWarning,
        matches: is_dns_warning,
        extract: extract_first_ip,
    },
    Rule {
        kind: EventKind::InvalidUser,
        matches: is_invalid_user,
        extract: extract_invalid_user,
    },
    Rule {
        kind: EventKind::AuthRequest,
        matches: is_auth_request,
        extract: extract_auth_request,
    },
    Rule {
        kind: EventKind::PamMessage,
        matches: is_pam,
        extract: extract_pam,
    },
    Rule {
        kind: EventKind::AuthFailure,
        matches: is_auth_failure,
        extract: extract_auth_failure,
    },
    Rule {
        kind: EventKind::AuthSuccess,
        matches: is_auth_success,
        extract: extract_auth_success,
    },
    Rule {
        kind: EventKind::ConnectionClosed,
        matches: is_connection_closed,
        extract: extract_first_ip,
    },
    Rule {
        kind: EventKind::Disconnect,
        matches: is_disconnect,
        extract: extract_first_ip,
    },
    Rule {
        kind: EventKind::MaxAuthFailures,
        matches: is_max_auth_failures,
        extract: extract_max_auth_failures,
    },
    Rule {
        kind: EventKind::NoIdentification,
        matches: is_no_identification,
        extract: extract_first_ip,
    },
];

// =====================
// Predicates
// =====================

fn is_repeated(message: &str, _lower: &str) -> bool {
    message.contains("message repeated")
}

fn is_error(_message: &str, lower: &str) -> bool {
    lower.starts_with("error:")
}

fn is_dns_warning(message: &str, _lower: &str) -> bool {
    message.contains("POSSIBLE BREAK-IN ATTEMPT") || message.contains("reverse mapping checking")
}

fn is_invalid_user(message: &str, _lower: &str) -> bool {
    message.contains("Invalid user")
}

fn is_auth_request(message: &str, _lower: &str) -> bool {
    message.contains("input_userauth_request")
}

fn is_pam(message: &str, _lower: &str) -> bool {
    message.contains("pam_unix") || message.starts_with("PAM")
}

fn is_auth_failure(message: &str, _lower: &str) -> bool {
    message.contains("Failed password") || message.contains("Failed none")
}

fn is_auth_success(message: &str, _lower: &str) -> bool {
    message.contains("Accepted password") || message.contains("Accepted publickey")
}

fn is_connection_closed(message: &str, _lower: &str) -> bool {
    message.contains("Connection closed")
}

fn is_disconnect(message: &str, _lower: &str) -> bool {
    message.contains("Received disconnect")
}

fn is_max_auth_failures(_message: &str, lower: &str) -> bool {
    lower.contains("too many authentication failures")
}

fn is_no_identification(message: &str, _lower: &str) -> bool {
    message.contains("Did not receive identification string")
}

// =====================
// Extractors
// =====================

fn extract_nothing(_parser: &SshdParser, _message: &str, _entry: &mut LogEntry) {}

fn extract_first_ip(parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    if let Some(ip) = parser.first_ip(message) {
        entry.source_ip = ip.to_string();
    }
}

fn extract_port(parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    if let Some(port) = parser.port(message) {
        entry.port = port.to_string();
    }
}

/// Token following the last occurrence of `keyword`
fn last_token_after<'a>(tokens: &[&'a str], keyword: &str) -> Option<&'a str> {
    tokens
        .windows(2)
        .filter(|pair| pair[0] == keyword)
        .last()
        .map(|pair| pair[1])
}

fn extract_invalid_user(_parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if let Some(user) = last_token_after(&tokens, "user") {
        entry.username = user.to_string();
    }
    if let Some(ip) = last_token_after(&tokens, "from") {
        entry.source_ip = ip.to_string();
    }
}

fn extract_auth_request(_parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    if !message.contains("invalid user") {
        return;
    }
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if let Some(pair) = tokens.windows(2).find(|pair| pair[0] == "user") {
        entry.username = pair[1].to_string();
    }
}

fn extract_pam(parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    extract_first_ip(parser, message, entry);

    const USER_MARKER: &str = " user=";
    if let Some(idx) = message.find(USER_MARKER) {
        if let Some(user) = message[idx + USER_MARKER.len()..].split_whitespace().next() {
            entry.username = user.trim_end().to_string();
        }
    }
}

/// `for <user> ... from <ip>` scan shared by failures and successes.
///
/// With `skip_invalid`, `for invalid user <name>` yields `<name>`.
fn extract_login(tokens: &[&str], entry: &mut LogEntry, skip_invalid: bool) {
    for (i, token) in tokens.iter().enumerate() {
        let next = match tokens.get(i + 1) {
            Some(next) => *next,
            None => continue,
        };
        match *token {
            "for" => {
                entry.username = match tokens.get(i + 3) {
                    Some(user) if skip_invalid && next == "invalid" => user.to_string(),
                    _ => next.to_string(),
                };
            }
            "from" => entry.source_ip = next.to_string(),
            _ => {}
        }
    }
}

fn extract_auth_failure(parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    extract_login(&tokens, entry, true);
    extract_port(parser, message, entry);
}

fn extract_auth_success(parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    extract_login(&tokens, entry, false);
    extract_port(parser, message, entry);
}

fn extract_max_auth_failures(_parser: &SshdParser, message: &str, entry: &mut LogEntry) {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if let Some(user) = last_token_after(&tokens, "for") {
        entry.username = user.to_string();
    }
}
