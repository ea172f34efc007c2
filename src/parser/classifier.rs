//! sshd line classifier
//!
//! Turns one syslog line into a [`LogEntry`]. The syslog prefix (timestamp,
//! host, pid) is extracted first, then the message body is run through the
//! ordered rule table in [`super::rules`].

use chrono::{Month, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::rules::RULES;
use crate::models::LogEntry;

/// Year assigned to syslog timestamps, which carry none
pub const IMPLICIT_YEAR: i32 = 0;

/// Separator between the syslog header and the sshd message body
const BODY_MARKER: &str = "]: ";

/// Classifier for OpenSSH daemon syslog lines.
///
/// Holds only precompiled matchers, so a single instance can be shared
/// freely between callers.
#[derive(Debug, Clone)]
pub struct SshdParser {
    timestamp_re: Regex,
    pid_re: Regex,
    ip_re: Regex,
    port_re: Regex,
}

impl SshdParser {
    pub fn new() -> Self {
        SshdParser {
            timestamp_re: Regex::new(r"^(\w{3})\s+([0-9]{1,2})\s+([0-9]{2}):([0-9]{2}):([0-9]{2})")
                .expect("timestamp pattern is valid"),
            pid_re: Regex::new(r"sshd\[([0-9]+)\]").expect("pid pattern is valid"),
            ip_re: Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("ip pattern is valid"),
            port_re: Regex::new(r"port ([0-9]+)").expect("port pattern is valid"),
        }
    }

    /// Classify a single line.
    ///
    /// Returns the entry together with whether a rule recognized it. An
    /// unrecognized entry still carries whatever header fields were found,
    /// but has no event kind.
    pub fn parse_line(&self, line: &str) -> (LogEntry, bool) {
        let mut entry = LogEntry::from_raw(line);

        entry.timestamp = self.parse_timestamp(line);

        if let Some(host) = line.split_whitespace().nth(3) {
            entry.hostname = host.to_string();
        }

        if let Some(caps) = self.pid_re.captures(line) {
            entry.pid = caps[1].to_string();
        }

        let message = match line.find(BODY_MARKER) {
            Some(idx) => &line[idx + BODY_MARKER.len()..],
            None => return (entry, false),
        };

        let recognized = self.classify_message(&mut entry, message);
        (entry, recognized)
    }

    fn classify_message(&self, entry: &mut LogEntry, message: &str) -> bool {
        let lower = message.to_lowercase();
        let lower = lower.as_str();

        match RULES.iter().find(|rule| (rule.matches)(message, lower)) {
            Some(rule) => {
                entry.event_kind = Some(rule.kind);
                (rule.extract)(self, message, entry);
                true
            }
            None => false,
        }
    }

    /// Parse the `Mon D HH:MM:SS` prefix; `None` if absent or out of range
    fn parse_timestamp(&self, line: &str) -> Option<NaiveDateTime> {
        let caps = self.timestamp_re.captures(line)?;
        let month: Month = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let hour: u32 = caps[3].parse().ok()?;
        let minute: u32 = caps[4].parse().ok()?;
        let second: u32 = caps[5].parse().ok()?;

        NaiveDate::from_ymd_opt(IMPLICIT_YEAR, month.number_from_month(), day)?
            .and_hms_opt(hour, minute, second)
    }

    /// First dotted-quad in the text
    pub(crate) fn first_ip<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.ip_re.find(text).map(|m| m.as_str())
    }

    /// Digits of the first `port <n>` occurrence
    pub(crate) fn port<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.port_re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl Default for SshdParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;

    fn ts(month: u32, day: u32, h: u32, m: u32, s: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(IMPLICIT_YEAR, month, day)
            .and_then(|d| d.and_hms_opt(h, m, s))
    }

    fn assert_entry(
        line: &str,
        kind: EventKind,
        pid: &str,
        ip: &str,
        user: &str,
        port: &str,
    ) -> LogEntry {
        let parser = SshdParser::new();
        let (entry, recognized) = parser.parse_line(line);
        assert!(recognized, "line should be recognized: {}", line);
        assert_eq!(entry.event_kind, Some(kind));
        assert_eq!(entry.hostname, "LabSZ");
        assert_eq!(entry.pid, pid);
        assert_eq!(entry.source_ip, ip);
        assert_eq!(entry.username, user);
        assert_eq!(entry.port, port);
        assert_eq!(entry.raw_message, line);
        entry
    }

    #[test]
    fn test_dns_warning() {
        let entry = assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: reverse mapping checking getaddrinfo for ns.marryaldkfaczcz.com [173.234.31.186] failed - POSSIBLE BREAK-IN ATTEMPT!",
            EventKind::DnsWarning, "24200", "173.234.31.186", "", "",
        );
        assert_eq!(entry.timestamp, ts(12, 10, 6, 55, 46));
    }

    #[test]
    fn test_invalid_user() {
        let entry = assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: Invalid user webmaster from 173.234.31.186",
            EventKind::InvalidUser, "24200", "173.234.31.186", "webmaster", "",
        );
        assert_eq!(entry.timestamp, ts(12, 10, 6, 55, 46));
    }

    #[test]
    fn test_auth_request_invalid_user() {
        assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: input_userauth_request: invalid user webmaster [preauth]",
            EventKind::AuthRequest, "24200", "", "webmaster", "",
        );
    }

    #[test]
    fn test_pam_message() {
        assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: pam_unix(sshd:auth): authentication failure; logname= uid=0 euid=0 tty=ssh ruser= rhost=173.234.31.186",
            EventKind::PamMessage, "24200", "173.234.31.186", "", "",
        );
    }

    #[test]
    fn test_pam_message_with_user() {
        assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: pam_unix(sshd:auth): authentication failure; logname= uid=0 euid=0 tty=ssh ruser= rhost=112.95.230.3  user=root",
            EventKind::PamMessage, "24200", "112.95.230.3", "root", "",
        );
    }

    #[test]
    fn test_pam_user_marker_at_end_of_line() {
        assert_entry(
            "Dec 10 06:55:46 LabSZ sshd[24200]: PAM service(sshd) ignoring max retries; 5 > 3 user=",
            EventKind::PamMessage, "24200", "", "", "",
        );
    }

    #[test]
    fn test_failed_password_invalid_user() {
        let entry = assert_entry(
            "Dec 10 06:55:48 LabSZ sshd[24200]: Failed password for invalid user webmaster from 173.234.31.186 port 38926 ssh2",
            EventKind::AuthFailure, "24200", "173.234.31.186", "webmaster", "38926",
        );
        assert_eq!(entry.timestamp, ts(12, 10, 6, 55, 48));
    }

    #[test]
    fn test_failed_password_valid_user() {
        assert_entry(
            "Dec 10 07:13:56 LabSZ sshd[24227]: Failed password for root from 5.36.59.76 port 42393 ssh2",
            EventKind::AuthFailure, "24227", "5.36.59.76", "root", "42393",
        );
    }

    #[test]
    fn test_failed_none() {
        assert_entry(
            "Dec 10 08:24:58 LabSZ sshd[24367]: Failed none for invalid user admin from 5.188.10.180 port 52631 ssh2",
            EventKind::AuthFailure, "24367", "5.188.10.180", "admin", "52631",
        );
    }

    #[test]
    fn test_accepted_password_and_publickey() {
        assert_entry(
            "Dec 10 08:30:00 LabSZ sshd[25000]: Accepted password for john from 192.168.1.100 port 55000 ssh2",
            EventKind::AuthSuccess, "25000", "192.168.1.100", "john", "55000",
        );
        assert_entry(
            "Dec 10 08:30:00 LabSZ sshd[25001]: Accepted publickey for alice from 10.0.0.1 port 60000 ssh2",
            EventKind::AuthSuccess, "25001", "10.0.0.1", "alice", "60000",
        );
    }

    #[test]
    fn test_connection_closed_and_disconnect() {
        assert_entry(
            "Dec 10 06:55:48 LabSZ sshd[24200]: Connection closed by 173.234.31.186 [preauth]",
            EventKind::ConnectionClosed, "24200", "173.234.31.186", "", "",
        );
        assert_entry(
            "Dec 10 07:07:45 LabSZ sshd[24206]: Received disconnect from 52.80.34.196: 11: Bye Bye [preauth]",
            EventKind::Disconnect, "24206", "52.80.34.196", "", "",
        );
    }

    #[test]
    fn test_repeated_message_wins_over_inner_failure() {
        assert_entry(
            "Dec 10 07:13:56 LabSZ sshd[24227]: message repeated 5 times: [ Failed password for root from 5.36.59.76 port 42393 ssh2]",
            EventKind::RepeatedMessage, "24227", "", "", "",
        );
    }

    #[test]
    fn test_too_many_auth_failures() {
        assert_entry(
            "Dec 10 07:13:56 LabSZ sshd[24227]: Disconnecting: Too many authentication failures for root [preauth]",
            EventKind::MaxAuthFailures, "24227", "", "root", "",
        );
    }

    #[test]
    fn test_no_identification() {
        assert_entry(
            "Dec 10 07:34:33 LabSZ sshd[24301]: Did not receive identification string from 123.235.32.19",
            EventKind::NoIdentification, "24301", "123.235.32.19", "", "",
        );
    }

    #[test]
    fn test_error_prefix_wins_over_disconnect() {
        assert_entry(
            "Dec 10 07:51:15 LabSZ sshd[24324]: error: Received disconnect from 195.154.37.122: 3: com.jcraft.jsch.JSchException: Auth fail [preauth]",
            EventKind::ErrorMessage, "24324", "195.154.37.122", "", "",
        );
    }

    #[test]
    fn test_unrecognized_message() {
        let parser = SshdParser::new();
        let (entry, recognized) =
            parser.parse_line("Dec 10 08:00:00 LabSZ sshd[30000]: Some unknown message format");
        assert!(!recognized);
        assert!(entry.event_kind.is_none());
        assert_eq!(entry.pid, "30000");
    }

    #[test]
    fn test_missing_body_marker() {
        let parser = SshdParser::new();
        let (entry, recognized) = parser.parse_line("Dec 10 08:00:00 LabSZ sshd Invalid user x from 1.2.3.4");
        assert!(!recognized);
        assert!(entry.event_kind.is_none());
        assert_eq!(entry.source_ip, "");
        assert_eq!(entry.pid, "");
        assert_eq!(entry.hostname, "LabSZ");
    }

    #[test]
    fn test_short_line_has_no_hostname_or_pid() {
        let parser = SshdParser::new();
        let (entry, recognized) = parser.parse_line("sshd: Connection closed");
        assert!(!recognized);
        assert_eq!(entry.hostname, "");
        assert_eq!(entry.pid, "");
        assert!(entry.timestamp.is_none());
        assert_eq!(entry.raw_message, "sshd: Connection closed");
    }

    #[test]
    fn test_non_ascii_digits_are_not_extracted() {
        let parser = SshdParser::new();
        let (entry, recognized) = parser
            .parse_line("Dec 10 06:55:48 LabSZ sshd[٢٤٢]: Connection closed by ١٧٣.٢.٣.٤ [preauth]");
        assert!(recognized);
        assert_eq!(entry.event_kind, Some(EventKind::ConnectionClosed));
        assert_eq!(entry.pid, "");
        assert_eq!(entry.source_ip, "");

        let (entry, _) = parser.parse_line(
            "Dec 10 06:55:48 LabSZ sshd[1]: Failed password for root from 5.6.7.8 port ٣٨٩٢٦ ssh2",
        );
        assert_eq!(entry.port, "");
        assert_eq!(entry.source_ip, "5.6.7.8");

        let (entry, _) = parser.parse_line("Dec ١٠ 06:55:48 LabSZ sshd[1]: Connection closed by 5.6.7.8");
        assert!(entry.timestamp.is_none());
    }

    #[test]
    fn test_bad_timestamp_still_recognized() {
        let parser = SshdParser::new();
        let (entry, recognized) =
            parser.parse_line("Foo 99 06:55:46 LabSZ sshd[24200]: Invalid user bob from 1.2.3.4");
        assert!(recognized);
        assert!(entry.timestamp.is_none());
        assert_eq!(entry.username, "bob");
    }

    #[test]
    fn test_space_padded_day() {
        let parser = SshdParser::new();
        let (entry, _) = parser.parse_line("Jan  3 01:02:03 host sshd[7]: Connection closed by 9.9.9.9");
        assert_eq!(entry.timestamp, ts(1, 3, 1, 2, 3));
        assert_eq!(entry.hostname, "host");
    }

    #[test]
    fn test_classification_is_pure() {
        let parser = SshdParser::new();
        let line = "Dec 10 06:55:48 LabSZ sshd[24200]: Failed password for invalid user webmaster from 173.234.31.186 port 38926 ssh2";
        assert_eq!(parser.parse_line(line), parser.parse_line(line));
        assert_eq!(SshdParser::new().parse_line(line), parser.parse_line(line));
    }
}
