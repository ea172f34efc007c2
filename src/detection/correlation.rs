//! PID-based correlation
//!
//! sshd logs every line of a connection under the same `sshd[<pid>]`
//! marker, so the PID links lines that carry an address to lines that
//! don't.

use std::collections::HashSet;

use crate::models::LogEntry;

/// Source IP of the first entry with this PID that carries one
pub fn find_ip_by_pid<'a>(entries: &'a [LogEntry], pid: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| e.pid == pid && !e.source_ip.is_empty())
        .map(|e| e.source_ip.as_str())
}

/// Collect every line of a log buffer that belongs to one of `pids`.
///
/// A line matches when it contains the literal `sshd[<pid>]`. Lines are
/// trimmed, blank lines are skipped, and input order is kept.
pub fn lines_for_pids(content: &[u8], pids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let markers: Vec<String> = pids
        .iter()
        .filter(|pid| seen.insert(pid.as_str()))
        .map(|pid| format!("sshd[{}]", pid))
        .collect();

    if markers.is_empty() {
        return Vec::new();
    }

    let text = String::from_utf8_lossy(content);
    let lines: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| markers.iter().any(|m| line.contains(m.as_str())))
        .map(str::to_string)
        .collect();

    log::debug!("Matched {} line(s) for {} pid(s)", lines.len(), markers.len());
    lines
}
