//! Whole-file scanning
//!
//! Splits a log buffer into lines, drops anything that is obviously not an
//! sshd line, and classifies the rest.

use serde::{Deserialize, Serialize};

use super::classifier::SshdParser;
use crate::models::LogEntry;

/// Substring every candidate line must contain before classification runs
pub const SSHD_MARKER: &str = "sshd";

/// Result of scanning a log buffer, both lists in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub parsed: Vec<LogEntry>,
    pub unparsed: Vec<String>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty() && self.unparsed.is_empty()
    }
}

impl SshdParser {
    /// Classify every sshd line in `content`.
    ///
    /// Blank lines and lines without the `sshd` marker are skipped silently.
    /// Recognized lines land in `parsed`, the others (trimmed) in `unparsed`.
    pub fn parse_file(&self, content: &[u8]) -> ScanResult {
        let text = String::from_utf8_lossy(content);
        let mut result = ScanResult::default();
        let mut skipped = 0usize;

        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if !line.contains(SSHD_MARKER) {
                skipped += 1;
                continue;
            }

            let (entry, recognized) = self.parse_line(line);
            if recognized {
                result.parsed.push(entry);
            } else {
                log::trace!("Unrecognized sshd line: {}", line);
                result.unparsed.push(line.to_string());
            }
        }

        log::debug!(
            "Scanned log buffer: {} parsed, {} unparsed, {} non-sshd lines skipped",
            result.parsed.len(),
            result.unparsed.len(),
            skipped
        );

        result
    }
}
