use crate::models::{Analysis, Anomaly, EventKind};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What gets written for one analyzed log file
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub analysis: &'a Analysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unparsed_lines: Option<&'a [String]>,
}

/// Output handler for analysis reports
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Jsonl, // Default
        }
    }
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, OutputError> {
        let writer: Option<Box<dyn Write + Send>> = match (&format, file_path) {
            (OutputFormat::Console, _) => None,
            (_, Some(path)) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            (_, None) => None,
        };

        Ok(OutputHandler { format, writer })
    }

    /// Build a handler around an arbitrary writer
    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler {
            format,
            writer: Some(writer),
        }
    }

    /// Write one report
    pub fn write_report(&mut self, report: &Report<'_>) -> Result<(), OutputError> {
        let output = match &self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(report)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(report)?),
            OutputFormat::Console => render_console(report),
        };
        self.write_output(&output)
    }

    fn write_output(&mut self, data: &str) -> Result<(), OutputError> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = std::io::stdout();
                stdout.write_all(data.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

fn render_console(report: &Report<'_>) -> String {
    let analysis = report.analysis;
    let mut out = String::new();

    out.push_str(&format!(
        "Events: {}  Unique IPs: {}  Time range: {}\n",
        analysis.total_events,
        analysis.unique_ips,
        if analysis.time_range.is_empty() { "-" } else { analysis.time_range.as_str() }
    ));

    for kind in EventKind::ALL {
        let count = analysis.count(kind);
        if count > 0 {
            out.push_str(&format!("  {:<18} {}\n", kind.as_str(), count));
        }
    }

    if !analysis.anomalies.is_empty() {
        out.push_str(&format!("Anomalies ({}):\n", analysis.anomalies.len()));
    }
    for anomaly in ranked_anomalies(analysis) {
        let ip = if anomaly.ip.is_empty() { "<unknown>" } else { anomaly.ip.as_str() };
        out.push_str(&format!(
            "  [{}] dns={} invalid_user={} auth_failures={} repeated={} max_auth={} no_ident={} pids={} users={}\n",
            ip,
            anomaly.dns_warnings_count,
            anomaly.invalid_user_count,
            anomaly.auth_failures_count,
            anomaly.repeated_message_count,
            anomaly.max_auth_failures_count,
            anomaly.no_identification_count,
            anomaly.pids.join(","),
            anomaly.usernames.join(","),
        ));
    }

    if let Some(lines) = report.unparsed_lines {
        out.push_str(&format!("Unparsed lines ({}):\n", lines.len()));
        for line in lines {
            out.push_str(&format!("  {}\n", line));
        }
    }

    out
}

/// Most suspicious first, ties broken by IP
fn ranked_anomalies(analysis: &Analysis) -> Vec<&Anomaly> {
    let mut ranked: Vec<&Anomaly> = analysis.anomalies.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_suspicious()
            .cmp(&a.total_suspicious())
            .then_with(|| a.ip.cmp(&b.ip))
    });
    ranked
}
