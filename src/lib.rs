pub mod config;
pub mod detection;
pub mod input;
pub mod models;
pub mod output;
pub mod parser;

// Re-export commonly used types
pub use models::{Analysis, Anomaly, EventKind, LogEntry};
pub use parser::{ScanResult, SshdParser};
pub use detection::{analyze, lines_for_pids};
pub use input::LogFile;
pub use output::{OutputFormat, OutputHandler, Report};
