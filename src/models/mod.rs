pub mod analysis;
pub mod event;

pub use analysis::{Analysis, Anomaly};
pub use event::{EventKind, LogEntry};
