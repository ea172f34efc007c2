pub mod classifier;
pub mod rules;
pub mod scanner;

pub use classifier::SshdParser;
pub use scanner::{ScanResult, SSHD_MARKER};
