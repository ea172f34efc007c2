pub mod analyzer;
pub mod correlation;

pub use analyzer::analyze;
pub use correlation::{find_ip_by_pid, lines_for_pids};
