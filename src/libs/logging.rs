//! Structured logging setup.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "JIRA_KPI_LOG";
pub const DEFAULT_LEVEL: &str = "warn";

/// Installs the global subscriber. The filter comes from `RUST_LOG`, then
/// `JIRA_KPI_LOG`, then `default_level`. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).try_init();
}
