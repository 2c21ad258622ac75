//! Logging setup for the sidecar.
//!
//! stdout carries the IPC protocol, so every log line goes to stderr.

use env_logger::{Builder, Env, Target};

pub const LOG_ENV: &str = "ROLLCALLD_LOG";
const DEFAULT_FILTER: &str = "info";

/// Installs the stderr logger. A second call is a no-op.
pub fn init() {
    let _ = Builder::from_env(Env::new().filter_or(LOG_ENV, DEFAULT_FILTER))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}
