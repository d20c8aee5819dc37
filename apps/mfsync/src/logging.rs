//! Tracing subscriber setup
//!
//! Library crates emit `tracing` events; this is the only place a
//! subscriber is installed. Output goes to stderr so stdout stays clean.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Set to `json` for one JSON object per log line
pub const LOG_FORMAT_ENV: &str = "MFSYNC_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(std::io::stderr().is_terminal()).init();
    }
}
