//! Diagnostic logging setup.
//!
//! Events go to stderr so they never mix with the printed result.
//! `RUST_LOG` takes precedence over `--loglevel` when it is set.

use runline_dispatch::LogLevel;
use tracing_subscriber::EnvFilter;

/// Builds the event filter for a run.
pub fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .try_init();
}
