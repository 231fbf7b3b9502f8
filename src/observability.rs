//! Logging setup
//!
//! Library code only emits `tracing` events; binaries call
//! [`init_tracing`] once to install a subscriber.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns false if one was already set.
///
/// `RUST_LOG`, when present, takes precedence over `config.level`.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
