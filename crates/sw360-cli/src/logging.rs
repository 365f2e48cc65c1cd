//! Console logging for the binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to `main`.

use tracing_subscriber::EnvFilter;

/// Install the console subscriber. `RUST_LOG` wins over `level` when set.
///
/// Diagnostics go to stderr so stdout carries only command results.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
