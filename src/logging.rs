//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber on stderr.
///
/// Respects `RUST_LOG`; falls back to `default_filter` when unset. The
/// interactive form passes `"off"` so log lines do not tear the screen.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
