//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

/// Install a global `fmt` subscriber filtered by `TRELLIS_LOG`
/// (falls back to `info`). Returns false if a subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Like [`init_tracing`] but with an explicit filter directive, e.g.
/// `"trellis_engine=debug"`, writing through the test harness.
pub fn init_tracing_with(directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_test_writer()
        .try_init()
        .is_ok()
}
