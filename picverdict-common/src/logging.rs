//! Tracing subscriber initialization
//!
//! **[PV-LOG-010]** Structured logging via `tracing`. Callers (test
//! harnesses, embedding applications) invoke `init()` once at startup;
//! repeated calls are ignored.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filter level comes from `RUST_LOG`, defaulting to `info`. Safe to call
/// more than once; subsequent calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
