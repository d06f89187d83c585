//! Tracing subscriber bootstrap
//!
//! Hosts embedding the subsystem usually install their own subscriber; this
//! helper exists for binaries and tests that want sane defaults.

use tracing_subscriber::EnvFilter;

/// Initialize a global tracing subscriber with env-filter support
///
/// Filter defaults to `info` for this crate and can be overridden through
/// `RUST_LOG`. Calling this twice is harmless: the second call is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("selfheal_rs=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
