//! Structured logging with tracing.
//!
//! Thread names are part of the format on purpose: the pipeline runs a
//! capture thread, a dispatcher, and N workers, and log lines are close to
//! useless without knowing which one spoke.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Call once at
/// process start.
pub fn init() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();
}
