//! Logging setup.
//!
//! The harness logs through `tracing`; this module installs a
//! `tracing-subscriber` formatter for test binaries and runners.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "stackcheck=info";

/// Builds the filter, preferring `RUST_LOG` over `default_filter`.
#[must_use]
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs a global subscriber.
///
/// Returns false if a subscriber was already installed, which is common
/// when several tests share a process.
pub fn init_tracing(format: LogFormat, default_filter: &str) -> bool {
    let filter = env_filter(default_filter);
    let result = match format {
        LogFormat::Plain => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_test_writer()
            .try_init(),
    };
    result.is_ok()
}
