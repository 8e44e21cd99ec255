//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging. `RUST_LOG` controls the filter, defaulting
/// to `info` for the service and `warn` for noisy HTTP internals.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn,hyper=warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
