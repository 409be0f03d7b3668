//! Logging setup utilities for applications embedding the engine.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level can be overridden per target through the `RUST_LOG`
/// environment variable. Call this once, from the embedding binary.
///
/// # Arguments
///
/// * `default_log_level` - The default log level (e.g. "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use blindtest::common::logger::setup_logger;
///
/// setup_logger("info");
/// ```
pub fn setup_logger(default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={}",
                    env!("CARGO_PKG_NAME").replace("-", "_"),
                    default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
