//! Operator-wide configuration and logging bootstrap.

use tracing_subscriber::EnvFilter;

/// Namespace restriction and safety defaults the operator reads from its
/// environment at startup.
pub struct Config {
    /// Empty means watch all namespaces.
    pub watch_namespace: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            watch_namespace: std::env::var("WATCH_NAMESPACE").unwrap_or_default(),
        }
    }
}

/// Initialize structured logging. Honors `LOG_LEVEL` (default `info`); emits
/// JSON when `LOG_FORMAT=json`, human-readable otherwise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("default log filter is valid");

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
