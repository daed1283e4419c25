//! Metric Providers (C1): fetch a scalar metric from a pluggable source with
//! bounded time and graceful degradation.

mod prometheus;
mod pubsub;
mod redis_queue;

pub use prometheus::PrometheusProvider;
pub use pubsub::PubSubBacklogProvider;
pub use redis_queue::RedisQueueProvider;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::crd::{MetricKind, MetricSpec};

/// Why a tick's metric fetch produced no usable value.
///
/// `Unavailable` is the *soft* failure spec §4.1/§7 describes: the Reconciler
/// treats it as "this tick has no data" and retains current replicas.
/// `ConfigError` is the provider discovering, only once it talks to its
/// backend, that its configuration cannot actually be served (e.g. a Redis
/// key of an unsupported type) — still a tick-scoped soft failure per spec
/// §4.1, not a registration-time rejection, since the condition is only
/// observable live.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("metric unavailable this tick")]
    Unavailable,
    #[error("metric provider config error: {0}")]
    ConfigError(String),
}

/// A Metric Provider: polymorphic over `validate()` and `fetch(deadline)`
/// (spec §4.1).
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Synchronous config validation, run once at registration time.
    fn validate(&self) -> Result<(), String>;

    /// Fetch the current metric value, bounded by `deadline`. Returns a
    /// non-negative real, or `FetchError` if this tick has no data.
    async fn fetch(&self, deadline: Duration) -> Result<f64, FetchError>;

    /// Release owned connections/sessions. Called by the registry when this
    /// provider is retired (spec config change or resource deletion).
    async fn release(&self) {}
}

/// Bound on a single metric fetch (spec §4.6, §5).
pub const METRIC_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Construct the provider named by `spec.metric.type`, wiring in that
/// variant's own config block. Returns a human-readable error if the kind's
/// config block is missing or malformed — a registration-time rejection
/// (`InvalidSpec`), per spec §4.5/§9 ("decode into typed structs ... reject
/// unknown required keys there, not at tick time").
pub fn build_provider(metric: &MetricSpec) -> Result<Box<dyn MetricProvider>, String> {
    match metric.kind {
        MetricKind::Prometheus => {
            let cfg = metric
                .prometheus
                .clone()
                .ok_or_else(|| "metric.prometheus config block is required".to_string())?;
            Ok(Box::new(PrometheusProvider::new(cfg)))
        }
        MetricKind::Redis => {
            let cfg = metric
                .redis
                .clone()
                .ok_or_else(|| "metric.redis config block is required".to_string())?;
            Ok(Box::new(RedisQueueProvider::new(cfg)))
        }
        MetricKind::Pubsub => {
            let cfg = metric
                .pubsub
                .clone()
                .ok_or_else(|| "metric.pubsub config block is required".to_string())?;
            Ok(Box::new(PubSubBacklogProvider::new(cfg)))
        }
    }
}
