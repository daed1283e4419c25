use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::crd::PubSubConfig;

use super::{FetchError, MetricProvider};

/// Metric provider for a Pub/Sub subscription backlog.
///
/// No backlog-depth API is wired up: rather than report a placeholder zero
/// (which would read as "backlog is empty" to the Safety Layer and could
/// mask real load), this provider declares itself unavailable on every
/// fetch and logs why, so a scaler bound to this metric simply never sees
/// a value from it until monitoring-API support is added.
pub struct PubSubBacklogProvider {
    config: PubSubConfig,
}

impl PubSubBacklogProvider {
    pub fn new(config: PubSubConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MetricProvider for PubSubBacklogProvider {
    fn validate(&self) -> Result<(), String> {
        if self.config.project_id.trim().is_empty() {
            return Err("pubsub projectId must not be empty".to_string());
        }
        if self.config.subscription_id.trim().is_empty() {
            return Err("pubsub subscriptionId must not be empty".to_string());
        }
        Ok(())
    }

    async fn fetch(&self, _deadline: Duration) -> Result<f64, FetchError> {
        warn!(
            project_id = %self.config.project_id,
            subscription_id = %self.config.subscription_id,
            "pubsub_backlog_metric_has_no_monitoring_api_integration"
        );
        Err(FetchError::Unavailable)
    }
}
