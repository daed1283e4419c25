use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::crd::RedisConfig;

use super::{FetchError, MetricProvider};

/// Metric provider backed by a Redis-resident queue length (spec §4.1).
///
/// The key's type is only discoverable live, so an unsupported type surfaces
/// as `FetchError::ConfigError` from `fetch`, not from `validate`.
pub struct RedisQueueProvider {
    config: RedisConfig,
    manager: Mutex<Option<ConnectionManager>>,
}

impl RedisQueueProvider {
    pub fn new(config: RedisConfig) -> Self {
        Self {
            config,
            manager: Mutex::new(None),
        }
    }

    fn connection_url(&self) -> String {
        match &self.config.password {
            Some(password) => format!(
                "redis://:{password}@{}:{}/{}",
                self.config.host, self.config.port, self.config.db
            ),
            None => format!("redis://{}:{}/{}", self.config.host, self.config.port, self.config.db),
        }
    }

    async fn connection(&self, deadline: Duration) -> Result<ConnectionManager, FetchError> {
        let mut guard = self.manager.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }
        let client = redis::Client::open(self.connection_url()).map_err(|e| {
            warn!(error = %e, "redis_client_open_failed");
            FetchError::Unavailable
        })?;
        let manager = tokio::time::timeout(deadline, client.get_connection_manager())
            .await
            .map_err(|_| {
                warn!("redis_connection_timed_out");
                FetchError::Unavailable
            })?
            .map_err(|e| {
                warn!(error = %e, "redis_connection_failed");
                FetchError::Unavailable
            })?;
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

#[async_trait]
impl MetricProvider for RedisQueueProvider {
    fn validate(&self) -> Result<(), String> {
        if self.config.queue_name.trim().is_empty() {
            return Err("redis queueName must not be empty".to_string());
        }
        if self.config.host.trim().is_empty() {
            return Err("redis host must not be empty".to_string());
        }
        Ok(())
    }

    async fn fetch(&self, deadline: Duration) -> Result<f64, FetchError> {
        let mut conn = self.connection(deadline).await?;
        let key = &self.config.queue_name;

        let key_type: String = tokio::time::timeout(deadline, redis::cmd("TYPE").arg(key).query_async(&mut conn))
            .await
            .map_err(|_| {
                warn!(queue = %key, "redis_type_query_timed_out");
                FetchError::Unavailable
            })?
            .map_err(|e| {
                warn!(error = %e, queue = %key, "redis_type_query_failed");
                FetchError::Unavailable
            })?;

        let value = match key_type.as_str() {
            "list" => {
                let len: i64 = tokio::time::timeout(deadline, conn.llen(key))
                    .await
                    .map_err(|_| FetchError::Unavailable)?
                    .map_err(|e| {
                        warn!(error = %e, queue = %key, "redis_llen_failed");
                        FetchError::Unavailable
                    })?;
                len as f64
            }
            "zset" => {
                let len: i64 = tokio::time::timeout(deadline, conn.zcard(key))
                    .await
                    .map_err(|_| FetchError::Unavailable)?
                    .map_err(|e| {
                        warn!(error = %e, queue = %key, "redis_zcard_failed");
                        FetchError::Unavailable
                    })?;
                len as f64
            }
            "none" => 0.0,
            other => {
                return Err(FetchError::ConfigError(format!(
                    "redis key '{key}' has unsupported type '{other}' (expected list or zset)"
                )));
            }
        };

        debug!(value, queue = %key, key_type = %key_type, "redis_metric_fetched");
        Ok(value)
    }

    async fn release(&self) {
        let mut guard = self.manager.lock().await;
        *guard = None;
    }
}
