use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::crd::PrometheusConfig;

use super::{FetchError, MetricProvider};

/// Metric provider backed by a Prometheus instant query (spec §4.1).
pub struct PrometheusProvider {
    config: PrometheusConfig,
    client: reqwest::Client,
}

impl PrometheusProvider {
    pub fn new(config: PrometheusConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    value: (f64, String),
}

#[async_trait]
impl MetricProvider for PrometheusProvider {
    fn validate(&self) -> Result<(), String> {
        if self.config.query.trim().is_empty() {
            return Err("prometheus query must not be empty".to_string());
        }
        if self.config.server_url.trim().is_empty() {
            return Err("prometheus serverUrl must not be empty".to_string());
        }
        Ok(())
    }

    async fn fetch(&self, deadline: Duration) -> Result<f64, FetchError> {
        let url = format!("{}/api/v1/query", self.config.server_url.trim_end_matches('/'));

        let mut request = self
            .client
            .get(&url)
            .query(&[("query", self.config.query.as_str())])
            .timeout(deadline);

        if let Some(headers) = &self.config.headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "prometheus_query_failed");
            FetchError::Unavailable
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "prometheus_query_non_success");
            return Err(FetchError::Unavailable);
        }

        let body: QueryResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "prometheus_response_parse_failed");
            FetchError::Unavailable
        })?;

        if body.status != "success" {
            warn!(status = %body.status, "prometheus_query_status_not_success");
            return Err(FetchError::Unavailable);
        }

        let result = body
            .data
            .and_then(|d| d.result.into_iter().next())
            .ok_or_else(|| {
                warn!("prometheus_query_empty_result");
                FetchError::Unavailable
            })?;

        let value: f64 = result.value.1.parse().map_err(|_| {
            warn!(raw = %result.value.1, "prometheus_value_parse_failed");
            FetchError::Unavailable
        })?;

        debug!(value, query = %self.config.query, "prometheus_metric_fetched");
        Ok(value)
    }
}
