//! Workload Adapter (C4): read and write a target Deployment's replica count.

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use thiserror::Error;
use tracing::info;

const FIELD_MANAGER: &str = "generalscaler-controller";

#[derive(Debug, Error)]
pub enum WorkloadReadError {
    #[error("deployment not found")]
    NotFound,
    #[error("workload read error: {0}")]
    Other(#[from] kube::Error),
}

#[derive(Debug, Error)]
pub enum WorkloadWriteError {
    #[error("workload write error: {0}")]
    Other(#[from] kube::Error),
}

/// Talks to the `apps/v1` Deployment API for the replica-count reads/writes
/// the Reconciler needs each tick.
pub struct WorkloadAdapter {
    client: Client,
}

impl WorkloadAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Read `.spec.replicas`, treating an absent value as `1` (the
    /// Kubernetes API's own default for a Deployment with no replica count
    /// set).
    pub async fn read_replicas(&self, namespace: &str, name: &str) -> Result<i32, WorkloadReadError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(deployment) => Ok(deployment
                .spec
                .and_then(|spec| spec.replicas)
                .unwrap_or(1)),
            Err(kube::Error::Api(e)) if e.code == 404 => Err(WorkloadReadError::NotFound),
            Err(e) => Err(WorkloadReadError::Other(e)),
        }
    }

    /// Patch `.spec.replicas` to `target`. Idempotent: if the deployment
    /// already reports `target` replicas, this is a no-op.
    pub async fn set_replicas(&self, namespace: &str, name: &str, target: i32) -> Result<(), WorkloadWriteError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        if let Ok(deployment) = api.get(name).await {
            let current = deployment.spec.and_then(|spec| spec.replicas).unwrap_or(1);
            if current == target {
                return Ok(());
            }
        }

        let patch = serde_json::json!({
            "spec": {
                "replicas": target
            }
        });

        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;

        info!(namespace, name, target, "deployment_replicas_patched");
        Ok(())
    }
}
