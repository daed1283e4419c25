//! Resource Registry (C5): the single owner of each registered resource's
//! metric provider and scaling policy, plus its cooldown-tracking state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::crd::GeneralScalerSpec;
use crate::metrics::{build_provider, MetricProvider};
use crate::policy::{build_policy, ScalingPolicy};
use crate::safety::ScaleDirection;

type ResourceKey = (String, String);

struct ScaleState {
    last_scale_at: Option<DateTime<Utc>>,
    last_scale_direction: Option<ScaleDirection>,
}

/// Everything the Reconciler needs for one tick of one registered resource.
pub struct RegistryEntry {
    pub spec: GeneralScalerSpec,
    pub provider: Box<dyn MetricProvider>,
    pub policy: Box<dyn ScalingPolicy>,
    state: RwLock<ScaleState>,
}

impl RegistryEntry {
    fn new(spec: GeneralScalerSpec, provider: Box<dyn MetricProvider>, policy: Box<dyn ScalingPolicy>) -> Self {
        Self {
            spec,
            provider,
            policy,
            state: RwLock::new(ScaleState {
                last_scale_at: None,
                last_scale_direction: None,
            }),
        }
    }

    pub async fn last_scale_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_scale_at
    }

    pub async fn last_scale_direction(&self) -> Option<ScaleDirection> {
        self.state.read().await.last_scale_direction
    }

    /// Called by the Reconciler after a successful `setReplicas`.
    pub async fn record_scale(&self, direction: ScaleDirection, now: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.last_scale_at = Some(now);
        state.last_scale_direction = Some(direction);
    }
}

fn construct_entry(spec: GeneralScalerSpec) -> Result<RegistryEntry, String> {
    spec.validate()?;

    let provider = build_provider(&spec.metric)?;
    provider.validate()?;

    let policy = build_policy(&spec.policy);
    policy.validate()?;

    Ok(RegistryEntry::new(spec, provider, policy))
}

/// Maps `(namespace, name)` to the live `RegistryEntry` for that resource.
/// Insert/swap/delete are serialized with respect to each other and to
/// lookup via a single `RwLock`; entries themselves are `Arc`-shared so an
/// in-flight tick keeps using the entry it looked up even if the registry
/// swaps in a new one mid-tick.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: RwLock<HashMap<ResourceKey, Arc<RegistryEntry>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Option<Arc<RegistryEntry>> {
        self.entries
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Validate, construct provider + policy, and insert. On failure the
    /// registry is left untouched and the human-readable error is returned
    /// for the caller to surface as `Ready=False, InvalidSpec`.
    pub async fn on_create(&self, namespace: &str, name: &str, spec: GeneralScalerSpec) -> Result<(), String> {
        let entry = construct_entry(spec)?;
        let mut entries = self.entries.write().await;
        entries.insert((namespace.to_string(), name.to_string()), Arc::new(entry));
        Ok(())
    }

    /// Atomically construct a new entry and swap it in, releasing the
    /// displaced provider. `lastScaleAt`/`lastScaleDirection` are
    /// intentionally not carried over: a spec change resets cooldown state.
    /// On failure, the existing entry is left intact.
    pub async fn on_update(&self, namespace: &str, name: &str, spec: GeneralScalerSpec) -> Result<(), String> {
        let new_entry = construct_entry(spec)?;
        let key = (namespace.to_string(), name.to_string());

        let displaced = {
            let mut entries = self.entries.write().await;
            entries.insert(key, Arc::new(new_entry))
        };

        if let Some(old_entry) = displaced {
            old_entry.provider.release().await;
        }

        Ok(())
    }

    /// Remove the entry and release its provider.
    pub async fn on_delete(&self, namespace: &str, name: &str) {
        let key = (namespace.to_string(), name.to_string());
        let removed = self.entries.write().await.remove(&key);
        if let Some(entry) = removed {
            entry.provider.release().await;
        }
    }
}
