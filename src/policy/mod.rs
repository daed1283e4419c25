//! Scaling Policies (C2): turn a metric/target ratio into a desired replica
//! count, clamped to `[minReplicas, maxReplicas]`.

mod cost_aware;
mod slo;

pub use cost_aware::CostAwarePolicy;
pub use slo::SloPolicy;

use thiserror::Error;

use crate::crd::{PolicyKind, PolicySpec, SloConfig};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy config error: {0}")]
    ConfigError(String),
}

/// A Scaling Policy: pure arithmetic from a metric reading to a replica
/// count (spec §4.2). Implementations never consult the clock or cluster
/// state — cooldowns and rate limits are the Safety Layer's job.
pub trait ScalingPolicy: Send + Sync {
    fn validate(&self) -> Result<(), String>;

    fn calculate_desired_replicas(
        &self,
        current_replicas: i32,
        current_metric_value: f64,
        target_metric_value: f64,
        min_replicas: i32,
        max_replicas: i32,
    ) -> i32;
}

fn clamp_replicas(replicas: i32, min_replicas: i32, max_replicas: i32) -> i32 {
    replicas.max(min_replicas).min(max_replicas)
}

/// Construct the policy named by `spec.policy.type`. An unrecognized or
/// absent kind falls back to the SLO policy with default config, matching
/// `PolicySpec::default()` (spec §4.2: "a missing or unknown policy type is
/// not a registration error — it behaves as the default policy").
pub fn build_policy(policy: &PolicySpec) -> Box<dyn ScalingPolicy> {
    match policy.kind {
        PolicyKind::Slo => {
            let cfg = policy.slo.clone().unwrap_or_default();
            Box::new(SloPolicy::new(cfg))
        }
        PolicyKind::CostAware => match &policy.cost_aware {
            Some(cfg) => Box::new(CostAwarePolicy::new(cfg.clone())),
            None => Box::new(SloPolicy::new(SloConfig::default())),
        },
        PolicyKind::Unknown => Box::new(SloPolicy::new(SloConfig::default())),
    }
}
