use tracing::warn;

use crate::crd::SloConfig;

use super::{clamp_replicas, ScalingPolicy};

/// Default amplification applied to `current * ratio` when the metric has
/// exceeded its target (an SLO violation).
const DEFAULT_SLO_VIOLATION_MULTIPLIER: f64 = 1.5;

/// Proportional policy with extra aggression once the metric exceeds its
/// target (spec §4.2).
pub struct SloPolicy {
    slo_violation_multiplier: f64,
}

impl SloPolicy {
    pub fn new(config: SloConfig) -> Self {
        Self {
            slo_violation_multiplier: config
                .slo_violation_multiplier
                .unwrap_or(DEFAULT_SLO_VIOLATION_MULTIPLIER),
        }
    }
}

impl ScalingPolicy for SloPolicy {
    fn validate(&self) -> Result<(), String> {
        if self.slo_violation_multiplier <= 0.0 {
            return Err("sloViolationMultiplier must be > 0".to_string());
        }
        Ok(())
    }

    fn calculate_desired_replicas(
        &self,
        current_replicas: i32,
        current_metric_value: f64,
        target_metric_value: f64,
        min_replicas: i32,
        max_replicas: i32,
    ) -> i32 {
        if current_metric_value <= 0.0 || target_metric_value <= 0.0 {
            warn!(current_metric_value, target_metric_value, "slo_metric_non_positive");
            return current_replicas;
        }

        let ratio = current_metric_value / target_metric_value;

        let desired = if ratio > 1.0 {
            (current_replicas as f64 * ratio * self.slo_violation_multiplier).ceil()
        } else {
            (current_replicas as f64 * ratio).ceil()
        };

        clamp_replicas(desired as i32, min_replicas, max_replicas)
    }
}
