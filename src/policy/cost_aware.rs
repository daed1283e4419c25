use tracing::{error, warn};

use crate::crd::{CostAwareConfig, PreferredDirection};

use super::{clamp_replicas, ScalingPolicy};

const HOURS_PER_MONTH: f64 = 730.0;

/// Proportional policy that additionally biases toward a preferred
/// direction and caps the result to a monthly budget (spec §4.2).
pub struct CostAwarePolicy {
    max_monthly_cost: Option<f64>,
    cost_per_pod_per_hour: f64,
    preferred_scale_direction: PreferredDirection,
    scale_up_factor: f64,
    scale_down_factor: f64,
}

impl CostAwarePolicy {
    pub fn new(config: CostAwareConfig) -> Self {
        let (scale_up_factor, scale_down_factor) = match config.preferred_scale_direction {
            PreferredDirection::Down => (0.8, 1.2),
            PreferredDirection::Up => (1.2, 0.8),
            PreferredDirection::Balanced => (1.0, 1.0),
        };

        Self {
            max_monthly_cost: config.max_monthly_cost,
            cost_per_pod_per_hour: config.cost_per_pod_per_hour,
            preferred_scale_direction: config.preferred_scale_direction,
            scale_up_factor,
            scale_down_factor,
        }
    }

    fn monthly_cost(&self, replicas: i32) -> f64 {
        replicas as f64 * self.cost_per_pod_per_hour * HOURS_PER_MONTH
    }

    fn within_budget(&self, replicas: i32) -> bool {
        match self.max_monthly_cost {
            None => true,
            Some(budget) => self.monthly_cost(replicas) <= budget,
        }
    }
}

impl ScalingPolicy for CostAwarePolicy {
    fn validate(&self) -> Result<(), String> {
        if self.cost_per_pod_per_hour < 0.0 {
            return Err("costAware.costPerPodPerHour must be >= 0".to_string());
        }
        if let Some(budget) = self.max_monthly_cost {
            if budget < 0.0 {
                return Err("costAware.maxMonthlyCost must be >= 0".to_string());
            }
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
            warn!(current_metric_value, target_metric_value, "cost_aware_metric_non_positive");
            return current_replicas;
        }

        let ratio = current_metric_value / target_metric_value;

        let factor = if ratio > 1.0 { self.scale_up_factor } else { self.scale_down_factor };
        let base_desired = (current_replicas as f64 * ratio * factor).ceil() as i32;

        let mut desired = clamp_replicas(base_desired, min_replicas, max_replicas);

        if !self.within_budget(desired) {
            let mut found = false;
            let mut candidate = desired;
            while candidate >= min_replicas {
                if self.within_budget(candidate) {
                    warn!(
                        from = desired,
                        to = candidate,
                        projected_cost = self.monthly_cost(candidate),
                        direction = ?self.preferred_scale_direction,
                        "cost_aware_budget_constraint_applied"
                    );
                    desired = candidate;
                    found = true;
                    break;
                }
                candidate -= 1;
            }
            if !found {
                error!(
                    min_replicas,
                    direction = ?self.preferred_scale_direction,
                    "cost_aware_min_replicas_exceeds_budget"
                );
                desired = min_replicas;
            }
        }

        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(direction: PreferredDirection, cost_per_pod: f64, budget: Option<f64>) -> CostAwarePolicy {
        CostAwarePolicy::new(CostAwareConfig {
            max_monthly_cost: budget,
            cost_per_pod_per_hour: cost_per_pod,
            preferred_scale_direction: direction,
        })
    }

    #[test]
    fn test_validate_rejects_negative_cost_per_pod() {
        let p = policy(PreferredDirection::Balanced, -1.0, None);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_balanced_direction_matches_plain_proportional_scaling() {
        let p = policy(PreferredDirection::Balanced, 0.0, None);
        // ratio = 2.0, factor 1.0: ceil(2 * 2.0 * 1.0) = 4
        assert_eq!(p.calculate_desired_replicas(2, 200.0, 100.0, 1, 10), 4);
    }

    #[test]
    fn test_prefer_down_dampens_scale_up() {
        let p = policy(PreferredDirection::Down, 0.0, None);
        // ratio = 2.0, scale_up_factor 0.8: ceil(2 * 2.0 * 0.8) = 4 (rounds to 3.2 -> ceil 4)
        assert_eq!(p.calculate_desired_replicas(2, 200.0, 100.0, 1, 10), 4);
    }

    #[test]
    fn test_prefer_up_amplifies_scale_up() {
        let p = policy(PreferredDirection::Up, 0.0, None);
        // ratio = 2.0, scale_up_factor 1.2: ceil(2 * 2.0 * 1.2) = 5 (4.8 -> ceil 5)
        assert_eq!(p.calculate_desired_replicas(2, 200.0, 100.0, 1, 10), 5);
    }

    #[test]
    fn test_budget_constraint_scans_downward() {
        // cost_per_pod_per_hour = 1.0, budget = 730 * 3 = allows exactly 3 replicas
        let p = policy(PreferredDirection::Balanced, 1.0, Some(730.0 * 3.0));
        // ratio = 2.0: desired before budget = ceil(2*2*1.0) = 4, clamp to max 10 -> 4
        // 4 replicas costs 2920 > budget (2190), scan down to 3 which fits.
        assert_eq!(p.calculate_desired_replicas(2, 200.0, 100.0, 1, 10), 3);
    }

    #[test]
    fn test_budget_below_min_replicas_falls_back_to_min() {
        let p = policy(PreferredDirection::Balanced, 100.0, Some(1.0));
        assert_eq!(p.calculate_desired_replicas(2, 200.0, 100.0, 1, 10), 1);
    }

    #[test]
    fn test_non_positive_metric_returns_current_replicas() {
        let p = policy(PreferredDirection::Balanced, 0.0, None);
        assert_eq!(p.calculate_desired_replicas(4, 0.0, 100.0, 1, 10), 4);
    }
}
