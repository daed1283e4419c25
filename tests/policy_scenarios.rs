mod common;

use chrono::Utc;
use common::{cost_aware_scaler_spec, prometheus_scaler_spec};
use generalscaler::policy::build_policy;
use generalscaler::safety::decide;

// ══════════════════════════════════════════════════════════════════
// End-to-end policy+safety scenarios (no cluster required).
// ══════════════════════════════════════════════════════════════════

#[test]
fn test_scenario_1_proportional_scale_up_slo() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    let policy = build_policy(&spec.policy);

    // current=5, metric=150, target=100 -> ratio 1.5, violation branch:
    // ceil(5 * 1.5 * 1.5) = 12
    let policy_desired = policy.calculate_desired_replicas(5, 150.0, 100.0, spec.min_replicas, spec.max_replicas);
    assert_eq!(policy_desired, 12);

    // Default maxIncrement=5 caps the commit to 10.
    let decision = decide(5, policy_desired, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(decision.should_act);
    assert_eq!(decision.target_replicas, 10);
}

#[test]
fn test_scenario_2_scale_down_clamped_by_min() {
    let spec = prometheus_scaler_spec(2, 20, 100.0, 0, 0);
    let policy = build_policy(&spec.policy);

    // current=5, metric=1, target=100 -> ratio 0.01, ceil(5*0.01)=1, clamp to min 2.
    let policy_desired = policy.calculate_desired_replicas(5, 1.0, 100.0, spec.min_replicas, spec.max_replicas);
    assert_eq!(policy_desired, 2);

    // maxDecrement=2 caps the commit from 5 to 3.
    let decision = decide(5, policy_desired, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(decision.should_act);
    assert_eq!(decision.target_replicas, 3);
}

#[test]
fn test_scenario_4_cost_cap_limits_below_policy_desired() {
    // budget=$100/mo at $0.10/pod-hr -> max affordable = floor(100 / (0.10*730)) = 1.
    let spec = cost_aware_scaler_spec(100.0, 0.10);
    let policy = build_policy(&spec.policy);

    let policy_desired = policy.calculate_desired_replicas(5, 200.0, 100.0, spec.min_replicas, spec.max_replicas);
    assert_eq!(policy_desired, 1);
}

#[test]
fn test_scenario_4_cost_cap_with_min_above_budget_returns_min() {
    let mut spec = cost_aware_scaler_spec(100.0, 0.10);
    spec.min_replicas = 2;
    let policy = build_policy(&spec.policy);

    let policy_desired = policy.calculate_desired_replicas(5, 200.0, 100.0, spec.min_replicas, spec.max_replicas);
    assert_eq!(policy_desired, 2);
}

#[test]
fn test_scenario_6_redis_none_key_type_reports_zero_and_scales_down() {
    // The redis provider reporting 0 for a `none`-typed key is exercised
    // directly at the provider layer (see metrics::redis_queue tests); this
    // confirms the policy layer correctly scales down in response to a
    // reported-zero metric.
    let spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    let policy = build_policy(&spec.policy);

    let policy_desired = policy.calculate_desired_replicas(5, 0.0, 100.0, spec.min_replicas, spec.max_replicas);
    // metric <= 0 => policy returns current, per I7.
    assert_eq!(policy_desired, 5);
}
