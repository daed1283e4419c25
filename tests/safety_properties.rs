mod common;

use chrono::{Duration, Utc};
use common::prometheus_scaler_spec;
use generalscaler::safety::decide;

// ══════════════════════════════════════════════════════════════════
// Safety layer invariants (no cluster required): I1-I7, R1-R2.
// ══════════════════════════════════════════════════════════════════

#[test]
fn test_i1_committed_target_always_within_bounds() {
    let spec = prometheus_scaler_spec(2, 8, 100.0, 0, 0);
    let decision = decide(2, 50, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(decision.target_replicas >= spec.min_replicas);
    assert!(decision.target_replicas <= spec.max_replicas);
}

#[test]
fn test_i2_scale_up_change_never_exceeds_max_increment() {
    let spec = prometheus_scaler_spec(1, 100, 100.0, 0, 0);
    let decision = decide(2, 90, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(decision.target_replicas - 2 <= spec.behavior.scale_up.max_increment as i32);
}

#[test]
fn test_i2_scale_down_change_never_exceeds_max_decrement() {
    let spec = prometheus_scaler_spec(1, 100, 100.0, 0, 0);
    let decision = decide(90, 2, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(90 - decision.target_replicas <= spec.behavior.scale_down.max_decrement as i32);
}

#[test]
fn test_i3_no_scale_commits_inside_cooldown() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    let now = Utc::now();
    let last_scale_at = now - Duration::seconds(5);
    let decision = decide(5, 8, spec.min_replicas, spec.max_replicas, &spec.behavior, Some(last_scale_at), now);
    assert!(!decision.should_act);
}

#[test]
fn test_i4_no_scale_commits_when_policy_desired_equals_current() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    let decision = decide(5, 5, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(!decision.should_act);
    assert_eq!(decision.target_replicas, 5);
}

#[test]
fn test_i6_committed_target_equals_current_when_no_action() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    let now = Utc::now();
    let last_scale_at = now - Duration::seconds(5);
    let decision = decide(5, 8, spec.min_replicas, spec.max_replicas, &spec.behavior, Some(last_scale_at), now);
    assert_eq!(decision.target_replicas, 5);
}

#[test]
fn test_r1_already_at_target_is_idempotent_no_op() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    let decision = decide(7, 7, spec.min_replicas, spec.max_replicas, &spec.behavior, None, Utc::now());
    assert!(!decision.should_act);
    assert_eq!(decision.target_replicas, 7);
}

#[test]
fn test_r2_same_inputs_yield_same_decision() {
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    let last_scale_at = Utc::now() - Duration::seconds(400);
    let now = Utc::now();

    let first = decide(5, 8, spec.min_replicas, spec.max_replicas, &spec.behavior, Some(last_scale_at), now);
    let second = decide(5, 8, spec.min_replicas, spec.max_replicas, &spec.behavior, Some(last_scale_at), now);

    assert_eq!(first, second);
}

#[test]
fn test_scenario_3_cooldown_blocks_immediately_after_a_scale() {
    // Mirrors scenario 1 followed immediately by another tick with the same
    // inputs, scaleUp cooldown=60s: the second tick must be blocked.
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    let now = Utc::now();
    let last_scale_at = now - Duration::seconds(1);

    let decision = decide(10, 12, spec.min_replicas, spec.max_replicas, &spec.behavior, Some(last_scale_at), now);

    assert!(!decision.should_act);
    assert_eq!(decision.reason, "in up cooldown");
}
