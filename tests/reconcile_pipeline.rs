mod common;

use chrono::Utc;
use common::prometheus_scaler_spec;
use generalscaler::registry::ResourceRegistry;
use generalscaler::safety::decide;

// ══════════════════════════════════════════════════════════════════
// Full-tick pipeline simulation (no cluster required).
//
// Exercises registry registration + policy compute + safety decision in
// sequence, the same shape as a Reconciler tick minus the Deployment
// read/write, which requires a live API server.
// ══════════════════════════════════════════════════════════════════

async fn simulate_tick(registry: &ResourceRegistry, namespace: &str, name: &str, current_replicas: i32, metric_value: f64) -> (i32, bool) {
    let entry = registry.get(namespace, name).await.expect("resource registered");

    let policy_desired = entry.policy.calculate_desired_replicas(
        current_replicas,
        metric_value,
        entry.spec.metric.target_value,
        entry.spec.min_replicas,
        entry.spec.max_replicas,
    );

    let last_scale_at = entry.last_scale_at().await;
    let now = Utc::now();
    let decision = decide(current_replicas, policy_desired, entry.spec.min_replicas, entry.spec.max_replicas, &entry.spec.behavior, last_scale_at, now);

    if decision.should_act {
        let direction = decision.direction.expect("should_act implies a direction");
        entry.record_scale(direction, now).await;
    }

    (decision.target_replicas, decision.should_act)
}

#[tokio::test]
async fn test_full_tick_scales_up_then_respects_cooldown() {
    let registry = ResourceRegistry::new();
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    registry.on_create("default", "web", spec).await.expect("valid spec registers");

    let (target, acted) = simulate_tick(&registry, "default", "web", 5, 150.0).await;
    assert!(acted);
    assert_eq!(target, 10);

    // Immediately running another tick with the same inputs should be
    // blocked by the freshly-set scale-up cooldown.
    let (target_after, acted_after) = simulate_tick(&registry, "default", "web", 10, 150.0).await;
    assert!(!acted_after);
    assert_eq!(target_after, 10);
}

#[tokio::test]
async fn test_full_tick_no_op_when_already_at_target() {
    let registry = ResourceRegistry::new();
    let spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    registry.on_create("default", "web", spec).await.expect("valid spec registers");

    // current=1 and target_value=100 with metric=100 -> ratio 1.0, proportional
    // branch: ceil(1 * 1.0) = 1, matches current.
    let (target, acted) = simulate_tick(&registry, "default", "web", 1, 100.0).await;
    assert!(!acted);
    assert_eq!(target, 1);
}

#[tokio::test]
async fn test_registry_rejects_invalid_spec_before_any_tick_runs() {
    let registry = ResourceRegistry::new();
    let mut spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    spec.metric.target_value = -5.0;

    let result = registry.on_create("default", "web", spec).await;
    assert!(result.is_err());
    assert!(registry.get("default", "web").await.is_none());
}

#[tokio::test]
async fn test_spec_update_resets_cooldown_state() {
    let registry = ResourceRegistry::new();
    let spec = prometheus_scaler_spec(1, 20, 100.0, 60, 300);
    registry.on_create("default", "web", spec.clone()).await.unwrap();

    let (_, acted) = simulate_tick(&registry, "default", "web", 5, 150.0).await;
    assert!(acted);

    registry.on_update("default", "web", spec).await.unwrap();

    let entry = registry.get("default", "web").await.unwrap();
    assert!(entry.last_scale_at().await.is_none());
}
