use generalscaler::crd::{
    CostAwareConfig, GeneralScalerSpec, MetricKind, MetricSpec, PolicyKind, PolicySpec,
    PreferredDirection, PrometheusConfig, ScaleDownBehavior, ScaleUpBehavior, ScalerBehavior, SloConfig,
    TargetRef,
};

pub fn prometheus_scaler_spec(
    min_replicas: i32,
    max_replicas: i32,
    target_value: f64,
    scale_up_cooldown: u64,
    scale_down_cooldown: u64,
) -> GeneralScalerSpec {
    GeneralScalerSpec {
        target_ref: TargetRef {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "web".to_string(),
        },
        min_replicas,
        max_replicas,
        metric: MetricSpec {
            kind: MetricKind::Prometheus,
            target_value,
            prometheus: Some(PrometheusConfig {
                server_url: "http://prometheus:9090".to_string(),
                query: "sum(rate(http_requests[1m]))".to_string(),
                headers: None,
            }),
            redis: None,
            pubsub: None,
        },
        policy: PolicySpec {
            kind: PolicyKind::Slo,
            slo: Some(SloConfig {
                slo_violation_multiplier: Some(1.5),
            }),
            cost_aware: None,
        },
        behavior: ScalerBehavior {
            scale_up: ScaleUpBehavior {
                cooldown_seconds: scale_up_cooldown,
                max_increment: 5,
            },
            scale_down: ScaleDownBehavior {
                cooldown_seconds: scale_down_cooldown,
                max_decrement: 2,
            },
        },
        sync_interval_seconds: 30,
    }
}

pub fn cost_aware_scaler_spec(max_monthly_cost: f64, cost_per_pod_per_hour: f64) -> GeneralScalerSpec {
    let mut spec = prometheus_scaler_spec(1, 20, 100.0, 0, 0);
    spec.policy = PolicySpec {
        kind: PolicyKind::CostAware,
        slo: None,
        cost_aware: Some(CostAwareConfig {
            max_monthly_cost: Some(max_monthly_cost),
            cost_per_pod_per_hour,
            preferred_scale_direction: PreferredDirection::Balanced,
        }),
    };
    spec
}
