use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/* ============================= TARGET REF ============================= */

/// Identifies the workload a `GeneralScaler` scales.
///
/// Only `Deployment`-shaped, replica-count-controlled workloads are in scope
/// (see spec Non-goals); `apiVersion`/`kind` are carried through for the
/// status/log surface but the Workload Adapter always talks to the `apps/v1`
/// Deployment API.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub name: String,
}

fn default_api_version() -> String {
    "apps/v1".to_string()
}

fn default_kind() -> String {
    "Deployment".to_string()
}

/* ============================= METRIC ============================= */

/// Metric provider kind recognized by the registry. Unrecognized values are
/// rejected at registration (`InvalidSpec`), never at tick time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Prometheus,
    Redis,
    Pubsub,
}

/// Prometheus provider config (recognized keys per spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusConfig {
    pub server_url: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<std::collections::BTreeMap<String, String>>,
}

/// Redis provider config (recognized keys per spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub db: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub queue_name: String,
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

/// Pub/sub provider config (recognized keys per spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PubSubConfig {
    pub project_id: String,
    pub subscription_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<String>,
}

/// The metric block of a `GeneralScaler` spec: which provider kind, the
/// target value it should converge to, and that provider's own config block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub target_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus: Option<PrometheusConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub: Option<PubSubConfig>,
}

/* ============================= POLICY ============================= */

/// Scaling policy kind. An unknown or omitted kind falls back to the SLO
/// policy with default config at registration time (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Slo,
    #[serde(rename = "costaware")]
    CostAware,
    /// Any `policy.type` string the two known kinds don't match. Caught here
    /// rather than failing deserialization, so the fallback-to-SLO behavior
    /// in `build_policy` is actually reachable.
    #[serde(other)]
    Unknown,
}

/// SLO policy config (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SloConfig {
    /// SLO-violation amplification factor applied when `metric > target`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slo_violation_multiplier: Option<f64>,
}

/// Preferred scaling direction for the cost-aware policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreferredDirection {
    Up,
    Down,
    #[default]
    Balanced,
}

/// Cost-aware policy config (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CostAwareConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_monthly_cost: Option<f64>,
    #[serde(default)]
    pub cost_per_pod_per_hour: f64,
    #[serde(default)]
    pub preferred_scale_direction: PreferredDirection,
}

/// The policy block of a `GeneralScaler` spec.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    #[serde(rename = "type")]
    pub kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slo: Option<SloConfig>,
    #[serde(default, rename = "costAware", skip_serializing_if = "Option::is_none")]
    pub cost_aware: Option<CostAwareConfig>,
}

impl Default for PolicySpec {
    fn default() -> Self {
        Self {
            kind: PolicyKind::Slo,
            slo: Some(SloConfig::default()),
            cost_aware: None,
        }
    }
}

/* ============================= BEHAVIOR ============================= */

/// One direction's cooldown + rate-limit knobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleUpBehavior {
    #[serde(default = "default_scale_up_cooldown")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_max_increment")]
    pub max_increment: u32,
}

impl Default for ScaleUpBehavior {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_scale_up_cooldown(),
            max_increment: default_max_increment(),
        }
    }
}

fn default_scale_up_cooldown() -> u64 {
    60
}

fn default_max_increment() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDownBehavior {
    #[serde(default = "default_scale_down_cooldown")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_max_decrement")]
    pub max_decrement: u32,
}

impl Default for ScaleDownBehavior {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_scale_down_cooldown(),
            max_decrement: default_max_decrement(),
        }
    }
}

fn default_scale_down_cooldown() -> u64 {
    300
}

fn default_max_decrement() -> u32 {
    2
}

/// The behavior block of a `GeneralScaler` spec (cooldowns + rate limits).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScalerBehavior {
    #[serde(default)]
    pub scale_up: ScaleUpBehavior,
    #[serde(default)]
    pub scale_down: ScaleDownBehavior,
}

/* ============================= SPEC ============================= */

/// Absolute ceiling on `maxReplicas`, independent of any per-resource config.
pub const ABSOLUTE_MAX_REPLICAS: i32 = 100;

/// `GeneralScaler` is a generic autoscaling resource: it binds a target
/// workload to a pluggable metric source and scaling policy, with a safety
/// layer enforcing cooldowns, rate limits, and absolute bounds.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "autoscaling.generalscaler.io",
    version = "v1alpha1",
    kind = "GeneralScaler",
    plural = "generalscalers",
    status = "GeneralScalerStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GeneralScalerSpec {
    pub target_ref: TargetRef,

    pub min_replicas: i32,
    pub max_replicas: i32,

    pub metric: MetricSpec,

    #[serde(default)]
    pub policy: PolicySpec,

    #[serde(default)]
    pub behavior: ScalerBehavior,

    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    30
}

impl GeneralScalerSpec {
    /// Structural validity independent of provider/policy config (spec §3
    /// invariants). Provider/policy config validity is checked separately by
    /// the registry at registration time.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_replicas < 0 {
            return Err("minReplicas must be >= 0".to_string());
        }
        if self.max_replicas > ABSOLUTE_MAX_REPLICAS {
            return Err(format!("maxReplicas must be <= {ABSOLUTE_MAX_REPLICAS}"));
        }
        if self.min_replicas > self.max_replicas {
            return Err("minReplicas must be <= maxReplicas".to_string());
        }
        if self.metric.target_value <= 0.0 {
            return Err("metric.targetValue must be > 0".to_string());
        }
        if self.behavior.scale_up.max_increment < 1 {
            return Err("behavior.scaleUp.maxIncrement must be >= 1".to_string());
        }
        if self.behavior.scale_down.max_decrement < 1 {
            return Err("behavior.scaleDown.maxDecrement must be >= 1".to_string());
        }
        Ok(())
    }
}

/* ============================= CONDITIONS ============================= */

/// Closed set of condition reasons a `GeneralScaler`'s `Ready` condition may
/// report (spec §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    ScalingSucceeded,
    ScalingFailed,
    NoScalingNeeded,
    DeploymentNotFound,
    MetricFetchFailed,
    ReconciliationError,
    InvalidSpec,
}

impl ConditionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionReason::ScalingSucceeded => "ScalingSucceeded",
            ConditionReason::ScalingFailed => "ScalingFailed",
            ConditionReason::NoScalingNeeded => "NoScalingNeeded",
            ConditionReason::DeploymentNotFound => "DeploymentNotFound",
            ConditionReason::MetricFetchFailed => "MetricFetchFailed",
            ConditionReason::ReconciliationError => "ReconciliationError",
            ConditionReason::InvalidSpec => "InvalidSpec",
        }
    }

    /// Whether this reason represents a healthy/"Ready=True" outcome.
    pub fn is_ready(self) -> bool {
        matches!(
            self,
            ConditionReason::ScalingSucceeded | ConditionReason::NoScalingNeeded
        )
    }
}

/// A single `Ready` condition, following the standard Kubernetes condition
/// shape (`type`, `status`, `reason`, `message`, `lastTransitionTime`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_transition_time: String,
}

impl Condition {
    pub fn ready(reason: ConditionReason, message: impl Into<String>, now: &str) -> Self {
        Self {
            type_: "Ready".to_string(),
            status: if reason.is_ready() { "True" } else { "False" }.to_string(),
            reason: reason.as_str().to_string(),
            message: message.into(),
            last_transition_time: now.to_string(),
        }
    }
}

/* ============================= STATUS ============================= */

/// `GeneralScalerStatus` reports the controller's most recent observation and
/// decision (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneralScalerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_metric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_metric_check_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scale_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/* ============================= TESTS ============================= */
