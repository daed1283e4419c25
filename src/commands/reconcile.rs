use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use futures::StreamExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::{Client, ResourceExt};
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, IntGaugeVec, Registry, TextEncoder};
use tokio::signal;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use generalscaler::crd::{Condition, ConditionReason, GeneralScaler, GeneralScalerStatus};
use generalscaler::metrics::{FetchError, METRIC_FETCH_TIMEOUT};
use generalscaler::registry::ResourceRegistry;
use generalscaler::safety::{self, ScaleDirection};
use generalscaler::workload::{WorkloadAdapter, WorkloadReadError, WorkloadWriteError};

/* ============================= CONFIG ============================= */

const FINALIZER: &str = "generalscaler.io/cleanup";

/* ============================= PROMETHEUS ============================= */

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILE_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let c = IntCounter::new("generalscaler_reconcile_total", "Total reconciliation ticks").expect("metric definition is valid");
    REGISTRY.register(Box::new(c.clone())).expect("metric not yet registered");
    c
});

static RECONCILE_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    let c = IntCounter::new("generalscaler_reconcile_errors_total", "Total reconciliation errors")
        .expect("metric definition is valid");
    REGISTRY.register(Box::new(c.clone())).expect("metric not yet registered");
    c
});

static CURRENT_REPLICAS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let g = IntGaugeVec::new(
        prometheus::Opts::new("generalscaler_current_replicas", "Current replica count"),
        &["namespace", "name"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(g.clone())).expect("metric not yet registered");
    g
});

static DESIRED_REPLICAS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let g = IntGaugeVec::new(
        prometheus::Opts::new("generalscaler_desired_replicas", "Committed desired replica count"),
        &["namespace", "name"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(g.clone())).expect("metric not yet registered");
    g
});

static SCALE_ACTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let c = IntCounterVec::new(
        prometheus::Opts::new("generalscaler_scale_actions_total", "Committed scale actions"),
        &["namespace", "name", "direction"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(c.clone())).expect("metric not yet registered");
    c
});

static RECONCILE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    let h = Histogram::with_opts(prometheus::HistogramOpts::new(
        "generalscaler_reconcile_duration_seconds",
        "Duration of each reconciliation tick in seconds",
    ))
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(h.clone())).expect("metric not yet registered");
    h
});

/* ============================= STATE ============================= */

pub(crate) struct ReconcileState {
    pub(crate) ready: bool,
}

/* ============================= CONTEXT ============================= */

struct ReconcileContext {
    client: Client,
    registry: Arc<ResourceRegistry>,
    workload: WorkloadAdapter,
}

/* ============================= ENTRY ============================= */

pub async fn run() -> Result<()> {
    println!("Starting GeneralScaler operator...\n");

    let client = Client::try_default().await.context("Failed to load kubeconfig")?;

    print!("  Cluster connection .......... ");
    match client.apiserver_version().await {
        Ok(v) => println!("OK (v{}.{})", v.major, v.minor),
        Err(e) => {
            println!("FAIL");
            anyhow::bail!("Cannot reach cluster: {}. Is the cluster running?", e);
        }
    }

    let watch_namespace = generalscaler::config::Config::from_env().watch_namespace;
    let scalers: Api<GeneralScaler> = if watch_namespace.is_empty() {
        Api::all(client.clone())
    } else {
        Api::namespaced(client.clone(), &watch_namespace)
    };

    let ctx = Arc::new(ReconcileContext {
        client: client.clone(),
        registry: Arc::new(ResourceRegistry::new()),
        workload: WorkloadAdapter::new(client.clone()),
    });

    LazyLock::force(&RECONCILE_TOTAL);
    LazyLock::force(&RECONCILE_ERRORS);
    LazyLock::force(&CURRENT_REPLICAS);
    LazyLock::force(&DESIRED_REPLICAS);
    LazyLock::force(&SCALE_ACTIONS);
    LazyLock::force(&RECONCILE_DURATION);

    let addr = SocketAddr::from(([0, 0, 0, 0], 9090));

    println!("  CRD watch ................... GeneralScaler.autoscaling.generalscaler.io/v1alpha1");
    println!(
        "  Watch namespace .............. {}",
        if watch_namespace.is_empty() { "<all>" } else { &watch_namespace }
    );
    println!("  Metrics server .............. http://{addr}");
    println!();
    println!("  Available endpoints:");
    println!("    GET /healthz .............. Liveness probe (always 200 OK)");
    println!("    GET /readyz ............... Readiness probe (503 until first reconcile, then 200)");
    println!("    GET /metrics .............. Prometheus metrics scrape endpoint");
    println!();
    println!("Operator running. Press Ctrl+C to stop.\n");

    info!("operator_controller_started");

    let reconcile_state = Arc::new(Mutex::new(ReconcileState { ready: false }));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let http_state = reconcile_state.clone();
    let http_shutdown = shutdown_tx.subscribe();

    let http_handle = tokio::spawn(async move { start_metrics_server(http_state, http_shutdown, addr).await });

    let controller_state = reconcile_state.clone();
    let controller = Controller::new(scalers, Default::default())
        .run(reconcile, error_policy, ctx)
        .for_each(move |result| {
            let state = controller_state.clone();
            async move {
                {
                    let mut s = state.lock().await;
                    if !s.ready {
                        s.ready = true;
                    }
                }
                match result {
                    Ok((_obj, _action)) => {}
                    Err(e) => {
                        warn!(error = %e, "reconcile_dispatch_error");
                        eprintln!("[ERROR] Reconcile dispatch: {e}");
                    }
                }
            }
        });

    tokio::select! {
        _ = controller => {
            info!("operator_controller_stream_ended");
            println!("\nController stream ended unexpectedly.");
        }
        _ = signal::ctrl_c() => {
            info!("shutdown_signal_received");
            println!("\nShutdown signal received. Stopping operator...");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = http_handle.await?;

    info!("operator_stopped");
    println!("Operator stopped.");

    Ok(())
}

/* ============================= RECONCILE ============================= */

async fn reconcile(scaler: Arc<GeneralScaler>, ctx: Arc<ReconcileContext>) -> std::result::Result<Action, kube::Error> {
    let name = scaler.name_any();
    let namespace = scaler.namespace().unwrap_or_default();

    if scaler.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&scaler, &ctx).await;
    }

    if !has_finalizer(&scaler) {
        add_finalizer(&scaler, &ctx.client).await?;
    }

    RECONCILE_TOTAL.inc();
    let _timer = RECONCILE_DURATION.start_timer();

    let sync_interval = Duration::from_secs(scaler.spec.sync_interval_seconds.max(1));

    if let Err(message) = ensure_registered(&scaler, &namespace, &name, &ctx.registry).await {
        warn!(scaler = %name, namespace = %namespace, error = %message, "invalid_spec");
        write_status(&ctx.client, &namespace, &name, None, None, None, ConditionReason::InvalidSpec, message).await?;
        return Ok(Action::requeue(sync_interval));
    }

    let entry = match ctx.registry.get(&namespace, &name).await {
        Some(entry) => entry,
        None => {
            // Resource was removed concurrently between registration and lookup.
            return Ok(Action::await_change());
        }
    };

    // ── Step 2: read current replicas ──
    let current_replicas = match ctx.workload.read_replicas(&namespace, &scaler.spec.target_ref.name).await {
        Ok(n) => n,
        Err(WorkloadReadError::NotFound) => {
            write_status(
                &ctx.client,
                &namespace,
                &name,
                None,
                None,
                None,
                ConditionReason::DeploymentNotFound,
                format!("deployment '{}' not found", scaler.spec.target_ref.name),
            )
            .await?;
            return Ok(Action::requeue(sync_interval));
        }
        Err(WorkloadReadError::Other(e)) => {
            RECONCILE_ERRORS.inc();
            write_status(&ctx.client, &namespace, &name, None, None, None, ConditionReason::ReconciliationError, e.to_string())
                .await?;
            return Ok(Action::requeue(sync_interval));
        }
    };

    CURRENT_REPLICAS.with_label_values(&[&namespace, &name]).set(current_replicas as i64);

    // ── Step 3: fetch metric ──
    let metric_value = match entry.provider.fetch(METRIC_FETCH_TIMEOUT).await {
        Ok(v) => v,
        Err(FetchError::Unavailable) | Err(FetchError::ConfigError(_)) => {
            write_status(
                &ctx.client,
                &namespace,
                &name,
                Some(current_replicas),
                Some(current_replicas),
                None,
                ConditionReason::MetricFetchFailed,
                "metric unavailable this tick".to_string(),
            )
            .await?;
            return Ok(Action::requeue(sync_interval));
        }
    };

    // ── Step 4: policy ──
    let policy_desired = entry.policy.calculate_desired_replicas(
        current_replicas,
        metric_value,
        scaler.spec.metric.target_value,
        scaler.spec.min_replicas,
        scaler.spec.max_replicas,
    );

    // ── Step 5: safety layer ──
    let last_scale_at = entry.last_scale_at().await;
    let last_scale_direction = entry.last_scale_direction().await;
    tracing::debug!(
        scaler = %name,
        namespace = %namespace,
        policy_desired,
        ?last_scale_at,
        ?last_scale_direction,
        "evaluating_safety_decision"
    );
    let now = Utc::now();
    let decision = safety::decide(
        current_replicas,
        policy_desired,
        scaler.spec.min_replicas,
        scaler.spec.max_replicas,
        &scaler.spec.behavior,
        last_scale_at,
        now,
    );

    DESIRED_REPLICAS.with_label_values(&[&namespace, &name]).set(decision.target_replicas as i64);

    // ── Step 6 & 7: commit ──
    if decision.should_act {
        match ctx
            .workload
            .set_replicas(&namespace, &scaler.spec.target_ref.name, decision.target_replicas)
            .await
        {
            Ok(()) => {
                let direction = decision
                    .direction
                    .expect("should_act implies Rule 2/6 set a direction");
                entry.record_scale(direction, now).await;
                SCALE_ACTIONS
                    .with_label_values(&[&namespace, &name, if matches!(direction, ScaleDirection::Up) { "up" } else { "down" }])
                    .inc();

                write_status(
                    &ctx.client,
                    &namespace,
                    &name,
                    Some(current_replicas),
                    Some(decision.target_replicas),
                    Some(metric_value),
                    ConditionReason::ScalingSucceeded,
                    decision.reason.clone(),
                )
                .await?;
            }
            Err(WorkloadWriteError::Other(e)) => {
                RECONCILE_ERRORS.inc();
                write_status(
                    &ctx.client,
                    &namespace,
                    &name,
                    Some(current_replicas),
                    Some(decision.target_replicas),
                    Some(metric_value),
                    ConditionReason::ScalingFailed,
                    e.to_string(),
                )
                .await?;
            }
        }
    } else {
        write_status(
            &ctx.client,
            &namespace,
            &name,
            Some(current_replicas),
            Some(decision.target_replicas),
            Some(metric_value),
            ConditionReason::NoScalingNeeded,
            decision.reason.clone(),
        )
        .await?;
    }

    Ok(Action::requeue(sync_interval))
}

async fn ensure_registered(
    scaler: &GeneralScaler,
    namespace: &str,
    name: &str,
    registry: &ResourceRegistry,
) -> std::result::Result<(), String> {
    match registry.get(namespace, name).await {
        None => registry.on_create(namespace, name, scaler.spec.clone()).await,
        Some(entry) if entry.spec != scaler.spec => registry.on_update(namespace, name, scaler.spec.clone()).await,
        Some(_) => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn write_status(
    client: &Client,
    namespace: &str,
    name: &str,
    current_replicas: Option<i32>,
    desired_replicas: Option<i32>,
    current_metric_value: Option<f64>,
    reason: ConditionReason,
    message: String,
) -> std::result::Result<(), kube::Error> {
    let now = Utc::now().to_rfc3339();

    let status = GeneralScalerStatus {
        current_replicas,
        desired_replicas,
        current_metric_value,
        last_metric_check_time: Some(now.clone()),
        last_scale_time: if matches!(reason, ConditionReason::ScalingSucceeded) { Some(now.clone()) } else { None },
        conditions: vec![Condition::ready(reason, message, &now)],
    };

    let status_patch = serde_json::json!({ "status": status });
    let scalers: Api<GeneralScaler> = Api::namespaced(client.clone(), namespace);

    scalers
        .patch_status(name, &PatchParams::apply("generalscaler-controller"), &Patch::Merge(&status_patch))
        .await?;

    Ok(())
}

fn error_policy(_scaler: Arc<GeneralScaler>, error: &kube::Error, _ctx: Arc<ReconcileContext>) -> Action {
    RECONCILE_ERRORS.inc();
    warn!(error = %error, "reconcile_error");
    Action::requeue(Duration::from_secs(60))
}

/* ============================= FINALIZER ============================= */

fn has_finalizer(scaler: &GeneralScaler) -> bool {
    scaler.metadata.finalizers.as_ref().is_some_and(|f| f.iter().any(|s| s == FINALIZER))
}

async fn add_finalizer(scaler: &GeneralScaler, client: &Client) -> std::result::Result<(), kube::Error> {
    let name = scaler.name_any();
    let namespace = scaler.namespace().unwrap_or_default();
    let api: Api<GeneralScaler> = Api::namespaced(client.clone(), &namespace);

    let patch = serde_json::json!({ "metadata": { "finalizers": [FINALIZER] } });
    api.patch(&name, &PatchParams::apply("generalscaler-controller"), &Patch::Merge(&patch)).await?;

    info!(scaler = %name, "finalizer_added");
    Ok(())
}

async fn remove_finalizer(scaler: &GeneralScaler, client: &Client) -> std::result::Result<(), kube::Error> {
    let name = scaler.name_any();
    let namespace = scaler.namespace().unwrap_or_default();
    let api: Api<GeneralScaler> = Api::namespaced(client.clone(), &namespace);

    let patch = serde_json::json!({ "metadata": { "finalizers": [] } });
    api.patch(&name, &PatchParams::apply("generalscaler-controller"), &Patch::Merge(&patch)).await?;

    info!(scaler = %name, "finalizer_removed");
    Ok(())
}

async fn handle_deletion(scaler: &GeneralScaler, ctx: &ReconcileContext) -> std::result::Result<Action, kube::Error> {
    let name = scaler.name_any();
    let namespace = scaler.namespace().unwrap_or_default();

    info!(scaler = %name, namespace = %namespace, "handling_deletion");

    ctx.registry.on_delete(&namespace, &name).await;

    let _ = CURRENT_REPLICAS.remove_label_values(&[&namespace, &name]);
    let _ = DESIRED_REPLICAS.remove_label_values(&[&namespace, &name]);

    if has_finalizer(scaler) {
        remove_finalizer(scaler, &ctx.client).await?;
    }

    Ok(Action::await_change())
}

/* ============================= HTTP SERVER ============================= */

pub(crate) fn build_reconcile_router(state: Arc<Mutex<ReconcileState>>) -> Router {
    Router::new()
        .route("/metrics", get(reconcile_metrics_handler))
        .route("/healthz", get(|| async { (StatusCode::OK, "OK") }))
        .route(
            "/readyz",
            get({
                let state = state.clone();
                move || reconcile_ready_handler(state.clone())
            }),
        )
}

async fn start_metrics_server(state: Arc<Mutex<ReconcileState>>, mut shutdown: broadcast::Receiver<()>, addr: SocketAddr) -> Result<()> {
    let app = build_reconcile_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.context("Failed to bind metrics server on :9090")?;

    info!(addr = %addr, "reconcile_metrics_server_started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}

async fn reconcile_ready_handler(state: Arc<Mutex<ReconcileState>>) -> impl IntoResponse {
    let state = state.lock().await;
    if state.ready {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn reconcile_metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(body) => (StatusCode::OK, body),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding error".to_string()),
        },
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding error".to_string()),
    }
}

/* ============================= TESTS ============================= */
