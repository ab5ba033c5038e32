use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::Utc;
use futures::StreamExt;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::{Client, ResourceExt};
use prometheus::{Encoder, Histogram, IntCounter, IntGaugeVec, Registry, TextEncoder};
use tokio::signal;
use tokio::sync::{Mutex, broadcast};
use tracing::{info, warn};

use cluster_assessment_engine::crd::{
    AssessmentRequest, AssessmentRequestStatus, CompactFinding, Phase, ProfileOverride, Snapshot,
    SnapshotSpec, SnapshotStatus, SNAPSHOT_NAME_LABEL, TRIGGER_ANNOTATION, TRIGGER_VALUE_RUN,
};
use cluster_assessment_engine::history;
use cluster_assessment_engine::orchestrator;
use cluster_assessment_engine::profile::{self, OverrideLookup};
use cluster_assessment_engine::registry::Registry as ValidatorRegistry;
use cluster_assessment_engine::schedule;
use cluster_assessment_engine::view::{ClusterView as _, KubeClusterView};

/* ============================= CONFIG ============================= */

const FINALIZER: &str = "assessment.openshift.io/cleanup";
const IDLE_REQUEUE: Duration = Duration::from_secs(300);
/// Per-reconcile deadline bounding the validator fan-out. `kube::runtime::Controller`
/// has no native per-call deadline, so this is enforced inside `orchestrator::run`.
const RECONCILE_TIMEOUT: Duration = Duration::from_secs(240);

/* ============================= PROMETHEUS ============================= */

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILE_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let c = IntCounter::new(
        "assessment_reconcile_total",
        "Total AssessmentRequest reconciliation cycles",
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("metric not yet registered");
    c
});

static RECONCILE_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    let c = IntCounter::new(
        "assessment_reconcile_errors_total",
        "Total AssessmentRequest reconciliation errors",
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("metric not yet registered");
    c
});

static ASSESSMENT_SCORE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let g = IntGaugeVec::new(
        prometheus::Opts::new("assessment_score", "Health score per assessment request"),
        &["request"],
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(g.clone()))
        .expect("metric not yet registered");
    g
});

static FINDINGS_TOTAL: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let g = IntGaugeVec::new(
        prometheus::Opts::new("assessment_findings_total", "Findings per request, by status"),
        &["request", "status"],
    )
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(g.clone()))
        .expect("metric not yet registered");
    g
});

static RECONCILE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    let h = Histogram::with_opts(prometheus::HistogramOpts::new(
        "assessment_reconcile_duration_seconds",
        "Duration of each reconciliation cycle in seconds",
    ))
    .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(h.clone()))
        .expect("metric not yet registered");
    h
});

static SNAPSHOTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let c = IntCounter::new("assessment_snapshots_total", "Total history snapshots created")
        .expect("metric definition is valid");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("metric not yet registered");
    c
});

/* ============================= STATE ============================= */

pub(crate) struct ReconcileState {
    pub(crate) ready: bool,
}

struct ReconcileContext {
    client: Client,
    validators: Arc<ValidatorRegistry>,
}

/// `OverrideLookup` backed by a pre-fetched map of `ProfileOverride` specs, so profile
/// resolution (a synchronous, pure operation) never has to reach back into the cluster.
struct PrefetchedOverrides(HashMap<String, cluster_assessment_engine::crd::ProfileOverrideSpec>);

impl OverrideLookup for PrefetchedOverrides {
    fn lookup(&self, name: &str) -> Option<cluster_assessment_engine::crd::ProfileOverrideSpec> {
        self.0.get(name).cloned()
    }
}

/* ============================= ENTRY ============================= */

pub async fn run() -> Result<()> {
    println!("Starting cluster assessment engine...\n");

    let client = Client::try_default()
        .await
        .context("Failed to load kubeconfig")?;

    print!("  Cluster connection .......... ");
    match client.apiserver_version().await {
        Ok(v) => println!("OK (v{}.{})", v.major, v.minor),
        Err(e) => {
            println!("FAIL");
            anyhow::bail!("Cannot reach cluster: {}. Is the cluster running?", e);
        }
    }

    let requests: Api<AssessmentRequest> = Api::all(client.clone());

    let ctx = Arc::new(ReconcileContext {
        client: client.clone(),
        validators: Arc::new(ValidatorRegistry::builtin()),
    });

    LazyLock::force(&RECONCILE_TOTAL);
    LazyLock::force(&RECONCILE_ERRORS);
    LazyLock::force(&ASSESSMENT_SCORE);
    LazyLock::force(&FINDINGS_TOTAL);
    LazyLock::force(&RECONCILE_DURATION);
    LazyLock::force(&SNAPSHOTS_TOTAL);

    let addr = SocketAddr::from(([0, 0, 0, 0], 9090));

    println!("  CRD watch ................... AssessmentRequest.assessment.openshift.io/v1");
    println!("  Validators registered ........ {}", ctx.validators.names().len());
    println!("  Metrics server .............. http://{addr}");
    println!();
    println!("  Available endpoints:");
    println!("    GET /healthz .............. Liveness probe (always 200 OK)");
    println!(
        "    GET /readyz ............... Readiness probe (503 until first reconcile, then 200)"
    );
    println!("    GET /metrics .............. Prometheus metrics scrape endpoint");
    println!();
    println!("Engine running. Press Ctrl+C to stop.\n");
    println!("{}", "=".repeat(70));

    info!("assessment_engine_started");

    let reconcile_state = Arc::new(Mutex::new(ReconcileState { ready: false }));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let http_state = reconcile_state.clone();
    let http_shutdown = shutdown_tx.subscribe();

    let http_handle =
        tokio::spawn(async move { start_metrics_server(http_state, http_shutdown, addr).await });

    let controller_state = reconcile_state.clone();
    let controller = Controller::new(requests, Default::default())
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

    // Use select! so Ctrl+C drops (cancels) the controller stream.
    // The kube Controller has no built-in shutdown hook, so dropping
    // the future is the only way to stop it cleanly.
    tokio::select! {
        _ = controller => {
            info!("assessment_engine_controller_stream_ended");
            println!("\nController stream ended unexpectedly.");
        }
        _ = signal::ctrl_c() => {
            info!("shutdown_signal_received");
            println!("\n{}", "=".repeat(70));
            println!("Shutdown signal received. Stopping engine...");
            println!("{}", "=".repeat(70));
        }
    }

    let _ = shutdown_tx.send(());
    let _ = http_handle.await?;

    info!("assessment_engine_stopped");
    println!("Engine stopped.");

    Ok(())
}

/* ============================= RECONCILE ============================= */

async fn reconcile(
    request: Arc<AssessmentRequest>,
    ctx: Arc<ReconcileContext>,
) -> std::result::Result<Action, kube::Error> {
    let name = request.name_any();

    if request.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&request, &ctx.client).await;
    }

    if !has_finalizer(&request) {
        add_finalizer(&request, &ctx.client).await?;
    }

    let now = Utc::now();
    let decision = decide(&request, now);

    let decision = match decision {
        Decision::Run { clear_trigger } => {
            if clear_trigger {
                clear_trigger_annotation(&request, &ctx.client).await?;
            }
            decision
        }
        other => other,
    };

    match decision {
        Decision::Skip { requeue_after } => {
            return Ok(Action::requeue(requeue_after));
        }
        Decision::Run { .. } => {}
    }

    RECONCILE_TOTAL.inc();
    let _timer = RECONCILE_DURATION.start_timer();

    info!(request = %name, "reconcile_run_start");

    set_phase(&request, &ctx.client, Phase::Running, None).await?;

    let outcome = execute_run(&request, &ctx).await;

    match outcome {
        Ok(run_result) => {
            let finding_count = run_result.findings.len();
            let score = run_result.summary.score;
            apply_status(&request, &ctx, run_result, now).await?;
            println!(
                "[{}] {name}: Completed — {finding_count} findings, score {score:?}",
                now.format("%H:%M:%S"),
            );
        }
        Err(message) => {
            RECONCILE_ERRORS.inc();
            warn!(request = %name, error = %message, "reconcile_run_failed");
            set_phase(&request, &ctx.client, Phase::Failed, Some(message.clone())).await?;
            println!("[{}] {name}: Failed — {message}", now.format("%H:%M:%S"));
        }
    }

    Ok(Action::requeue(IDLE_REQUEUE))
}

enum Decision {
    Run { clear_trigger: bool },
    Skip { requeue_after: Duration },
}

/// Implements the per-tick decision algorithm: manual trigger, on-demand, or schedule.
fn decide(request: &AssessmentRequest, now: chrono::DateTime<Utc>) -> Decision {
    let triggered = request
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(TRIGGER_ANNOTATION))
        .is_some_and(|v| v == TRIGGER_VALUE_RUN);

    if triggered {
        return Decision::Run { clear_trigger: true };
    }

    let status = request.status.as_ref();
    let last_run = status.and_then(|s| s.last_run_time);
    let schedule_expr = request.spec.schedule.as_deref().unwrap_or("");

    if last_run.is_none() && schedule_expr.is_empty() {
        return Decision::Run { clear_trigger: false };
    }

    if schedule_expr.is_empty() {
        return Decision::Skip { requeue_after: IDLE_REQUEUE };
    }

    if request.spec.suspend {
        return Decision::Skip { requeue_after: IDLE_REQUEUE };
    }

    let next_run = match status.and_then(|s| s.next_run_time) {
        Some(next) => Some(next),
        // Not yet persisted (e.g. suspend just flipped to false before any run completed) —
        // compute it on the fly rather than running immediately.
        None => schedule::next_run_time(schedule_expr, last_run, now).ok(),
    };

    match next_run {
        Some(next) if now >= next => Decision::Run { clear_trigger: false },
        Some(next) => {
            let delta = (next - now).to_std().unwrap_or(schedule::MIN_REQUEUE);
            Decision::Skip { requeue_after: delta.max(schedule::MIN_REQUEUE) }
        }
        None => Decision::Run { clear_trigger: false },
    }
}

struct RunResult {
    findings: Vec<cluster_assessment_engine::crd::Finding>,
    summary: cluster_assessment_engine::crd::Summary,
    cluster_info: cluster_assessment_engine::crd::ClusterInfo,
}

async fn execute_run(
    request: &AssessmentRequest,
    ctx: &ReconcileContext,
) -> std::result::Result<RunResult, String> {
    let overrides_api: Api<ProfileOverride> = Api::all(ctx.client.clone());
    let overrides_list = overrides_api
        .list(&ListParams::default())
        .await
        .map_err(|e| e.to_string())?;
    let overrides_map: HashMap<String, _> = overrides_list
        .items
        .into_iter()
        .map(|o| (o.name_any(), o.spec))
        .collect();
    let lookup = PrefetchedOverrides(overrides_map);

    let profile_name = request.spec.profile.clone().unwrap_or_default();
    let resolved = profile::resolve(&profile_name, &lookup).map_err(|e| e.to_string())?;

    let view = KubeClusterView::new(ctx.client.clone());
    let cluster_info = view.cluster_info().await.map_err(|e| e.to_string())?;

    let run_outcome = orchestrator::run(
        &ctx.validators,
        &view,
        &resolved,
        &request.spec.validators,
        request.spec.min_severity,
        &request.spec.suppressions,
        Utc::now(),
        Some(RECONCILE_TIMEOUT),
    )
    .await?;

    if run_outcome.findings.iter().any(|f| f.id == "fan-out-cancelled") {
        return Err(format!(
            "validator fan-out cancelled: exceeded {}s reconcile timeout",
            RECONCILE_TIMEOUT.as_secs()
        ));
    }

    Ok(RunResult {
        findings: run_outcome.findings,
        summary: run_outcome.summary,
        cluster_info,
    })
}

async fn apply_status(
    request: &AssessmentRequest,
    ctx: &ReconcileContext,
    result: RunResult,
    run_time: chrono::DateTime<Utc>,
) -> std::result::Result<Action, kube::Error> {
    let name = request.name_any();

    for status_label in ["pass", "warn", "fail", "info"] {
        let count = result
            .findings
            .iter()
            .filter(|f| f.status.to_string().to_lowercase() == status_label)
            .count() as i64;
        FINDINGS_TOTAL.with_label_values(&[&name, status_label]).set(count);
    }
    if let Some(score) = result.summary.score {
        ASSESSMENT_SCORE.with_label_values(&[&name]).set(score as i64);
    }

    let next_run_time = match request.spec.schedule.as_deref() {
        Some(expr) if !expr.is_empty() && !request.spec.suspend => {
            schedule::next_run_time(expr, Some(run_time), run_time).ok()
        }
        _ => None,
    };

    let (snapshot_count, delta) =
        create_snapshot_and_prune(request, ctx, &result, run_time).await;

    let status = AssessmentRequestStatus {
        phase: Phase::Completed,
        last_run_time: Some(run_time),
        next_run_time,
        cluster_info: Some(result.cluster_info),
        summary: result.summary,
        findings: result.findings,
        delta,
        snapshot_count,
        message: Some("assessment completed".to_string()),
        observed_generation: request.metadata.generation,
    };

    patch_status(request, &ctx.client, &status).await?;

    Ok(Action::requeue(IDLE_REQUEUE))
}

async fn create_snapshot_and_prune(
    request: &AssessmentRequest,
    ctx: &ReconcileContext,
    result: &RunResult,
    run_time: chrono::DateTime<Utc>,
) -> (u32, Option<cluster_assessment_engine::crd::DeltaSummary>) {
    let name = request.name_any();
    let history_limit = request.spec.history_limit;

    if history_limit == 0 {
        return (0, None);
    }

    let snapshots_api: Api<Snapshot> = Api::all(ctx.client.clone());
    let list_params = ListParams::default().labels(&format!("{SNAPSHOT_NAME_LABEL}={name}"));

    let existing = match snapshots_api.list(&list_params).await {
        Ok(list) => list.items,
        Err(e) => {
            warn!(request = %name, error = %e, "snapshot_list_failed");
            return (0, None);
        }
    };

    let previous = existing
        .iter()
        .filter_map(|s| {
            let status = s.status.as_ref()?;
            let run_time = status.run_time?;
            Some((run_time, s, status))
        })
        .max_by_key(|(run_time, _, _)| *run_time);

    let compact: Vec<CompactFinding> = result.findings.iter().map(|f| f.compact()).collect();

    let delta = history::compute_delta(
        &compact,
        previous.map(|(_, _, status)| status.compact_findings.as_slice()),
        &result.summary,
        previous.map(|(_, _, status)| &status.summary),
    );

    let snapshot_name = history::snapshot_name(&name, run_time);
    let mut labels = std::collections::BTreeMap::new();
    labels.insert(SNAPSHOT_NAME_LABEL.to_string(), name.clone());
    labels.insert("app.kubernetes.io/managed-by".to_string(), "cluster-assessment-engine".to_string());

    let mut snapshot = Snapshot::new(
        &snapshot_name,
        SnapshotSpec {
            assessment_name: name.clone(),
            profile: result.summary.profile_used.clone().unwrap_or_default(),
        },
    );
    snapshot.metadata.labels = Some(labels);
    snapshot.status = Some(SnapshotStatus {
        run_time: Some(run_time),
        summary: result.summary.clone(),
        cluster_info: Some(result.cluster_info.clone()),
        compact_findings: compact,
        delta: delta.clone(),
        previous_snapshot_name: previous.map(|(_, s, _)| s.name_any()),
    });

    if let Err(e) = snapshots_api.create(&Default::default(), &snapshot).await {
        warn!(request = %name, error = %e, "snapshot_create_failed");
        return (existing.len() as u32, delta);
    }

    SNAPSHOTS_TOTAL.inc();

    let mut names_with_times: Vec<(String, chrono::DateTime<Utc>)> = existing
        .iter()
        .filter_map(|s| Some((s.name_any(), s.status.as_ref()?.run_time?)))
        .collect();
    names_with_times.push((snapshot_name, run_time));

    let total = names_with_times.len() as u32;
    let to_delete = history::prune_plan(names_with_times, history_limit);

    for victim in &to_delete {
        if let Err(e) = snapshots_api.delete(victim, &Default::default()).await {
            warn!(request = %name, snapshot = %victim, error = %e, "snapshot_delete_failed");
        }
    }

    (total - to_delete.len() as u32, delta)
}

async fn patch_status(
    request: &AssessmentRequest,
    client: &Client,
    status: &AssessmentRequestStatus,
) -> std::result::Result<(), kube::Error> {
    let name = request.name_any();
    let api: Api<AssessmentRequest> = Api::all(client.clone());
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&name, &PatchParams::apply("assessment-engine"), &Patch::Merge(&patch))
        .await?;
    info!(request = %name, "status_updated");
    Ok(())
}

async fn set_phase(
    request: &AssessmentRequest,
    client: &Client,
    phase: Phase,
    message: Option<String>,
) -> std::result::Result<(), kube::Error> {
    let name = request.name_any();
    let api: Api<AssessmentRequest> = Api::all(client.clone());
    let patch = serde_json::json!({ "status": { "phase": phase, "message": message } });
    api.patch_status(&name, &PatchParams::apply("assessment-engine"), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/* ============================= ERROR POLICY ============================= */

fn error_policy(
    _request: Arc<AssessmentRequest>,
    error: &kube::Error,
    _ctx: Arc<ReconcileContext>,
) -> Action {
    RECONCILE_ERRORS.inc();
    warn!(error = %error, "reconcile_error");
    Action::requeue(Duration::from_secs(60))
}

/* ============================= FINALIZER ============================= */

fn has_finalizer(request: &AssessmentRequest) -> bool {
    request
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|s| s == FINALIZER))
}

async fn add_finalizer(
    request: &AssessmentRequest,
    client: &Client,
) -> std::result::Result<(), kube::Error> {
    let name = request.name_any();
    let api: Api<AssessmentRequest> = Api::all(client.clone());
    let patch = serde_json::json!({ "metadata": { "finalizers": [FINALIZER] } });
    api.patch(&name, &PatchParams::apply("assessment-engine"), &Patch::Merge(&patch))
        .await?;
    info!(request = %name, "finalizer_added");
    Ok(())
}

async fn remove_finalizer(
    request: &AssessmentRequest,
    client: &Client,
) -> std::result::Result<(), kube::Error> {
    let name = request.name_any();
    let api: Api<AssessmentRequest> = Api::all(client.clone());
    let patch = serde_json::json!({ "metadata": { "finalizers": [] } });
    api.patch(&name, &PatchParams::apply("assessment-engine"), &Patch::Merge(&patch))
        .await?;
    info!(request = %name, "finalizer_removed");
    Ok(())
}

async fn clear_trigger_annotation(
    request: &AssessmentRequest,
    client: &Client,
) -> std::result::Result<(), kube::Error> {
    let name = request.name_any();
    let api: Api<AssessmentRequest> = Api::all(client.clone());
    let patch = serde_json::json!({
        "metadata": { "annotations": { TRIGGER_ANNOTATION: serde_json::Value::Null } }
    });
    api.patch(&name, &PatchParams::apply("assessment-engine"), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn handle_deletion(
    request: &AssessmentRequest,
    client: &Client,
) -> std::result::Result<Action, kube::Error> {
    let name = request.name_any();
    info!(request = %name, "handling_deletion");

    let _ = ASSESSMENT_SCORE.remove_label_values(&[&name]);

    if has_finalizer(request) {
        remove_finalizer(request, client).await?;
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

async fn start_metrics_server(
    state: Arc<Mutex<ReconcileState>>,
    mut shutdown: broadcast::Receiver<()>,
    addr: SocketAddr,
) -> Result<()> {
    let app = build_reconcile_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind metrics server on :9090")?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::TimeZone;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_reconcile_state(ready: bool) -> Arc<Mutex<ReconcileState>> {
        Arc::new(Mutex::new(ReconcileState { ready }))
    }

    #[tokio::test]
    async fn test_healthz_always_ok() {
        let app = build_reconcile_router(test_reconcile_state(false));
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_not_ready_before_first_reconcile() {
        let app = build_reconcile_router(test_reconcile_state(false));
        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_readyz_ok_after_ready() {
        let app = build_reconcile_router(test_reconcile_state(true));
        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_returns_prometheus_text() {
        LazyLock::force(&RECONCILE_TOTAL);
        let app = build_reconcile_router(test_reconcile_state(true));
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("assessment_reconcile_total"));
    }

    #[test]
    fn test_decide_runs_on_first_reconcile_without_schedule() {
        let request = AssessmentRequest::new("r", Default::default());
        let decision = decide(&request, Utc::now());
        assert!(matches!(decision, Decision::Run { .. }));
    }

    #[test]
    fn test_decide_skips_after_single_shot_run() {
        let mut request = AssessmentRequest::new("r", Default::default());
        request.status = Some(AssessmentRequestStatus {
            last_run_time: Some(Utc::now()),
            ..Default::default()
        });
        let decision = decide(&request, Utc::now());
        assert!(matches!(decision, Decision::Skip { .. }));
    }

    #[test]
    fn test_decide_runs_on_trigger_annotation() {
        let mut request = AssessmentRequest::new("r", Default::default());
        request.status = Some(AssessmentRequestStatus {
            last_run_time: Some(Utc::now()),
            ..Default::default()
        });
        let mut annotations = std::collections::BTreeMap::new();
        annotations.insert(TRIGGER_ANNOTATION.to_string(), TRIGGER_VALUE_RUN.to_string());
        request.metadata.annotations = Some(annotations);
        let decision = decide(&request, Utc::now());
        assert!(matches!(decision, Decision::Run { clear_trigger: true }));
    }

    #[test]
    fn test_decide_skips_suspended_schedule() {
        let mut request = AssessmentRequest::new("r", Default::default());
        request.spec.schedule = Some("0 0 * * * *".to_string());
        request.spec.suspend = true;
        request.status = Some(AssessmentRequestStatus {
            last_run_time: Some(Utc::now()),
            next_run_time: Some(Utc::now()),
            ..Default::default()
        });
        let decision = decide(&request, Utc::now());
        assert!(matches!(decision, Decision::Skip { .. }));
    }

    #[test]
    fn test_decide_runs_when_next_run_time_reached() {
        let mut request = AssessmentRequest::new("r", Default::default());
        request.spec.schedule = Some("0 0 * * * *".to_string());
        let now = Utc::now();
        request.status = Some(AssessmentRequestStatus {
            last_run_time: Some(now - chrono::Duration::hours(1)),
            next_run_time: Some(now - chrono::Duration::minutes(1)),
            ..Default::default()
        });
        let decision = decide(&request, now);
        assert!(matches!(decision, Decision::Run { clear_trigger: false }));
    }

    #[test]
    fn test_decide_computes_next_run_time_on_the_fly_when_unset() {
        // suspend=true -> false before any run ever completed: status.next_run_time is
        // still None, but a fresh reconcile must not run immediately — it should wait
        // for the schedule's next occurrence.
        let mut request = AssessmentRequest::new("r", Default::default());
        request.spec.schedule = Some("0 0 * * * *".to_string());
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 10, 15, 0).unwrap();
        request.status = Some(AssessmentRequestStatus {
            last_run_time: Some(now - chrono::Duration::hours(1)),
            next_run_time: None,
            ..Default::default()
        });
        let decision = decide(&request, now);
        match decision {
            Decision::Skip { requeue_after } => {
                assert!(requeue_after <= Duration::from_secs(45 * 60));
                assert!(requeue_after > Duration::from_secs(0));
            }
            Decision::Run { .. } => panic!("expected Skip until the next cron tick"),
        }
    }
}
