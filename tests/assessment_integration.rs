use cluster_assessment_engine::crd::{CompactFinding, Finding, ProfileOverrideSpec};
use cluster_assessment_engine::history;
use cluster_assessment_engine::orchestrator;
use cluster_assessment_engine::profile::{self, OverrideLookup};
use cluster_assessment_engine::registry::Registry;
use cluster_assessment_engine::view::tests_support::FakeClusterView;

// ══════════════════════════════════════════════════════════════════
// End-to-end pipeline: profile resolution → validator fan-out →
// scoring → history delta, without a live cluster.
// ══════════════════════════════════════════════════════════════════

struct NoOverrides;
impl OverrideLookup for NoOverrides {
    fn lookup(&self, _name: &str) -> Option<ProfileOverrideSpec> {
        None
    }
}

fn compact_findings(findings: &[Finding]) -> Vec<CompactFinding> {
    findings.iter().map(|f| f.compact()).collect()
}

#[tokio::test]
async fn test_healthy_production_cluster_scores_well() {
    let registry = Registry::builtin();
    let profile = profile::resolve("production", &NoOverrides).unwrap();

    let view = FakeClusterView::new()
        .with_control_plane_nodes(3)
        .with_worker_nodes(3)
        .with_namespace("my-app");

    let outcome = orchestrator::run(&registry, &view, &profile, &[], None, &[], chrono::Utc::now(), None)
        .await
        .unwrap();

    assert!(outcome.summary.score.is_some());
    assert!(
        outcome.findings.iter().any(|f| f.id == "control-plane-count"
            && f.status == cluster_assessment_engine::crd::FindingStatus::Pass)
    );
}

#[tokio::test]
async fn test_understaffed_cluster_fails_node_readiness() {
    let registry = Registry::builtin();
    let profile = profile::resolve("production", &NoOverrides).unwrap();

    let view = FakeClusterView::new().with_control_plane_nodes(1).with_worker_nodes(1);

    let outcome = orchestrator::run(
        &registry,
        &view,
        &profile,
        &["node-readiness".to_string()],
        None,
        &[],
        chrono::Utc::now(),
        None,
    )
    .await
    .unwrap();

    assert!(
        outcome
            .findings
            .iter()
            .any(|f| f.id == "control-plane-count" && f.status == cluster_assessment_engine::crd::FindingStatus::Fail)
    );
}

#[tokio::test]
async fn test_development_profile_skips_network_policy_check() {
    let registry = Registry::builtin();
    let profile = profile::resolve("development", &NoOverrides).unwrap();
    let view = FakeClusterView::new().with_namespace("my-app");

    let outcome = orchestrator::run(
        &registry,
        &view,
        &profile,
        &["network-policy-presence".to_string()],
        None,
        &[],
        chrono::Utc::now(),
        None,
    )
    .await
    .unwrap();

    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn test_consecutive_runs_produce_a_delta() {
    let registry = Registry::builtin();
    let profile = profile::resolve("production", &NoOverrides).unwrap();

    let run_one_view = FakeClusterView::new().with_control_plane_nodes(3).with_worker_nodes(3);
    let run_one = orchestrator::run(
        &registry,
        &run_one_view,
        &profile,
        &["node-readiness".to_string()],
        None,
        &[],
        chrono::Utc::now(),
        None,
    )
    .await
    .unwrap();

    let run_two_view = FakeClusterView::new().with_control_plane_nodes(1).with_worker_nodes(3);
    let run_two = orchestrator::run(
        &registry,
        &run_two_view,
        &profile,
        &["node-readiness".to_string()],
        None,
        &[],
        chrono::Utc::now(),
        None,
    )
    .await
    .unwrap();

    let previous = compact_findings(&run_one.findings);
    let current = compact_findings(&run_two.findings);

    let delta = history::compute_delta(&current, Some(&previous), &run_two.summary, Some(&run_one.summary))
        .unwrap();

    assert!(delta.regression_findings.contains(&"control-plane-count".to_string()));
}
