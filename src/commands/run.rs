use std::collections::HashMap;

use anyhow::Context;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};

use cluster_assessment_engine::crd::{AssessmentRequest, FindingStatus, ProfileOverride, ProfileOverrideSpec};
use cluster_assessment_engine::profile::{self, OverrideLookup};
use cluster_assessment_engine::registry::Registry;
use cluster_assessment_engine::view::KubeClusterView;
use cluster_assessment_engine::orchestrator;

struct MapLookup(HashMap<String, ProfileOverrideSpec>);

impl OverrideLookup for MapLookup {
    fn lookup(&self, name: &str) -> Option<ProfileOverrideSpec> {
        self.0.get(name).cloned()
    }
}

/// Fetch the named `AssessmentRequest`, run it once against the live cluster, and
/// print the findings and summary. Does not write status back — `reconcile` owns that.
pub async fn run(name: String) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .context("Failed to connect to Kubernetes cluster. Is your kubeconfig valid?")?;

    let requests: Api<AssessmentRequest> = Api::all(client.clone());
    let request = requests
        .get(&name)
        .await
        .with_context(|| format!("AssessmentRequest '{name}' not found"))?;

    let overrides_api: Api<ProfileOverride> = Api::all(client.clone());
    let overrides_map: HashMap<String, ProfileOverrideSpec> = overrides_api
        .list(&ListParams::default())
        .await
        .context("Failed to list ProfileOverrides")?
        .items
        .into_iter()
        .map(|o| (o.name_any(), o.spec))
        .collect();
    let lookup = MapLookup(overrides_map);

    let profile_name = request.spec.profile.clone().unwrap_or_default();
    let resolved = profile::resolve(&profile_name, &lookup)
        .with_context(|| format!("Failed to resolve profile '{profile_name}'"))?;

    println!("Assessing cluster against profile '{}'...\n", resolved.name);

    let view = KubeClusterView::new(client);
    let registry = Registry::builtin();

    let outcome = orchestrator::run(
        &registry,
        &view,
        &resolved,
        &request.spec.validators,
        request.spec.min_severity,
        &request.spec.suppressions,
        chrono::Utc::now(),
        None,
    )
    .await
    .map_err(anyhow::Error::msg)?;

    for finding in &outcome.findings {
        let marker = if finding.suppressed { " (suppressed)" } else { "" };
        println!(
            "[{}] {} — {}{marker}",
            finding.status, finding.validator, finding.title
        );
    }

    println!("\nSummary:");
    println!("  Total checks: {}", outcome.summary.total_checks);
    println!("  Pass:  {}", outcome.summary.pass_count);
    println!("  Warn:  {}", outcome.summary.warn_count);
    println!("  Fail:  {}", outcome.summary.fail_count);
    println!("  Info:  {}", outcome.summary.info_count);
    match outcome.summary.score {
        Some(score) => println!("  Score: {score}/100"),
        None => println!("  Score: n/a (no scoring findings)"),
    }

    if outcome.findings.iter().any(|f| !f.suppressed && f.status == FindingStatus::Fail) {
        anyhow::bail!("one or more checks failed");
    }

    Ok(())
}
