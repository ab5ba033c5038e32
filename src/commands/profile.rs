use std::collections::HashMap;

use anyhow::Context;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};

use cluster_assessment_engine::crd::ProfileOverride;
use cluster_assessment_engine::crd::ProfileOverrideSpec;
use cluster_assessment_engine::profile::{self, OverrideLookup};

struct MapLookup(HashMap<String, ProfileOverrideSpec>);

impl OverrideLookup for MapLookup {
    fn lookup(&self, name: &str) -> Option<ProfileOverrideSpec> {
        self.0.get(name).cloned()
    }
}

async fn fetch_overrides() -> anyhow::Result<MapLookup> {
    let client = Client::try_default()
        .await
        .context("Failed to connect to Kubernetes cluster. Is your kubeconfig valid?")?;
    let api: Api<ProfileOverride> = Api::all(client);
    let map = api
        .list(&ListParams::default())
        .await
        .context("Failed to list ProfileOverrides")?
        .items
        .into_iter()
        .map(|o| (o.name_any(), o.spec))
        .collect();
    Ok(MapLookup(map))
}

pub fn list_builtin() {
    println!("Built-in profiles:");
    println!("  production   Strict thresholds for production clusters.");
    println!("  development  Lenient thresholds for development clusters.");
}

pub async fn list() -> anyhow::Result<()> {
    list_builtin();

    let lookup = fetch_overrides().await?;
    if lookup.0.is_empty() {
        println!("\nNo ProfileOverrides found in the cluster.");
    } else {
        println!("\nProfileOverride profiles:");
        let mut names: Vec<&String> = lookup.0.keys().collect();
        names.sort();
        for name in names {
            println!("  {name}");
        }
    }

    Ok(())
}

pub async fn show(name: String) -> anyhow::Result<()> {
    let lookup = fetch_overrides().await?;
    let resolved = profile::resolve(&name, &lookup)
        .with_context(|| format!("Failed to resolve profile '{name}'"))?;

    println!("Profile: {}", resolved.name);
    println!("Description: {}", resolved.description);
    println!("Strictness: {}", resolved.strictness);
    println!("\nThresholds:");
    println!("  minControlPlaneNodes:      {}", resolved.thresholds.min_control_plane_nodes);
    println!("  minWorkerNodes:            {}", resolved.thresholds.min_worker_nodes);
    println!("  maxClusterAdminBindings:   {}", resolved.thresholds.max_cluster_admin_bindings);
    println!("  requireNetworkPolicy:      {}", resolved.thresholds.require_network_policy);
    println!("  requireResourceQuotas:     {}", resolved.thresholds.require_resource_quotas);
    println!("  requireLimitRanges:        {}", resolved.thresholds.require_limit_ranges);
    println!("  maxDaysWithoutUpdate:      {}", resolved.thresholds.max_days_without_update);
    println!("  allowPrivilegedContainers: {}", resolved.thresholds.allow_privileged_containers);
    println!("  requireDefaultStorageClass:{}", resolved.thresholds.require_default_storage_class);

    if !resolved.enabled_validators.is_empty() {
        println!("\nEnabled validators: {}", resolved.enabled_validators.join(", "));
    }
    if !resolved.disabled_checks.is_empty() {
        println!("Disabled checks: {}", resolved.disabled_checks.join(", "));
    }

    Ok(())
}
