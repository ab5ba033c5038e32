use anyhow::Context;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::{Api, Client};

use cluster_assessment_engine::bundles::{self, RequestBundle};
use cluster_assessment_engine::crd::AssessmentRequest;

pub fn list() {
    println!(
        "{:<10} {:<50}",
        "NAME", "DESCRIPTION"
    );
    println!("{}", "-".repeat(60));
    for bundle in bundles::all_bundles() {
        println!("{:<10} {:<50}", bundle.name, bundle.description);
    }
}

fn find(name: &str) -> anyhow::Result<RequestBundle> {
    bundles::get_bundle(name).ok_or_else(|| anyhow::anyhow!("Unknown bundle '{name}'"))
}

pub fn show(name: String) -> anyhow::Result<()> {
    let bundle = find(&name)?;
    let yaml = serde_yaml::to_string(&bundle.spec)?;
    println!("# {}", bundle.description);
    println!("{yaml}");
    Ok(())
}

/// Materialize a bundle as a named `AssessmentRequest` and create it in the cluster.
pub async fn apply(name: String, request_name: String) -> anyhow::Result<()> {
    let bundle = find(&name)?;

    let client = Client::try_default()
        .await
        .context("Failed to connect to Kubernetes cluster. Is your kubeconfig valid?")?;
    let requests: Api<AssessmentRequest> = Api::all(client);

    let request = AssessmentRequest {
        metadata: ObjectMeta {
            name: Some(request_name.clone()),
            ..Default::default()
        },
        spec: bundle.spec,
        status: None,
    };

    requests
        .create(&PostParams::default(), &request)
        .await
        .with_context(|| format!("Failed to create AssessmentRequest '{request_name}'"))?;

    println!("Created AssessmentRequest '{request_name}' from bundle '{name}'");
    Ok(())
}
