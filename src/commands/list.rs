use anyhow::Context;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};

use cluster_assessment_engine::crd::AssessmentRequest;

pub async fn run() -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .context("Failed to connect to Kubernetes cluster. Is your kubeconfig valid?")?;

    let requests: Api<AssessmentRequest> = Api::all(client);

    let list = requests
        .list(&ListParams::default())
        .await
        .context("Failed to list AssessmentRequests. Check RBAC permissions.")?;

    let mut rows: Vec<(String, String, String, u32, u32, u32, String)> = list
        .into_iter()
        .map(|r| {
            let name = r.name_any();
            let profile = r.spec.profile.clone().unwrap_or_else(|| "production".to_string());
            let status = r.status.unwrap_or_default();
            let last_run = status
                .last_run_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string());
            (
                name,
                profile,
                format!("{:?}", status.phase),
                status.summary.pass_count,
                status.summary.warn_count,
                status.summary.fail_count,
                last_run,
            )
        })
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!(
        "{:<30} {:<12} {:<10} {:>5} {:>5} {:>5} {:<25}",
        "NAME", "PROFILE", "PHASE", "PASS", "WARN", "FAIL", "LAST RUN"
    );
    println!("{}", "-".repeat(100));

    for (name, profile, phase, pass, warn, fail, last_run) in &rows {
        println!(
            "{:<30} {:<12} {:<10} {:>5} {:>5} {:>5} {:<25}",
            name, profile, phase, pass, warn, fail, last_run
        );
    }

    println!("\nTotal: {} assessment requests", rows.len());

    Ok(())
}
