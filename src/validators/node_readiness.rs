use crate::crd::{Finding, FindingStatus};
use crate::profile::Profile;
use crate::registry::Validator;
use crate::view::{is_control_plane_node, ClusterView};

pub struct NodeReadiness;

#[async_trait::async_trait]
impl Validator for NodeReadiness {
    fn name(&self) -> &str {
        "node-readiness"
    }

    fn description(&self) -> &str {
        "Checks control-plane/worker node counts and node readiness."
    }

    fn category(&self) -> &str {
        "infrastructure"
    }

    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String> {
        let nodes = view.nodes().await.map_err(|e| e.to_string())?;

        let control_plane = nodes.iter().filter(|n| is_control_plane_node(n)).count() as u32;
        let worker = nodes.len() as u32 - control_plane;

        let mut findings = Vec::new();

        if control_plane < profile.thresholds.min_control_plane_nodes {
            findings.push(Finding {
                id: "control-plane-count".to_string(),
                validator: self.name().to_string(),
                category: self.category().to_string(),
                resource: None,
                namespace: None,
                status: FindingStatus::Fail,
                title: "Insufficient control-plane nodes".to_string(),
                description: format!(
                    "Found {control_plane} control-plane node(s), expected at least {}",
                    profile.thresholds.min_control_plane_nodes
                ),
                impact: Some("Reduced control-plane availability under node failure.".to_string()),
                recommendation: Some(
                    "Add control-plane nodes to meet the quorum requirement.".to_string(),
                ),
                references: vec![],
                remediation: None,
                suppressed: false,
                suppression_reason: None,
            });
        } else {
            findings.push(pass(
                "control-plane-count",
                self.name(),
                self.category(),
                "Control-plane node count meets the threshold",
            ));
        }

        if worker < profile.thresholds.min_worker_nodes {
            findings.push(Finding {
                id: "worker-count".to_string(),
                validator: self.name().to_string(),
                category: self.category().to_string(),
                resource: None,
                namespace: None,
                status: FindingStatus::Fail,
                title: "Insufficient worker nodes".to_string(),
                description: format!(
                    "Found {worker} worker node(s), expected at least {}",
                    profile.thresholds.min_worker_nodes
                ),
                impact: Some("Limited scheduling capacity for workloads.".to_string()),
                recommendation: Some("Add worker nodes to the cluster.".to_string()),
                references: vec![],
                remediation: None,
                suppressed: false,
                suppression_reason: None,
            });
        } else {
            findings.push(pass(
                "worker-count",
                self.name(),
                self.category(),
                "Worker node count meets the threshold",
            ));
        }

        for node in &nodes {
            let name = node.metadata.name.clone().unwrap_or_default();
            let ready = node
                .status
                .as_ref()
                .and_then(|s| s.conditions.as_ref())
                .is_some_and(|conds| {
                    conds.iter().any(|c| c.type_ == "Ready" && c.status == "True")
                });

            if !ready {
                findings.push(Finding {
                    id: format!("node-not-ready-{name}"),
                    validator: self.name().to_string(),
                    category: self.category().to_string(),
                    resource: Some(format!("Node/{name}")),
                    namespace: None,
                    status: FindingStatus::Warn,
                    title: "Node not ready".to_string(),
                    description: format!("Node '{name}' is not reporting Ready"),
                    impact: Some("Pods may not schedule onto this node.".to_string()),
                    recommendation: Some("Investigate kubelet health on this node.".to_string()),
                    references: vec![],
                    remediation: None,
                    suppressed: false,
                    suppression_reason: None,
                });
            }
        }

        Ok(findings)
    }
}

fn pass(id: &str, validator: &str, category: &str, title: &str) -> Finding {
    Finding {
        id: id.to_string(),
        validator: validator.to_string(),
        category: category.to_string(),
        resource: None,
        namespace: None,
        status: FindingStatus::Pass,
        title: title.to_string(),
        description: title.to_string(),
        impact: None,
        recommendation: None,
        references: vec![],
        remediation: None,
        suppressed: false,
        suppression_reason: None,
    }
}
