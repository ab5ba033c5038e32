use crate::crd::{Finding, FindingStatus};
use crate::profile::Profile;
use crate::registry::Validator;
use crate::view::{is_system_namespace, ClusterView};

pub struct NetworkPolicyPresence;

#[async_trait::async_trait]
impl Validator for NetworkPolicyPresence {
    fn name(&self) -> &str {
        "network-policy-presence"
    }

    fn description(&self) -> &str {
        "Flags application namespaces with no NetworkPolicy."
    }

    fn category(&self) -> &str {
        "network"
    }

    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String> {
        if !profile.thresholds.require_network_policy {
            return Ok(vec![]);
        }

        let namespaces = view.namespaces().await.map_err(|e| e.to_string())?;
        let mut findings = Vec::new();

        for ns in &namespaces {
            let name = ns.metadata.name.clone().unwrap_or_default();
            if is_system_namespace(&name) {
                continue;
            }

            let policies = view.network_policies(&name).await.map_err(|e| e.to_string())?;

            if policies.is_empty() {
                findings.push(Finding {
                    id: format!("no-network-policy-{name}"),
                    validator: self.name().to_string(),
                    category: self.category().to_string(),
                    resource: None,
                    namespace: Some(name.clone()),
                    status: FindingStatus::Warn,
                    title: "Namespace has no NetworkPolicy".to_string(),
                    description: format!("Namespace '{name}' has zero NetworkPolicy objects"),
                    impact: Some("Pods in this namespace accept traffic from any source.".to_string()),
                    recommendation: Some("Define a default-deny NetworkPolicy and allow only required traffic.".to_string()),
                    references: vec![],
                    remediation: None,
                    suppressed: false,
                    suppression_reason: None,
                });
            } else {
                findings.push(Finding {
                    id: format!("no-network-policy-{name}"),
                    validator: self.name().to_string(),
                    category: self.category().to_string(),
                    resource: None,
                    namespace: Some(name.clone()),
                    status: FindingStatus::Pass,
                    title: "Namespace has a NetworkPolicy".to_string(),
                    description: format!("Namespace '{name}' has {} NetworkPolicy object(s)", policies.len()),
                    impact: None,
                    recommendation: None,
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
