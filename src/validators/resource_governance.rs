use crate::crd::{Finding, FindingStatus};
use crate::profile::Profile;
use crate::registry::Validator;
use crate::view::{is_system_namespace, ClusterView};

pub struct ResourceGovernance;

#[async_trait::async_trait]
impl Validator for ResourceGovernance {
    fn name(&self) -> &str {
        "resource-governance"
    }

    fn description(&self) -> &str {
        "Flags namespaces missing a ResourceQuota or LimitRange."
    }

    fn category(&self) -> &str {
        "resource-management"
    }

    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String> {
        if !profile.thresholds.require_resource_quotas && !profile.thresholds.require_limit_ranges {
            return Ok(vec![]);
        }

        let namespaces = view.namespaces().await.map_err(|e| e.to_string())?;
        let mut findings = Vec::new();

        for ns in &namespaces {
            let name = ns.metadata.name.clone().unwrap_or_default();
            if is_system_namespace(&name) {
                continue;
            }

            if profile.thresholds.require_resource_quotas {
                let quotas = view.resource_quotas(&name).await.map_err(|e| e.to_string())?;
                findings.push(presence_finding(
                    self.name(),
                    self.category(),
                    &format!("resource-quota-{name}"),
                    &name,
                    "ResourceQuota",
                    !quotas.is_empty(),
                ));
            }

            if profile.thresholds.require_limit_ranges {
                let ranges = view.limit_ranges(&name).await.map_err(|e| e.to_string())?;
                findings.push(presence_finding(
                    self.name(),
                    self.category(),
                    &format!("limit-range-{name}"),
                    &name,
                    "LimitRange",
                    !ranges.is_empty(),
                ));
            }
        }

        Ok(findings)
    }
}

fn presence_finding(
    validator: &str,
    category: &str,
    id: &str,
    namespace: &str,
    kind: &str,
    present: bool,
) -> Finding {
    Finding {
        id: id.to_string(),
        validator: validator.to_string(),
        category: category.to_string(),
        resource: None,
        namespace: Some(namespace.to_string()),
        status: if present { FindingStatus::Pass } else { FindingStatus::Warn },
        title: format!("Namespace {} a {kind}", if present { "has" } else { "is missing" }),
        description: format!("Namespace '{namespace}' {} a {kind}", if present { "has" } else { "has no" }),
        impact: if present {
            None
        } else {
            Some(format!("Workloads in '{namespace}' are not bound by a {kind}."))
        },
        recommendation: if present {
            None
        } else {
            Some(format!("Create a {kind} for namespace '{namespace}'."))
        },
        references: vec![],
        remediation: None,
        suppressed: false,
        suppression_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::resolve;
    use crate::view::tests_support::FakeClusterView;

    struct NoOverrides;
    impl crate::profile::OverrideLookup for NoOverrides {
        fn lookup(&self, _name: &str) -> Option<crate::crd::ProfileOverrideSpec> {
            None
        }
    }

    #[tokio::test]
    async fn test_warns_on_missing_quota_and_limit_range() {
        let view = FakeClusterView::new().with_namespace("app");
        let profile = resolve("production", &NoOverrides).unwrap();
        let findings = ResourceGovernance.validate(&view, &profile).await.unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.status == FindingStatus::Warn));
    }

    #[tokio::test]
    async fn test_skipped_when_not_required() {
        let view = FakeClusterView::new().with_namespace("app");
        let profile = resolve("development", &NoOverrides).unwrap();
        let findings = ResourceGovernance.validate(&view, &profile).await.unwrap();
        assert!(findings.is_empty());
    }
}
