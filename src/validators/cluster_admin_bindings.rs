use crate::crd::{Finding, FindingStatus};
use crate::profile::Profile;
use crate::registry::Validator;
use crate::view::ClusterView;

pub struct ClusterAdminBindings;

#[async_trait::async_trait]
impl Validator for ClusterAdminBindings {
    fn name(&self) -> &str {
        "cluster-admin-bindings"
    }

    fn description(&self) -> &str {
        "Counts ClusterRoleBindings granting cluster-admin."
    }

    fn category(&self) -> &str {
        "rbac"
    }

    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String> {
        let bindings = view.cluster_role_bindings().await.map_err(|e| e.to_string())?;
        let count = bindings
            .iter()
            .filter(|b| b.role_ref.name == "cluster-admin")
            .count() as u32;

        let status = if count > profile.thresholds.max_cluster_admin_bindings {
            FindingStatus::Fail
        } else {
            FindingStatus::Pass
        };

        Ok(vec![Finding {
            id: "cluster-admin-binding-count".to_string(),
            validator: self.name().to_string(),
            category: self.category().to_string(),
            resource: None,
            namespace: None,
            status,
            title: "cluster-admin ClusterRoleBinding count".to_string(),
            description: format!(
                "{count} ClusterRoleBinding(s) grant cluster-admin, threshold is {}",
                profile.thresholds.max_cluster_admin_bindings
            ),
            impact: if status == FindingStatus::Fail {
                Some("Excess cluster-admin grants widen the blast radius of a single compromised identity.".to_string())
            } else {
                None
            },
            recommendation: if status == FindingStatus::Fail {
                Some("Replace broad cluster-admin bindings with narrower roles.".to_string())
            } else {
                None
            },
            references: vec![],
            remediation: None,
            suppressed: false,
            suppression_reason: None,
        }])
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
    async fn test_fails_when_over_threshold() {
        let mut view = FakeClusterView::new();
        for i in 0..10 {
            view = view.with_cluster_role_binding(if i < 6 { "cluster-admin" } else { "view" });
        }
        let profile = resolve("production", &NoOverrides).unwrap();
        let findings = ClusterAdminBindings.validate(&view, &profile).await.unwrap();
        assert_eq!(findings[0].status, FindingStatus::Fail);
    }

    #[tokio::test]
    async fn test_passes_when_within_threshold() {
        let view = FakeClusterView::new().with_cluster_role_binding("cluster-admin");
        let profile = resolve("production", &NoOverrides).unwrap();
        let findings = ClusterAdminBindings.validate(&view, &profile).await.unwrap();
        assert_eq!(findings[0].status, FindingStatus::Pass);
    }
}
