use crate::crd::{Finding, FindingStatus, Remediation, RemediationSafety};
use crate::profile::Profile;
use crate::registry::Validator;
use crate::view::{is_system_namespace, ClusterView};

pub struct PrivilegedContainers;

#[async_trait::async_trait]
impl Validator for PrivilegedContainers {
    fn name(&self) -> &str {
        "privileged-containers"
    }

    fn description(&self) -> &str {
        "Flags pods running privileged containers."
    }

    fn category(&self) -> &str {
        "pod-security"
    }

    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String> {
        if profile.thresholds.allow_privileged_containers {
            return Ok(vec![]);
        }

        let namespaces = view.namespaces().await.map_err(|e| e.to_string())?;
        let mut findings = Vec::new();

        for ns in &namespaces {
            let ns_name = ns.metadata.name.clone().unwrap_or_default();
            if is_system_namespace(&ns_name) {
                continue;
            }

            let pods = view.pods(&ns_name).await.map_err(|e| e.to_string())?;

            for pod in &pods {
                let pod_name = pod.metadata.name.clone().unwrap_or_default();
                let Some(spec) = &pod.spec else { continue };

                for container in &spec.containers {
                    let privileged = container
                        .security_context
                        .as_ref()
                        .and_then(|sc| sc.privileged)
                        .unwrap_or(false);

                    if privileged {
                        findings.push(Finding {
                            id: format!("privileged-{ns_name}-{pod_name}-{}", container.name),
                            validator: self.name().to_string(),
                            category: self.category().to_string(),
                            resource: Some(format!("Pod/{pod_name}")),
                            namespace: Some(ns_name.clone()),
                            status: FindingStatus::Fail,
                            title: "Privileged container".to_string(),
                            description: format!(
                                "Container '{}' in pod '{pod_name}' runs privileged",
                                container.name
                            ),
                            impact: Some(
                                "Privileged containers can access the host kernel and devices directly.".to_string(),
                            ),
                            recommendation: Some(
                                "Remove `privileged: true` and grant only the specific capabilities required.".to_string(),
                            ),
                            references: vec![],
                            remediation: Some(Remediation {
                                guidance: "Drop privileged mode; add specific capabilities via securityContext.capabilities.add if needed.".to_string(),
                                safety: RemediationSafety::RequiresReview,
                            }),
                            suppressed: false,
                            suppression_reason: None,
                        });
                    }
                }
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::resolve;
    use crate::view::tests_support::FakeClusterView;
    use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, SecurityContext};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    struct NoOverrides;
    impl crate::profile::OverrideLookup for NoOverrides {
        fn lookup(&self, _name: &str) -> Option<crate::crd::ProfileOverrideSpec> {
            None
        }
    }

    fn privileged_pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "main".to_string(),
                    security_context: Some(SecurityContext {
                        privileged: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_fails_on_privileged_pod() {
        let mut view = FakeClusterView::new().with_namespace("app");
        view.pods.insert("app".to_string(), vec![privileged_pod("p1")]);
        let profile = resolve("production", &NoOverrides).unwrap();
        let findings = PrivilegedContainers.validate(&view, &profile).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, FindingStatus::Fail);
        assert!(findings[0].remediation.is_some());
    }

    #[tokio::test]
    async fn test_allowed_in_development() {
        let mut view = FakeClusterView::new().with_namespace("app");
        view.pods.insert("app".to_string(), vec![privileged_pod("p1")]);
        let profile = resolve("development", &NoOverrides).unwrap();
        let findings = PrivilegedContainers.validate(&view, &profile).await.unwrap();
        assert!(findings.is_empty());
    }
}
