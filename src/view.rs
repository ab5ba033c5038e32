use k8s_openapi::api::core::v1::{LimitRange, Namespace, Node, Pod, ResourceQuota};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use kube::api::ListParams;
use kube::{Api, Client};

use crate::crd::ClusterInfo;
use crate::error::Error;

/// Read-only access to cluster state, used by validators. The engine never issues a
/// mutating call through this trait — see the async fn signatures below, all reads.
#[async_trait::async_trait]
pub trait ClusterView: Send + Sync {
    async fn nodes(&self) -> Result<Vec<Node>, Error>;
    async fn namespaces(&self) -> Result<Vec<Namespace>, Error>;
    async fn cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, Error>;
    async fn network_policies(&self, namespace: &str) -> Result<Vec<NetworkPolicy>, Error>;
    async fn resource_quotas(&self, namespace: &str) -> Result<Vec<ResourceQuota>, Error>;
    async fn limit_ranges(&self, namespace: &str) -> Result<Vec<LimitRange>, Error>;
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, Error>;

    async fn cluster_info(&self) -> Result<ClusterInfo, Error> {
        let nodes = self.nodes().await?;
        let namespaces = self.namespaces().await?;
        let control_plane = nodes
            .iter()
            .filter(|n| is_control_plane_node(n))
            .count() as u32;
        Ok(ClusterInfo {
            kubernetes_version: None,
            node_count: nodes.len() as u32,
            control_plane_node_count: control_plane,
            worker_node_count: nodes.len() as u32 - control_plane,
            namespace_count: namespaces.len() as u32,
        })
    }
}

pub fn is_control_plane_node(node: &Node) -> bool {
    node.metadata
        .labels
        .as_ref()
        .is_some_and(|labels| labels.contains_key("node-role.kubernetes.io/control-plane"))
}

/// Well-known namespaces excluded from namespace-scoped checks (network policy,
/// resource quota, limit range presence).
pub fn is_system_namespace(name: &str) -> bool {
    matches!(
        name,
        "kube-system" | "kube-public" | "kube-node-lease" | "openshift" | "openshift-monitoring"
    ) || name.starts_with("openshift-")
}

/// `ClusterView` backed by a live Kubernetes API server.
pub struct KubeClusterView {
    client: Client,
}

impl KubeClusterView {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ClusterView for KubeClusterView {
    async fn nodes(&self) -> Result<Vec<Node>, Error> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, Error> {
        let api: Api<ClusterRoleBinding> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn network_policies(&self, namespace: &str) -> Result<Vec<NetworkPolicy>, Error> {
        let api: Api<NetworkPolicy> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn resource_quotas(&self, namespace: &str) -> Result<Vec<ResourceQuota>, Error> {
        let api: Api<ResourceQuota> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn limit_ranges(&self, namespace: &str) -> Result<Vec<LimitRange>, Error> {
        let api: Api<LimitRange> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, Error> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}
