mod cluster_admin_bindings;
mod network_policy_presence;
mod node_readiness;
mod privileged_containers;
mod resource_governance;

use crate::registry::Registry;

pub fn register_builtins(registry: &mut Registry) {
    registry.register(Box::new(node_readiness::NodeReadiness));
    registry.register(Box::new(cluster_admin_bindings::ClusterAdminBindings));
    registry.register(Box::new(network_policy_presence::NetworkPolicyPresence));
    registry.register(Box::new(resource_governance::ResourceGovernance));
    registry.register(Box::new(privileged_containers::PrivilegedContainers));
}
