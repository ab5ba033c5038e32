use std::sync::LazyLock;

use crate::crd::{BaseProfile, ProfileOverrideSpec, ThresholdOverrides};
use crate::error::Error;

/* ============================= PROFILE ============================= */

/// Resolved, effective configuration used by validators during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub thresholds: Thresholds,
    pub strictness: u8,
    pub enabled_validators: Vec<String>,
    pub disabled_checks: Vec<String>,
    pub disabled_validators: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_control_plane_nodes: u32,
    pub min_worker_nodes: u32,
    pub max_cluster_admin_bindings: u32,
    pub require_network_policy: bool,
    pub require_resource_quotas: bool,
    pub require_limit_ranges: bool,
    pub max_days_without_update: u32,
    pub allow_privileged_containers: bool,
    pub require_default_storage_class: bool,
}

static PRODUCTION: LazyLock<Profile> = LazyLock::new(|| Profile {
    name: "production".to_string(),
    description: "Strict thresholds for production clusters.".to_string(),
    thresholds: Thresholds {
        min_control_plane_nodes: 3,
        min_worker_nodes: 3,
        max_cluster_admin_bindings: 5,
        require_network_policy: true,
        require_resource_quotas: true,
        require_limit_ranges: true,
        max_days_without_update: 90,
        allow_privileged_containers: false,
        require_default_storage_class: true,
    },
    strictness: 7,
    enabled_validators: Vec::new(),
    disabled_checks: Vec::new(),
    disabled_validators: Vec::new(),
});

static DEVELOPMENT: LazyLock<Profile> = LazyLock::new(|| Profile {
    name: "development".to_string(),
    description: "Lenient thresholds for development clusters.".to_string(),
    thresholds: Thresholds {
        min_control_plane_nodes: 1,
        min_worker_nodes: 1,
        max_cluster_admin_bindings: 20,
        require_network_policy: false,
        require_resource_quotas: false,
        require_limit_ranges: false,
        max_days_without_update: 180,
        allow_privileged_containers: true,
        require_default_storage_class: false,
    },
    strictness: 3,
    enabled_validators: Vec::new(),
    disabled_checks: Vec::new(),
    disabled_validators: Vec::new(),
});

fn builtin(name: &str) -> Option<Profile> {
    match name {
        "production" => Some(PRODUCTION.clone()),
        "development" => Some(DEVELOPMENT.clone()),
        _ => None,
    }
}

/// Looks up a `ProfileOverride` spec by name. Implemented against the cluster state
/// store by callers (the Kubernetes API in production, an in-memory map in tests).
pub trait OverrideLookup {
    fn lookup(&self, name: &str) -> Option<ProfileOverrideSpec>;
}

/// Resolve a profile name to its effective configuration.
///
/// Empty name defaults to "production". `basedOn` recursion is bounded to depth 1 —
/// an override may only name a built-in as its base, never another override.
pub fn resolve(name: &str, overrides: &dyn OverrideLookup) -> Result<Profile, Error> {
    let name = if name.is_empty() { "production" } else { name };

    if let Some(p) = builtin(name) {
        return Ok(p);
    }

    let Some(over) = overrides.lookup(name) else {
        return Err(Error::ProfileNotFound(name.to_string()));
    };

    let mut base = builtin(over.based_on.name()).expect("basedOn only names a built-in");

    if let Some(thr) = &over.thresholds {
        apply_threshold_overrides(&mut base.thresholds, thr);
        if let Some(s) = thr.strictness {
            base.strictness = s;
        }
    }

    if let Some(desc) = &over.description {
        if !desc.is_empty() {
            base.description = desc.clone();
        }
    }

    base.name = name.to_string();

    if !over.enabled_validators.is_empty() {
        base.enabled_validators = over.enabled_validators.clone();
    }

    if !over.disabled_checks.is_empty() {
        for check in &over.disabled_checks {
            if !base.disabled_checks.contains(check) {
                base.disabled_checks.push(check.clone());
            }
        }
    }

    if !over.disabled_validators.is_empty() {
        base.disabled_validators = over.disabled_validators.clone();
    }

    Ok(base)
}

fn apply_threshold_overrides(base: &mut Thresholds, over: &ThresholdOverrides) {
    if let Some(v) = over.min_control_plane_nodes {
        base.min_control_plane_nodes = v;
    }
    if let Some(v) = over.min_worker_nodes {
        base.min_worker_nodes = v;
    }
    if let Some(v) = over.max_cluster_admin_bindings {
        base.max_cluster_admin_bindings = v;
    }
    if let Some(v) = over.require_network_policy {
        base.require_network_policy = v;
    }
    if let Some(v) = over.require_resource_quotas {
        base.require_resource_quotas = v;
    }
    if let Some(v) = over.require_limit_ranges {
        base.require_limit_ranges = v;
    }
    if let Some(v) = over.max_days_without_update {
        base.max_days_without_update = v;
    }
    if let Some(v) = over.allow_privileged_containers {
        base.allow_privileged_containers = v;
    }
    if let Some(v) = over.require_default_storage_class {
        base.require_default_storage_class = v;
    }
}

/// Validates an override record at admission time (not at resolve time). Mirrors the
/// source of truth for `ProfileOverrideStatus.ready`/`message`/`resolvedValidatorCount`.
pub fn validate_override(
    spec: &ProfileOverrideSpec,
    registered_validators: &[&str],
) -> Result<u32, String> {
    for name in spec.enabled_validators.iter().chain(&spec.disabled_validators) {
        if !registered_validators.contains(&name.as_str()) {
            return Err(format!("unknown validator '{name}'"));
        }
    }

    let count = if !spec.enabled_validators.is_empty() {
        spec.enabled_validators.len() as u32
    } else {
        let disabled = spec.disabled_validators.len() as u32;
        (registered_validators.len() as u32).saturating_sub(disabled)
    };

    Ok(count)
}

/* ============================= TESTS ============================= */
