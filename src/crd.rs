use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/* ============================= SEVERITY & PHASE ============================= */

/// Outcome of a single validator check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum FindingStatus {
    #[default]
    Info,
    Pass,
    Warn,
    Fail,
}

impl FindingStatus {
    /// Ordering used by both the severity filter and delta regression/improvement detection.
    pub fn rank(self) -> u8 {
        match self {
            FindingStatus::Info => 0,
            FindingStatus::Pass => 1,
            FindingStatus::Warn => 2,
            FindingStatus::Fail => 3,
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FindingStatus::Info => "INFO",
            FindingStatus::Pass => "PASS",
            FindingStatus::Warn => "WARN",
            FindingStatus::Fail => "FAIL",
        };
        write!(f, "{s}")
    }
}

/// Current lifecycle phase of an assessment request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// Safety classification carried alongside advisory remediation text. The engine never
/// acts on this itself — it is data for a human or an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationSafety {
    SafeApply,
    RequiresReview,
    Destructive,
}

/* ============================= FINDING ============================= */

/// A single check outcome emitted by a validator.
///
/// `(validator, id)` is the finding's stable identity across runs; it is how the delta
/// engine matches a check between two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub validator: String,
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub status: FindingStatus,
    pub title: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,

    #[serde(default)]
    pub suppressed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_reason: Option<String>,
}

impl Finding {
    pub fn compact(&self) -> CompactFinding {
        CompactFinding {
            id: self.id.clone(),
            validator: self.validator.clone(),
            category: self.category.clone(),
            status: self.status,
            title: self.title.clone(),
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Advisory remediation guidance. Never executed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Remediation {
    pub guidance: String,
    pub safety: RemediationSafety,
}

/// The subset of a `Finding` retained in long-term history snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompactFinding {
    pub id: String,
    pub validator: String,
    pub category: String,
    pub status: FindingStatus,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/* ============================= SUMMARY / CLUSTER INFO ============================= */

/// Counts plus the derived score for one completed run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_checks: u32,
    pub pass_count: u32,
    pub warn_count: u32,
    pub fail_count: u32,
    pub info_count: u32,

    /// Absent iff `pass_count + warn_count + fail_count == 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_used: Option<String>,
}

/// Gross shape of the audited cluster, captured once per run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    pub node_count: u32,
    pub control_plane_node_count: u32,
    pub worker_node_count: u32,
    pub namespace_count: u32,
}

/// Four-way classification of findings between two consecutive runs, plus the score delta.
///
/// The four sequences are pairwise disjoint and each is sorted ascending.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSummary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_findings: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_findings: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regression_findings: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improved_findings: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_delta: Option<i32>,
}

/// A single suppression rule naming a finding id to exclude from scoring.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suppression {
    pub finding_id: String,
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Destination consumed only by external collaborators (report renderer, storage exporter).
/// The engine passes this through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportStorage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo_url: Option<String>,
}

/* ============================= ASSESSMENT REQUEST CRD ============================= */

/// AssessmentRequest asks the engine to evaluate the cluster against a named profile,
/// either once or on a cron schedule.
///
/// Cluster-scoped: an assessment reasons about the whole cluster, not a single namespace.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "assessment.openshift.io",
    version = "v1",
    kind = "AssessmentRequest",
    plural = "assessmentrequests",
    shortname = "ca",
    status = "AssessmentRequestStatus",
    printcolumn = r#"{"name":"Profile", "type":"string", "jsonPath":".spec.profile"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Pass", "type":"integer", "jsonPath":".status.summary.passCount"}"#,
    printcolumn = r#"{"name":"Warn", "type":"integer", "jsonPath":".status.summary.warnCount"}"#,
    printcolumn = r#"{"name":"Fail", "type":"integer", "jsonPath":".status.summary.failCount"}"#,
    printcolumn = r#"{"name":"Last Run", "type":"string", "jsonPath":".status.lastRunTime"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequestSpec {
    /// Name of a built-in profile ("production", "development") or a `ProfileOverride`.
    /// Empty defaults to "production".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Restrict the run to these validator names. Empty means "follow the profile",
    /// which in turn falls back to "all registered validators".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<String>,

    /// Cron expression (five or six field). Empty means single-shot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Pause scheduled runs. Manual re-run trigger still works while suspended.
    #[serde(default)]
    pub suspend: bool,

    /// Drop findings below this severity before they are written to status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<FindingStatus>,

    /// Maximum number of history snapshots retained for this request. 0 disables history.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressions: Vec<Suppression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_storage: Option<ReportStorage>,
}

fn default_history_limit() -> u32 {
    90
}

/// Observed state of an `AssessmentRequest`, written only by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequestStatus {
    #[serde(default)]
    pub phase: Phase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_time: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_time: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_info: Option<ClusterInfo>,

    #[serde(default)]
    pub summary: Summary,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<DeltaSummary>,

    #[serde(default)]
    pub snapshot_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/* ============================= PROFILE OVERRIDE CRD ============================= */

/// Every threshold field is a nullable pointer: `None` inherits the base profile's
/// value, `Some` replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_control_plane_nodes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_worker_nodes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cluster_admin_bindings: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_network_policy: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_resource_quotas: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_limit_ranges: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_days_without_update: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privileged_containers: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_default_storage_class: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strictness: Option<u8>,
}

/// Name of a compiled-in base profile a `ProfileOverride` may build on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BaseProfile {
    Production,
    Development,
}

impl Default for BaseProfile {
    fn default() -> Self {
        BaseProfile::Production
    }
}

impl BaseProfile {
    pub fn name(self) -> &'static str {
        match self {
            BaseProfile::Production => "production",
            BaseProfile::Development => "development",
        }
    }
}

/// ProfileOverride customises a built-in profile by field-wise replacement.
///
/// Cluster-scoped, since profiles are a cluster-wide concept.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "assessment.openshift.io",
    version = "v1",
    kind = "ProfileOverride",
    plural = "profileoverrides",
    shortname = "ap",
    status = "ProfileOverrideStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverrideSpec {
    #[serde(default)]
    pub based_on: BaseProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdOverrides>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_validators: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_validators: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_checks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverrideStatus {
    #[serde(default)]
    pub ready: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub resolved_validator_count: u32,
}

/* ============================= SNAPSHOT CRD ============================= */

/// Snapshot is an immutable point-in-time record of one completed run, used for
/// trend analysis. Never mutated after creation.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "assessment.openshift.io",
    version = "v1",
    kind = "Snapshot",
    plural = "snapshots",
    shortname = "as",
    status = "SnapshotStatus",
    printcolumn = r#"{"name":"Assessment", "type":"string", "jsonPath":".spec.assessmentName"}"#,
    printcolumn = r#"{"name":"Profile", "type":"string", "jsonPath":".spec.profile"}"#,
    printcolumn = r#"{"name":"Run Time", "type":"string", "jsonPath":".status.runTime"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    pub assessment_name: String,
    pub profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_time: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default)]
    pub summary: Summary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_info: Option<ClusterInfo>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compact_findings: Vec<CompactFinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<DeltaSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_snapshot_name: Option<String>,
}

/// Label used to discover every snapshot belonging to a request.
pub const SNAPSHOT_NAME_LABEL: &str = "assessment.openshift.io/name";
/// Annotation that triggers an immediate, unconditional reconciliation. Cleared on read.
pub const TRIGGER_ANNOTATION: &str = "assessment.openshift.io/trigger";
pub const TRIGGER_VALUE_RUN: &str = "run";

/* ============================= TESTS ============================= */

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_assessment_request_crd_generates() {
        let crd = AssessmentRequest::crd();
        assert_eq!(crd.spec.group, "assessment.openshift.io");
        assert_eq!(crd.spec.names.kind, "AssessmentRequest");
        assert_eq!(crd.spec.names.plural, "assessmentrequests");
        assert_eq!(crd.spec.scope, "Cluster");
    }

    #[test]
    fn test_profile_override_crd_generates() {
        let crd = ProfileOverride::crd();
        assert_eq!(crd.spec.names.kind, "ProfileOverride");
        assert_eq!(crd.spec.scope, "Cluster");
    }

    #[test]
    fn test_snapshot_crd_generates() {
        let crd = Snapshot::crd();
        assert_eq!(crd.spec.names.kind, "Snapshot");
        assert_eq!(crd.spec.scope, "Cluster");
    }

    #[test]
    fn test_finding_status_rank_order() {
        assert!(FindingStatus::Info.rank() < FindingStatus::Pass.rank());
        assert!(FindingStatus::Pass.rank() < FindingStatus::Warn.rank());
        assert!(FindingStatus::Warn.rank() < FindingStatus::Fail.rank());
    }

    #[test]
    fn test_finding_status_display() {
        assert_eq!(FindingStatus::Fail.to_string(), "FAIL");
        assert_eq!(FindingStatus::Info.to_string(), "INFO");
    }

    #[test]
    fn test_default_history_limit_is_90() {
        let spec = AssessmentRequestSpec::default();
        assert_eq!(spec.history_limit, 90);
    }

    #[test]
    fn test_default_base_profile_is_production() {
        assert_eq!(BaseProfile::default(), BaseProfile::Production);
    }

    #[test]
    fn test_finding_compact_preserves_identity_fields() {
        let finding = Finding {
            id: "a".to_string(),
            validator: "v".to_string(),
            category: "cat".to_string(),
            resource: Some("Pod/x".to_string()),
            namespace: Some("ns".to_string()),
            status: FindingStatus::Warn,
            title: "title".to_string(),
            description: "desc".to_string(),
            impact: None,
            recommendation: None,
            references: vec![],
            remediation: None,
            suppressed: false,
            suppression_reason: None,
        };
        let compact = finding.compact();
        assert_eq!(compact.id, finding.id);
        assert_eq!(compact.validator, finding.validator);
        assert_eq!(compact.category, finding.category);
        assert_eq!(compact.status, finding.status);
        assert_eq!(compact.title, finding.title);
        assert_eq!(compact.resource, finding.resource);
        assert_eq!(compact.namespace, finding.namespace);
    }

    #[test]
    fn test_spec_roundtrip_serialization() {
        let spec = AssessmentRequestSpec {
            profile: Some("production".to_string()),
            validators: vec!["node-readiness".to_string()],
            schedule: Some("0 */6 * * *".to_string()),
            suspend: false,
            min_severity: Some(FindingStatus::Warn),
            history_limit: 30,
            suppressions: vec![],
            report_storage: None,
        };
        let json = serde_json::to_string(&spec).expect("should serialize");
        let back: AssessmentRequestSpec = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, spec);
    }

    #[test]
    fn test_status_default_phase_is_pending() {
        let status = AssessmentRequestStatus::default();
        assert_eq!(status.phase, Phase::Pending);
    }

    #[test]
    fn test_remediation_safety_serializes_kebab_case() {
        let r = Remediation {
            guidance: "scale up".to_string(),
            safety: RemediationSafety::RequiresReview,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["safety"], "requires-review");
    }
}
