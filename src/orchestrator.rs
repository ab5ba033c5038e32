use std::time::Duration;

use crate::crd::{Finding, FindingStatus, Suppression, Summary};
use crate::profile::Profile;
use crate::registry::{Registry, Validator};
use crate::view::ClusterView;

/// Result of one validator fan-out: the aggregated, filtered, scored findings.
pub struct RunOutcome {
    pub findings: Vec<Finding>,
    pub summary: Summary,
}

/// Runs the selected validators sequentially in lexicographic order, collects their
/// findings, applies the severity filter and suppression rules, and computes the score.
///
/// Returns an error only when every selected validator failed and none produced a
/// finding — a per-validator failure on its own becomes a synthetic FAIL finding.
///
/// `deadline`, when set, bounds the whole fan-out. If it elapses mid-run, no further
/// validators are launched; the findings gathered so far are kept and a synthetic
/// FAIL finding noting the cancellation is appended.
pub async fn run(
    registry: &Registry,
    view: &dyn ClusterView,
    profile: &Profile,
    requested_validators: &[String],
    min_severity: Option<FindingStatus>,
    suppressions: &[Suppression],
    now: chrono::DateTime<chrono::Utc>,
    deadline: Option<Duration>,
) -> Result<RunOutcome, String> {
    let (selected, mut findings) = select_validators(registry, profile, requested_validators);

    let mut any_success = false;
    let start = tokio::time::Instant::now();
    let mut cancelled = false;

    for validator in &selected {
        let remaining = match deadline {
            Some(budget) => match budget.checked_sub(start.elapsed()) {
                Some(r) if !r.is_zero() => r,
                _ => {
                    cancelled = true;
                    break;
                }
            },
            None => Duration::MAX,
        };

        match tokio::time::timeout(remaining, validator.validate(view, profile)).await {
            Ok(Ok(mut vf)) => {
                any_success = true;
                findings.append(&mut vf);
            }
            Ok(Err(message)) => {
                findings.push(error_finding(validator.name(), &message));
            }
            Err(_elapsed) => {
                cancelled = true;
                break;
            }
        }
    }

    if cancelled {
        findings.push(cancellation_finding());
    }

    if !selected.is_empty() && !any_success && !cancelled {
        return Err("all selected validators failed".to_string());
    }

    if !profile.disabled_checks.is_empty() {
        findings.retain(|f| !profile.disabled_checks.contains(&f.id));
    }

    apply_suppressions(&mut findings, suppressions, now);

    if let Some(floor) = min_severity {
        findings.retain(|f| f.status.rank() >= floor.rank());
    }

    let summary = summarize(&findings, &profile.name);

    Ok(RunOutcome { findings, summary })
}

fn cancellation_finding() -> Finding {
    Finding {
        id: "fan-out-cancelled".to_string(),
        validator: "orchestrator".to_string(),
        category: "internal".to_string(),
        resource: None,
        namespace: None,
        status: FindingStatus::Fail,
        title: "Validator fan-out cancelled".to_string(),
        description: "The reconcile deadline elapsed before all validators could run; \
            remaining validators were not launched."
            .to_string(),
        impact: None,
        recommendation: None,
        references: vec![],
        remediation: None,
        suppressed: false,
        suppression_reason: None,
    }
}

/// Resolves the validator set to run, in the order they should execute, plus any
/// warning findings produced along the way (unknown names in an explicit request).
///
/// When the caller supplies an explicit order (`requested`), that order is preserved
/// after filtering to known, deduped names. Otherwise the set falls back to the
/// profile's enabled validators, then the full registry, sorted lexicographically.
/// Names in `profile.disabled_validators` are removed from the result either way.
fn select_validators<'a>(
    registry: &'a Registry,
    profile: &Profile,
    requested: &[String],
) -> (Vec<&'a dyn Validator>, Vec<Finding>) {
    let mut warnings = Vec::new();

    let mut selected: Vec<&dyn Validator> = if !requested.is_empty() {
        let mut seen = std::collections::HashSet::new();
        let mut ordered = Vec::new();
        for name in requested {
            if !seen.insert(name.clone()) {
                continue;
            }
            match registry.get(name) {
                Some(v) => ordered.push(v),
                None => warnings.push(unknown_validator_finding(name)),
            }
        }
        ordered
    } else {
        let names: Vec<String> = if !profile.enabled_validators.is_empty() {
            profile.enabled_validators.clone()
        } else {
            registry.all_sorted().iter().map(|v| v.name().to_string()).collect()
        };
        let mut ordered: Vec<&dyn Validator> = names.iter().filter_map(|n| registry.get(n)).collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()));
        ordered.dedup_by(|a, b| a.name() == b.name());
        ordered
    };

    if !profile.disabled_validators.is_empty() {
        selected.retain(|v| !profile.disabled_validators.iter().any(|d| d == v.name()));
    }

    (selected, warnings)
}

fn unknown_validator_finding(name: &str) -> Finding {
    Finding {
        id: format!("{name}-unknown-validator"),
        validator: "orchestrator".to_string(),
        category: "internal".to_string(),
        resource: None,
        namespace: None,
        status: FindingStatus::Warn,
        title: format!("Unknown validator '{name}' requested"),
        description: format!("'{name}' is not a registered validator and was skipped."),
        impact: None,
        recommendation: None,
        references: vec![],
        remediation: None,
        suppressed: false,
        suppression_reason: None,
    }
}

fn error_finding(validator_name: &str, message: &str) -> Finding {
    Finding {
        id: format!("{validator_name}-error"),
        validator: validator_name.to_string(),
        category: "internal".to_string(),
        resource: None,
        namespace: None,
        status: FindingStatus::Fail,
        title: format!("Validator '{validator_name}' failed"),
        description: message.to_string(),
        impact: None,
        recommendation: None,
        references: vec![],
        remediation: None,
        suppressed: false,
        suppression_reason: None,
    }
}

fn apply_suppressions(
    findings: &mut [Finding],
    suppressions: &[Suppression],
    now: chrono::DateTime<chrono::Utc>,
) {
    for finding in findings.iter_mut() {
        if let Some(rule) = suppressions.iter().find(|s| s.finding_id == finding.id) {
            let active = rule.expires_at.map_or(true, |exp| exp > now);
            if active {
                finding.suppressed = true;
                finding.suppression_reason = Some(rule.reason.clone());
            }
        }
    }
}

/// `score = round(100 * (pass + 0.5*warn) / max(1, pass+warn+fail))`, over non-suppressed
/// findings only. INFO never contributes. Absent when the denominator is zero.
pub fn summarize(findings: &[Finding], profile_name: &str) -> Summary {
    let mut summary = Summary {
        profile_used: Some(profile_name.to_string()),
        ..Default::default()
    };

    let mut pass = 0u32;
    let mut warn = 0u32;
    let mut fail = 0u32;

    for f in findings {
        match f.status {
            FindingStatus::Pass => summary.pass_count += 1,
            FindingStatus::Warn => summary.warn_count += 1,
            FindingStatus::Fail => summary.fail_count += 1,
            FindingStatus::Info => summary.info_count += 1,
        }

        if !f.suppressed {
            match f.status {
                FindingStatus::Pass => pass += 1,
                FindingStatus::Warn => warn += 1,
                FindingStatus::Fail => fail += 1,
                FindingStatus::Info => {}
            }
        }
    }

    summary.total_checks = findings.len() as u32;

    let denominator = pass + warn + fail;
    if denominator > 0 {
        let numerator = 100.0 * (pass as f64 + 0.5 * warn as f64);
        summary.score = Some((numerator / denominator as f64).round() as u32);
    }

    summary
}
