use crate::crd::{CompactFinding, DeltaSummary, Summary};

/// Computes the four-way delta between two consecutive runs.
///
/// `newFindings`/`resolvedFindings`/`regressionFindings`/`improvedFindings` are pairwise
/// disjoint by construction (each id falls into exactly one bucket) and sorted ascending.
pub fn compute_delta(
    current: &[CompactFinding],
    previous: Option<&[CompactFinding]>,
    current_summary: &Summary,
    previous_summary: Option<&Summary>,
) -> Option<DeltaSummary> {
    let previous = previous?;

    let current_map: std::collections::HashMap<&str, &CompactFinding> =
        current.iter().map(|f| (f.id.as_str(), f)).collect();
    let previous_map: std::collections::HashMap<&str, &CompactFinding> =
        previous.iter().map(|f| (f.id.as_str(), f)).collect();

    let mut new_findings = Vec::new();
    let mut resolved_findings = Vec::new();
    let mut regression_findings = Vec::new();
    let mut improved_findings = Vec::new();

    for (id, cur) in &current_map {
        match previous_map.get(id) {
            None => new_findings.push(id.to_string()),
            Some(prev) => {
                if cur.status != prev.status {
                    if cur.status.rank() > prev.status.rank() {
                        regression_findings.push(id.to_string());
                    } else {
                        improved_findings.push(id.to_string());
                    }
                }
            }
        }
    }

    for id in previous_map.keys() {
        if !current_map.contains_key(id) {
            resolved_findings.push(id.to_string());
        }
    }

    new_findings.sort();
    resolved_findings.sort();
    regression_findings.sort();
    improved_findings.sort();

    let score_delta = match (current_summary.score, previous_summary.and_then(|s| s.score)) {
        (Some(c), Some(p)) => Some(c as i32 - p as i32),
        _ => None,
    };

    Some(DeltaSummary {
        new_findings,
        resolved_findings,
        regression_findings,
        improved_findings,
        score_delta,
    })
}

/// Given the full snapshot list for a request (any order), return the names of the
/// oldest entries to delete so that at most `limit` remain.
pub fn prune_plan(mut snapshots: Vec<(String, chrono::DateTime<chrono::Utc>)>, limit: u32) -> Vec<String> {
    snapshots.sort_by_key(|(_, run_time)| *run_time);
    let overflow = snapshots.len().saturating_sub(limit as usize);
    snapshots
        .into_iter()
        .take(overflow)
        .map(|(name, _)| name)
        .collect()
}

/// Deterministic snapshot resource name for a run.
pub fn snapshot_name(request_name: &str, run_time: chrono::DateTime<chrono::Utc>) -> String {
    format!("{request_name}-{}", run_time.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::FindingStatus;

    fn cf(id: &str, status: FindingStatus) -> CompactFinding {
        CompactFinding {
            id: id.to_string(),
            validator: "v".to_string(),
            category: "cat".to_string(),
            status,
            title: id.to_string(),
            resource: None,
            namespace: None,
        }
    }

    #[test]
    fn test_delta_is_none_without_previous() {
        let current = vec![cf("a", FindingStatus::Pass)];
        let delta = compute_delta(&current, None, &Summary::default(), None);
        assert!(delta.is_none());
    }

    #[test]
    fn test_delta_scenario_2() {
        let previous = vec![cf("a", FindingStatus::Pass), cf("b", FindingStatus::Fail)];
        let current = vec![
            cf("a", FindingStatus::Pass),
            cf("b", FindingStatus::Warn),
            cf("c", FindingStatus::Fail),
        ];
        let prev_summary = Summary { score: Some(50), ..Default::default() };
        let cur_summary = Summary { score: Some(50), ..Default::default() };

        let delta = compute_delta(&current, Some(&previous), &cur_summary, Some(&prev_summary)).unwrap();
        assert_eq!(delta.new_findings, vec!["c".to_string()]);
        assert!(delta.resolved_findings.is_empty());
        assert_eq!(delta.improved_findings, vec!["b".to_string()]);
        assert!(delta.regression_findings.is_empty());
        assert_eq!(delta.score_delta, Some(0));
    }

    #[test]
    fn test_delta_regression_when_status_worsens() {
        let previous = vec![cf("a", FindingStatus::Pass)];
        let current = vec![cf("a", FindingStatus::Fail)];
        let delta = compute_delta(&current, Some(&previous), &Summary::default(), None).unwrap();
        assert_eq!(delta.regression_findings, vec!["a".to_string()]);
    }

    #[test]
    fn test_delta_resolved_when_id_disappears() {
        let previous = vec![cf("a", FindingStatus::Fail)];
        let current: Vec<CompactFinding> = vec![];
        let delta = compute_delta(&current, Some(&previous), &Summary::default(), None).unwrap();
        assert_eq!(delta.resolved_findings, vec!["a".to_string()]);
    }

    #[test]
    fn test_delta_buckets_are_pairwise_disjoint() {
        let previous = vec![
            cf("stable", FindingStatus::Pass),
            cf("worsens", FindingStatus::Pass),
            cf("improves", FindingStatus::Fail),
            cf("gone", FindingStatus::Fail),
        ];
        let current = vec![
            cf("stable", FindingStatus::Pass),
            cf("worsens", FindingStatus::Fail),
            cf("improves", FindingStatus::Pass),
            cf("fresh", FindingStatus::Warn),
        ];
        let delta = compute_delta(&current, Some(&previous), &Summary::default(), None).unwrap();

        let all: Vec<&String> = delta
            .new_findings
            .iter()
            .chain(&delta.resolved_findings)
            .chain(&delta.regression_findings)
            .chain(&delta.improved_findings)
            .collect();
        let mut unique = all.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(all.len(), unique.len());
    }

    #[test]
    fn test_prune_plan_keeps_most_recent() {
        use chrono::{TimeZone, Utc};
        let snapshots = vec![
            ("s1".to_string(), Utc.timestamp_opt(1, 0).unwrap()),
            ("s2".to_string(), Utc.timestamp_opt(2, 0).unwrap()),
            ("s3".to_string(), Utc.timestamp_opt(3, 0).unwrap()),
        ];
        let to_delete = prune_plan(snapshots, 2);
        assert_eq!(to_delete, vec!["s1".to_string()]);
    }

    #[test]
    fn test_prune_plan_no_overflow_deletes_nothing() {
        use chrono::{TimeZone, Utc};
        let snapshots = vec![("s1".to_string(), Utc.timestamp_opt(1, 0).unwrap())];
        assert!(prune_plan(snapshots, 5).is_empty());
    }

    #[test]
    fn test_snapshot_name_format() {
        use chrono::{TimeZone, Utc};
        let run_time = Utc.with_ymd_and_hms(2026, 7, 28, 14, 30, 5).unwrap();
        assert_eq!(snapshot_name("prod-assessment", run_time), "prod-assessment-20260728-143005");
    }
}
