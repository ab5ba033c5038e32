use crate::crd::{AssessmentRequestSpec, FindingStatus};

/* ============================= TYPES ============================= */

/// A pre-defined assessment request template with a name and description.
#[derive(Debug, Clone)]
pub struct RequestBundle {
    pub name: String,
    pub description: String,
    pub spec: AssessmentRequestSpec,
}

/* ============================= BUNDLES ============================= */

/// Return all built-in request bundles.
pub fn all_bundles() -> Vec<RequestBundle> {
    vec![minimal_bundle(), standard_bundle(), strict_bundle()]
}

/// Look up a bundle by name (case-insensitive).
pub fn get_bundle(name: &str) -> Option<RequestBundle> {
    let lower = name.to_lowercase();
    all_bundles().into_iter().find(|b| b.name == lower)
}

fn minimal_bundle() -> RequestBundle {
    RequestBundle {
        name: "minimal".to_string(),
        description: "One-shot development-profile run, FAIL findings only.".to_string(),
        spec: AssessmentRequestSpec {
            profile: Some("development".to_string()),
            min_severity: Some(FindingStatus::Fail),
            history_limit: 0,
            ..Default::default()
        },
    }
}

fn standard_bundle() -> RequestBundle {
    RequestBundle {
        name: "standard".to_string(),
        description: "Production profile on a six-hourly schedule, WARN and above.".to_string(),
        spec: AssessmentRequestSpec {
            profile: Some("production".to_string()),
            schedule: Some("0 0 */6 * * *".to_string()),
            min_severity: Some(FindingStatus::Warn),
            history_limit: 90,
            ..Default::default()
        },
    }
}

fn strict_bundle() -> RequestBundle {
    RequestBundle {
        name: "strict".to_string(),
        description: "Production profile on an hourly schedule, every finding retained.".to_string(),
        spec: AssessmentRequestSpec {
            profile: Some("production".to_string()),
            schedule: Some("0 0 * * * *".to_string()),
            history_limit: 365,
            ..Default::default()
        },
    }
}

/* ============================= TESTS ============================= */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_bundles_count() {
        assert_eq!(all_bundles().len(), 3);
    }

    #[test]
    fn test_get_bundle_minimal() {
        let bundle = get_bundle("minimal").unwrap();
        assert_eq!(bundle.spec.profile, Some("development".to_string()));
        assert_eq!(bundle.spec.history_limit, 0);
    }

    #[test]
    fn test_get_bundle_standard_has_schedule() {
        let bundle = get_bundle("standard").unwrap();
        assert!(bundle.spec.schedule.is_some());
    }

    #[test]
    fn test_get_bundle_unknown_returns_none() {
        assert!(get_bundle("nonexistent").is_none());
    }

    #[test]
    fn test_get_bundle_case_insensitive() {
        assert!(get_bundle("Standard").is_some());
        assert!(get_bundle("STRICT").is_some());
    }

    #[test]
    fn test_bundle_names_unique() {
        let bundles = all_bundles();
        let names: Vec<&str> = bundles.iter().map(|b| b.name.as_str()).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_every_bundle_serializes() {
        for bundle in all_bundles() {
            let json = serde_json::to_string(&bundle.spec).expect("should serialize");
            let _: AssessmentRequestSpec = serde_json::from_str(&json).expect("should deserialize");
        }
    }
}
