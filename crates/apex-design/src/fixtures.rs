//! Test data fixtures
//!
//! Fixtures are a pure function of `(requirement, case kind)`. The negative
//! set carries a raw script-injection string as a canary; it is data for
//! the system under test and is never evaluated here.

use apex_model::{CaseKind, Requirement};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Script-injection canary used in negative fixtures
pub const INJECTION_CANARY: &str = r#"<script>alert("xss")</script>"#;

/// Length of the oversized edge-case string in boundary fixtures
pub const OVERSIZED_INPUT_LEN: usize = 10_000;

/// Fixture map for one case
#[must_use]
pub fn test_data(requirement: &Requirement, kind: CaseKind) -> BTreeMap<String, Value> {
    let mut data = match kind {
        CaseKind::Positive => valid_fixtures(),
        CaseKind::Negative => invalid_fixtures(),
        CaseKind::Boundary => boundary_fixtures(),
    };
    data.insert("requirement_id".to_string(), json!(requirement.id));
    data
}

fn valid_fixtures() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("valid_inputs".to_string(), json!(["test_user", "valid_data", "12345"])),
        ("test_accounts".to_string(), json!(["user1@example.test", "user2@example.test"])),
        ("test_records".to_string(), json!(1000)),
        ("test_environment".to_string(), json!("staging")),
    ])
}

fn invalid_fixtures() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("invalid_inputs".to_string(), json!(["", "null", "undefined", INJECTION_CANARY])),
        ("invalid_accounts".to_string(), json!(["invalid@example.test", "notfound@example.test"])),
        ("invalid_records".to_string(), json!(-1)),
        ("test_environment".to_string(), json!("staging")),
    ])
}

fn boundary_fixtures() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("min_values".to_string(), json!([0, 1, -1])),
        ("max_values".to_string(), json!([999_999, 1_000_000, 1_000_001])),
        ("edge_cases".to_string(), json!(["", " ", "A".repeat(OVERSIZED_INPUT_LEN)])),
        ("test_environment".to_string(), json!("performance")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_model::RequirementKind;

    fn requirement() -> Requirement {
        Requirement {
            id: "REQ-9".into(),
            source_ref: "test".into(),
            kind: RequirementKind::Functional,
            text: "Users shall upload files".into(),
            testable: true,
            ambiguity_score: 0.0,
            scenario_hints: vec![],
            traceability_id: "T-9".into(),
        }
    }

    #[test]
    fn fixtures_are_deterministic() {
        let req = requirement();
        for kind in [CaseKind::Positive, CaseKind::Negative, CaseKind::Boundary] {
            assert_eq!(test_data(&req, kind), test_data(&req, kind));
        }
    }

    #[test]
    fn negative_fixtures_carry_injection_canary() {
        let data = test_data(&requirement(), CaseKind::Negative);
        let inputs = data["invalid_inputs"].as_array().unwrap();
        assert!(inputs.iter().any(|v| v == INJECTION_CANARY));
        assert_eq!(data["invalid_records"], json!(-1));
    }

    #[test]
    fn boundary_fixtures_include_oversized_string() {
        let data = test_data(&requirement(), CaseKind::Boundary);
        let longest = data["edge_cases"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .map(str::len)
            .max()
            .unwrap();
        assert_eq!(longest, OVERSIZED_INPUT_LEN);
        assert_eq!(data["test_environment"], "performance");
    }

    #[test]
    fn fixtures_name_their_requirement() {
        let data = test_data(&requirement(), CaseKind::Positive);
        assert_eq!(data["requirement_id"], "REQ-9");
    }
}
