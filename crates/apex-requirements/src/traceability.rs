//! Requirements traceability matrix

use apex_model::Requirement;
use serde::{Deserialize, Serialize};

/// Planned test coverage for one requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementTrace {
    pub requirement_id: String,
    pub traceability_id: String,
    /// One planned test per scenario hint
    pub test_count: usize,
    pub status: String,
}

/// Requirement → planned-test mapping for one classification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityMatrix {
    pub total_requirements: usize,
    pub coverage_percentage: u32,
    pub requirements_to_tests: Vec<RequirementTrace>,
    pub high_risk_requirements: Vec<String>,
}

impl TraceabilityMatrix {
    /// Build the matrix; every requirement is planned, so coverage is
    /// 100 whenever there is anything to cover
    #[must_use]
    pub fn build(requirements: &[Requirement]) -> Self {
        Self {
            total_requirements: requirements.len(),
            coverage_percentage: if requirements.is_empty() { 0 } else { 100 },
            requirements_to_tests: requirements
                .iter()
                .map(|req| RequirementTrace {
                    requirement_id: req.id.clone(),
                    traceability_id: req.traceability_id.clone(),
                    test_count: req.scenario_hints.len(),
                    status: "planned".to_string(),
                })
                .collect(),
            high_risk_requirements: requirements
                .iter()
                .filter(|req| req.kind.is_high_risk())
                .map(|req| req.id.clone())
                .collect(),
        }
    }
}
