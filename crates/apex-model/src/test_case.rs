//! Test case and test step types

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Scenario flavour of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Positive,
    Negative,
    Boundary,
}

impl CaseKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Boundary => "boundary",
        }
    }

    /// Case-id suffix (`TC-<req>-001` etc.)
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Positive => 1,
            Self::Negative => 2,
            Self::Boundary => 3,
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "boundary" => Ok(Self::Boundary),
            other => Err(ModelError::unknown("case kind", other)),
        }
    }
}

/// Test case priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// How a step outcome is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    Assertion,
    Visual,
    Performance,
    Security,
}

/// One ordered step of a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    /// 1-based, contiguous within a case
    pub index: u32,
    pub action: String,
    pub expected_outcome: String,
    pub validation_kind: ValidationKind,
}

impl TestStep {
    /// Create a step
    #[must_use]
    pub fn new(
        index: u32,
        action: impl Into<String>,
        expected_outcome: impl Into<String>,
        validation_kind: ValidationKind,
    ) -> Self {
        Self {
            index,
            action: action.into(),
            expected_outcome: expected_outcome.into(),
            validation_kind,
        }
    }
}

/// A concrete, executable scenario derived from one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    /// Foreign key to the originating requirement
    pub requirement_id: String,
    pub name: String,
    pub kind: CaseKind,
    pub priority: Priority,
    pub description: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub steps: Vec<TestStep>,
    #[serde(default)]
    pub expected_result: String,
    /// Opaque fixture map
    #[serde(default)]
    pub test_data: BTreeMap<String, Value>,
    /// Manual cases are skipped by the scheduler
    #[serde(default = "default_automated")]
    pub automated: bool,
    pub script_dialect: String,
    #[serde(default)]
    pub script_body: String,
    pub estimated_duration_seconds: u32,
}

fn default_automated() -> bool {
    true
}

impl TestCase {
    /// Steps are 1-based, contiguous and non-empty
    #[must_use]
    pub fn has_well_formed_steps(&self) -> bool {
        !self.steps.is_empty()
            && self
                .steps
                .iter()
                .zip(1u32..)
                .all(|(step, expected)| step.index == expected)
    }
}
