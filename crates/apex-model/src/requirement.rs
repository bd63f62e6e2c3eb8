//! Requirement type
//!
//! A requirement is created once by the classifier from one line or record of
//! input and is never mutated afterwards.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requirement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementKind {
    Functional,
    NonFunctional,
    Performance,
    Security,
}

impl RequirementKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::NonFunctional => "non-functional",
            Self::Performance => "performance",
            Self::Security => "security",
        }
    }

    /// Security and performance requirements are tracked as high risk
    #[inline]
    #[must_use]
    pub const fn is_high_risk(self) -> bool {
        matches!(self, Self::Security | Self::Performance)
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "functional" => Ok(Self::Functional),
            "non-functional" | "nonfunctional" => Ok(Self::NonFunctional),
            "performance" => Ok(Self::Performance),
            "security" => Ok(Self::Security),
            other => Err(ModelError::unknown("requirement kind", other)),
        }
    }
}

/// A single testable statement extracted from source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Unique within a run
    pub id: String,
    /// Free-form provenance
    pub source_ref: String,
    pub kind: RequirementKind,
    pub text: String,
    pub testable: bool,
    /// Vague-language heuristic in `[0, 1]`
    pub ambiguity_score: f64,
    pub scenario_hints: Vec<String>,
    /// Link back into the requirements traceability matrix
    pub traceability_id: String,
}

impl Requirement {
    /// Lower-cased text, used by every keyword predicate downstream
    #[must_use]
    pub fn text_lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Whether the ambiguity score exceeds `threshold`
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self, threshold: f64) -> bool {
        self.ambiguity_score > threshold
    }
}
