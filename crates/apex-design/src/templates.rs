//! Step templates
//!
//! A [`StepTemplate`] pairs a keyword predicate over a requirement with a
//! generator of ordered steps per case kind. The [`TemplateRegistry`] picks
//! the first matching template and falls back to [`GenericTemplate`]
//! (setup → execute → validate).
//!
//! Templates only produce drafts; step indices are assigned by the
//! synthesizer so they are always contiguous from 1.

use apex_model::{CaseKind, Requirement, RequirementKind, ValidationKind};
use std::fmt;

/// Unnumbered step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    /// What the tester or script does
    pub action: String,
    /// Observable result that counts as success
    pub expected_outcome: String,
    /// How the outcome is checked
    pub validation_kind: ValidationKind,
}

impl StepDraft {
    /// Create a draft
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        expected_outcome: impl Into<String>,
        validation_kind: ValidationKind,
    ) -> Self {
        Self {
            action: action.into(),
            expected_outcome: expected_outcome.into(),
            validation_kind,
        }
    }
}

/// Step generator for a family of requirements
///
/// Implementations should return at least one step for every case kind; the
/// synthesizer substitutes the [`GenericTemplate`] steps for an empty list.
pub trait StepTemplate: Send + Sync + fmt::Debug {
    /// Template name (for logging)
    fn name(&self) -> &'static str;

    /// Whether this template applies to `requirement`
    fn matches(&self, requirement: &Requirement) -> bool;

    /// Steps for one case of `kind`
    fn steps(&self, requirement: &Requirement, kind: CaseKind) -> Vec<StepDraft>;
}

/// Credential-based authentication (security requirements mentioning auth)
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialAuthTemplate;

impl StepTemplate for CredentialAuthTemplate {
    fn name(&self) -> &'static str {
        "credential_auth"
    }

    fn matches(&self, requirement: &Requirement) -> bool {
        requirement.kind == RequirementKind::Security && requirement.text_lower().contains("auth")
    }

    fn steps(&self, _requirement: &Requirement, kind: CaseKind) -> Vec<StepDraft> {
        use ValidationKind::{Assertion, Performance, Security};
        match kind {
            CaseKind::Positive => vec![
                StepDraft::new(
                    "Present valid credential",
                    "Credential is detected by system",
                    Assertion,
                ),
                StepDraft::new("Enter valid PIN", "PIN is accepted", Assertion),
                StepDraft::new(
                    "Measure authentication time",
                    "Authentication completes within the required time",
                    Performance,
                ),
            ],
            CaseKind::Negative => vec![
                StepDraft::new("Present revoked credential", "Credential is rejected", Security),
                StepDraft::new("Enter wrong PIN three times", "Account is locked out", Security),
                StepDraft::new("Inspect session store", "No session was issued", Assertion),
            ],
            CaseKind::Boundary => vec![
                StepDraft::new(
                    "Authenticate with latency injected up to the time limit",
                    "Authentication completes at the limit",
                    Performance,
                ),
                StepDraft::new(
                    "Authenticate the maximum number of concurrent users",
                    "Every user is authenticated within the limit",
                    Performance,
                ),
            ],
        }
    }
}

/// Data queries with a latency expectation
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryLatencyTemplate;

impl StepTemplate for QueryLatencyTemplate {
    fn name(&self) -> &'static str {
        "query_latency"
    }

    fn matches(&self, requirement: &Requirement) -> bool {
        let text = requirement.text_lower();
        text.contains("query") || text.contains("queries")
    }

    fn steps(&self, _requirement: &Requirement, kind: CaseKind) -> Vec<StepDraft> {
        use ValidationKind::{Assertion, Performance, Security};
        match kind {
            CaseKind::Positive => vec![
                StepDraft::new(
                    "Execute query with test dataset",
                    "Query executes successfully",
                    Assertion,
                ),
                StepDraft::new(
                    "Measure response time",
                    "Response returned within the limit",
                    Performance,
                ),
            ],
            CaseKind::Negative => vec![
                StepDraft::new(
                    "Execute malformed query",
                    "Query is rejected with a validation error",
                    Assertion,
                ),
                StepDraft::new(
                    "Execute query with injected SQL",
                    "No data outside the query scope is returned",
                    Security,
                ),
            ],
            CaseKind::Boundary => vec![
                StepDraft::new(
                    "Execute query against the maximum dataset size",
                    "Query executes successfully",
                    Assertion,
                ),
                StepDraft::new(
                    "Measure response time at maximum size",
                    "Response returned within the limit",
                    Performance,
                ),
            ],
        }
    }
}

/// Fallback: setup → execute → validate
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTemplate;

impl StepTemplate for GenericTemplate {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _requirement: &Requirement) -> bool {
        true
    }

    fn steps(&self, _requirement: &Requirement, kind: CaseKind) -> Vec<StepDraft> {
        let execute = match kind {
            CaseKind::Positive => "Execute test scenario",
            CaseKind::Negative => "Execute test scenario with invalid input",
            CaseKind::Boundary => "Execute test scenario with boundary values",
        };
        vec![
            StepDraft::new(
                "Setup test environment",
                "Environment ready",
                ValidationKind::Assertion,
            ),
            StepDraft::new(execute, "Scenario completes", ValidationKind::Assertion),
            StepDraft::new(
                "Validate results",
                "Results match expected",
                ValidationKind::Assertion,
            ),
        ]
    }
}

/// Ordered template registry with a generic fallback
#[derive(Debug)]
pub struct TemplateRegistry {
    templates: Vec<Box<dyn StepTemplate>>,
    fallback: GenericTemplate,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TemplateRegistry {
    /// Registry holding only the generic fallback
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            fallback: GenericTemplate,
        }
    }

    /// Registry with built-in templates
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CredentialAuthTemplate);
        registry.register(QueryLatencyTemplate);
        registry
    }

    /// Append a template; earlier registrations win
    pub fn register(&mut self, template: impl StepTemplate + 'static) {
        self.templates.push(Box::new(template));
    }

    /// First template matching `requirement`, else the fallback
    #[must_use]
    pub fn resolve(&self, requirement: &Requirement) -> &dyn StepTemplate {
        self.templates
            .iter()
            .find(|t| t.matches(requirement))
            .map_or(&self.fallback as &dyn StepTemplate, |template| &**template)
    }

    /// Registered template names, in resolution order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.templates
            .iter()
            .map(|t| t.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }
}
