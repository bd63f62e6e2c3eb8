//! Requirement → test case synthesis

use crate::fixtures::test_data;
use crate::script::{frameworks_for, render_script};
use crate::suite::{calculate_coverage, SuiteStatistics, TestSuite};
use crate::templates::{GenericTemplate, StepTemplate, TemplateRegistry};
use apex_model::{CaseKind, Priority, Requirement, RequirementKind, TestCase, TestStep};
use tracing::{debug, info, warn};

/// Terms that make a requirement worth a boundary case
const BOUNDARY_TERMS: [&str; 3] = ["second", "record", "size"];

/// Synthesizes positive, negative and (when warranted) boundary cases
#[derive(Debug, Default)]
pub struct TestSynthesizer {
    registry: TemplateRegistry,
}

impl TestSynthesizer {
    /// Synthesizer with the built-in template registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom template registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Template registry in use
    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Whether `requirement` gets a boundary case
    #[must_use]
    pub fn needs_boundary_case(requirement: &Requirement) -> bool {
        let text = requirement.text_lower();
        BOUNDARY_TERMS.iter().any(|term| text.contains(term))
    }

    /// Two or three cases for one requirement
    ///
    /// An unsupported `dialect` still yields cases, with empty script bodies.
    #[must_use]
    pub fn synthesize(&self, requirement: &Requirement, dialect: &str) -> Vec<TestCase> {
        let template = self.registry.resolve(requirement);
        debug!(
            requirement_id = %requirement.id,
            template = template.name(),
            "synthesizing test cases"
        );

        let mut kinds = vec![CaseKind::Positive, CaseKind::Negative];
        if Self::needs_boundary_case(requirement) {
            kinds.push(CaseKind::Boundary);
        }

        kinds
            .into_iter()
            .map(|kind| build_case(requirement, kind, template, dialect))
            .collect()
    }

    /// Cases for every requirement, with coverage and statistics
    #[must_use]
    pub fn synthesize_suite(&self, requirements: &[Requirement], dialect: &str) -> TestSuite {
        let test_cases: Vec<TestCase> = requirements
            .iter()
            .flat_map(|req| self.synthesize(req, dialect))
            .collect();

        let coverage = calculate_coverage(requirements, &test_cases);
        let statistics = SuiteStatistics::from_cases(&test_cases);
        let total_estimated_duration_seconds = test_cases
            .iter()
            .map(|case| u64::from(case.estimated_duration_seconds))
            .sum();

        info!(
            requirements = requirements.len(),
            test_cases = test_cases.len(),
            coverage = coverage.percentage,
            dialect,
            "test suite synthesized"
        );

        TestSuite {
            suite_id: apex_model::prefixed_id("TS"),
            test_cases,
            coverage,
            total_estimated_duration_seconds,
            frameworks: frameworks_for(dialect)
                .into_iter()
                .map(str::to_string)
                .collect(),
            human_review_required: true,
            statistics,
        }
    }
}

fn build_case(
    requirement: &Requirement,
    kind: CaseKind,
    template: &dyn StepTemplate,
    dialect: &str,
) -> TestCase {
    let mut drafts = template.steps(requirement, kind);
    if drafts.is_empty() {
        warn!(
            requirement_id = %requirement.id,
            template = template.name(),
            %kind,
            "template produced no steps, using generic steps"
        );
        drafts = GenericTemplate.steps(requirement, kind);
    }

    let steps: Vec<TestStep> = drafts
        .into_iter()
        .zip(1u32..)
        .map(|(draft, index)| TestStep {
            index,
            action: draft.action,
            expected_outcome: draft.expected_outcome,
            validation_kind: draft.validation_kind,
        })
        .collect();

    let text = &requirement.text;
    let (suffix, priority, description, preconditions, expected_result, duration) = match kind {
        CaseKind::Positive => (
            "valid_scenario",
            if requirement.kind == RequirementKind::Security {
                Priority::High
            } else {
                Priority::Medium
            },
            format!("Verify that {text}"),
            vec![
                "System is in ready state",
                "Test data is prepared",
                "Authentication completed",
            ],
            "Requirement is satisfied under normal conditions",
            30,
        ),
        CaseKind::Negative => (
            "invalid_scenario",
            Priority::Medium,
            format!("Verify system behavior when {text} is violated"),
            vec!["System is in ready state", "Invalid test data prepared"],
            "System handles invalid input gracefully",
            25,
        ),
        CaseKind::Boundary => (
            "boundary_conditions",
            Priority::High,
            format!("Test boundary conditions for {text}"),
            vec!["System is in ready state", "Boundary test data prepared"],
            "System handles boundary values correctly",
            45,
        ),
    };

    let script_body = render_script(dialect, requirement, kind, &steps);

    TestCase {
        id: format!("TC-{}-{:03}", requirement.id, kind.ordinal()),
        requirement_id: requirement.id.clone(),
        name: format!("test_{}_{suffix}", requirement.id.to_lowercase()),
        kind,
        priority,
        description,
        preconditions: preconditions.into_iter().map(str::to_string).collect(),
        steps,
        expected_result: expected_result.to_string(),
        test_data: test_data(requirement, kind),
        automated: true,
        script_dialect: dialect.to_string(),
        script_body,
        estimated_duration_seconds: duration,
    }
}
