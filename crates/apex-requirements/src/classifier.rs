//! Requirement classifier
//!
//! Every decision here is a keyword predicate over the lower-cased text.
//! Matching is plain substring search (no stemming, no word boundaries),
//! so "authenticate" matches `auth` and "seconds" matches `second`.

use apex_model::{Requirement, RequirementKind};

/// Words that make a line a requirement candidate
const MODAL_TERMS: &[&str] = &["shall", "must"];

/// Kind keyword groups, checked in order; first hit wins
const KIND_RULES: &[(RequirementKind, &[&str])] = &[
    (RequirementKind::Security, &["encrypt", "secure", "auth"]),
    (RequirementKind::Performance, &["second", "performance", "fast"]),
    (RequirementKind::NonFunctional, &["compliant", "standard"]),
];

/// Adjectives that cannot be measured
const UNMEASURABLE_TERMS: &[&str] = &["user-friendly", "intuitive"];

/// Vague terms, each worth [`AMBIGUITY_WEIGHT`]
const AMBIGUOUS_TERMS: &[&str] = &[
    "appropriate",
    "adequate",
    "as needed",
    "user-friendly",
    "intuitive",
    "fast",
    "efficient",
    "robust",
];

const AMBIGUITY_WEIGHT: f64 = 0.2;

const DOCUMENT_SOURCE: &str = "document-upload";

fn contains_any(lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| lower.contains(term))
}

/// Whether `text` is a requirement candidate (mentions "shall" or "must")
#[must_use]
pub fn is_candidate(text: &str) -> bool {
    contains_any(&text.to_lowercase(), MODAL_TERMS)
}

/// Resolve the requirement kind: security, then performance, then
/// non-functional, else functional
#[must_use]
pub fn determine_kind(text: &str) -> RequirementKind {
    let lower = text.to_lowercase();
    KIND_RULES
        .iter()
        .find(|(_, terms)| contains_any(&lower, terms))
        .map_or(RequirementKind::Functional, |(kind, _)| *kind)
}

/// False iff the text uses an unmeasurable adjective
#[must_use]
pub fn is_testable(text: &str) -> bool {
    !contains_any(&text.to_lowercase(), UNMEASURABLE_TERMS)
}

/// `min(1.0, 0.2 × distinct ambiguous terms present)`
#[must_use]
pub fn ambiguity_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let matches = AMBIGUOUS_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let score = matches as f64 * AMBIGUITY_WEIGHT;
    score.min(1.0)
}

/// Scenario hints derived from the text
#[must_use]
pub fn scenario_hints(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut hints = vec![
        "verify under normal conditions".to_string(),
        "verify behavior when violated".to_string(),
    ];

    if contains_any(&lower, &["number", "count"]) {
        hints.push("verify with minimum values".to_string());
        hints.push("verify with maximum values".to_string());
    }

    if contains_any(&lower, &["second", "time"]) {
        hints.push("verify under load conditions".to_string());
    }

    hints
}

/// Stateless requirement classifier
#[derive(Debug, Clone)]
pub struct RequirementClassifier {
    source_ref: String,
}

impl Default for RequirementClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementClassifier {
    /// Create classifier labelling requirements as document uploads
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            source_ref: DOCUMENT_SOURCE.to_string(),
        }
    }

    /// With a custom provenance label
    #[inline]
    #[must_use]
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = source_ref.into();
        self
    }

    /// Classify source lines, one requirement per qualifying line
    ///
    /// Blank lines are dropped before numbering, so `DOC-REQ-nnn` counts
    /// non-blank lines from 1.
    pub fn classify<S: AsRef<str>>(&self, source_lines: &[S]) -> Vec<Requirement> {
        let requirements: Vec<Requirement> = source_lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .filter(|(_, line)| is_candidate(line))
            .map(|(index, line)| {
                let ordinal = index + 1;
                self.build(
                    format!("DOC-REQ-{ordinal:03}"),
                    self.source_ref.clone(),
                    line.trim(),
                    format!("DOC-TRACE-{ordinal:03}"),
                )
            })
            .collect();

        tracing::debug!(
            lines = source_lines.len(),
            requirements = requirements.len(),
            "classified source lines"
        );
        requirements
    }

    /// Classify a whole document, splitting on newlines
    pub fn classify_document(&self, content: &str) -> Vec<Requirement> {
        let lines: Vec<&str> = content.lines().collect();
        self.classify(&lines)
    }

    /// Build a requirement from already-extracted text
    #[must_use]
    pub fn build(
        &self,
        id: String,
        source_ref: String,
        text: &str,
        traceability_id: String,
    ) -> Requirement {
        Requirement {
            id,
            source_ref,
            kind: determine_kind(text),
            text: text.to_string(),
            testable: is_testable(text),
            ambiguity_score: ambiguity_score(text),
            scenario_hints: scenario_hints(text),
            traceability_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn only_shall_or_must_lines_qualify() {
        let lines = [
            "The system shall log every request.",
            "This is background prose.",
            "Operators MUST rotate keys yearly.",
        ];
        let reqs = RequirementClassifier::new().classify(&lines);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].id, "DOC-REQ-001");
        assert_eq!(reqs[1].id, "DOC-REQ-003");
        assert_eq!(reqs[1].traceability_id, "DOC-TRACE-003");
        assert_eq!(reqs[0].source_ref, "document-upload");
    }

    #[test]
    fn blank_lines_do_not_advance_numbering() {
        let reqs =
            RequirementClassifier::new().classify_document("\n\n  \nUsers shall sign in.\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].id, "DOC-REQ-001");
        assert_eq!(reqs[0].text, "Users shall sign in.");
    }

    #[test]
    fn empty_input_yields_nothing() {
        let none: [&str; 0] = [];
        assert!(RequirementClassifier::new().classify(&none).is_empty());
        assert!(RequirementClassifier::new().classify_document("").is_empty());
    }

    #[test]
    fn security_wins_over_performance() {
        assert_eq!(
            determine_kind("System shall authenticate users within 3 seconds."),
            RequirementKind::Security
        );
        assert_eq!(
            determine_kind("Backups must encrypt data in under 2 seconds"),
            RequirementKind::Security
        );
    }

    #[test]
    fn kind_resolution_order() {
        assert_eq!(
            determine_kind("Reports shall render in 2 seconds"),
            RequirementKind::Performance
        );
        assert_eq!(
            determine_kind("Forms shall be Section 508 compliant"),
            RequirementKind::NonFunctional
        );
        assert_eq!(
            determine_kind("Performance shall meet the standard"),
            RequirementKind::Performance
        );
        assert_eq!(
            determine_kind("Users shall export invoices"),
            RequirementKind::Functional
        );
    }

    #[test]
    fn testability_rejects_unmeasurable_adjectives() {
        assert!(!is_testable("The UI shall be User-Friendly"));
        assert!(!is_testable("Navigation must be intuitive"));
        assert!(is_testable("The API shall return 200"));
    }

    #[test]
    fn ambiguity_counts_distinct_terms() {
        assert_eq!(ambiguity_score("The API shall return 200"), 0.0);
        assert!((ambiguity_score("shall be fast and fast and fast") - 0.2).abs() < 1e-9);
        assert!((ambiguity_score("shall be robust and efficient") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn ambiguity_is_capped() {
        let text = "appropriate adequate as needed user-friendly intuitive fast efficient robust";
        assert_eq!(ambiguity_score(text), 1.0);
    }

    #[test]
    fn scenario_hints_follow_keywords() {
        let base = scenario_hints("Users shall sign in");
        assert_eq!(base.len(), 2);

        let counted = scenario_hints("The count shall not exceed 10");
        assert_eq!(counted.len(), 4);
        assert!(counted.contains(&"verify with maximum values".to_string()));

        let timed = scenario_hints("Pages shall load within 2 seconds");
        assert_eq!(timed.last().unwrap(), "verify under load conditions");
    }

    proptest! {
        #[test]
        fn prop_one_requirement_per_qualifying_line(
            lines in proptest::collection::vec("[a-z ]{0,30}", 0..20)
        ) {
            let reqs = RequirementClassifier::new().classify(&lines);
            let expected = lines
                .iter()
                .filter(|l| !l.trim().is_empty() && is_candidate(l))
                .count();
            prop_assert_eq!(reqs.len(), expected);
        }

        #[test]
        fn prop_ambiguity_is_idempotent_and_bounded(text in ".{0,80}") {
            let first = ambiguity_score(&text);
            prop_assert_eq!(first, ambiguity_score(&text));
            prop_assert!((0.0..=1.0).contains(&first));
        }

        #[test]
        fn prop_ambiguity_monotonic_in_terms(
            text in "[a-z ]{0,40}",
            extra in proptest::sample::select(AMBIGUOUS_TERMS.to_vec())
        ) {
            let extended = format!("{text} {extra}");
            prop_assert!(ambiguity_score(&extended) >= ambiguity_score(&text));
        }
    }
}
