//! Synthesized suites and coverage

use apex_model::{CaseKind, Priority, Requirement, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Share of requirements with at least one test case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub percentage: u32,
    pub covered: usize,
    pub total: usize,
}

/// Coverage of `requirements` by `cases`; all zeros when nothing is required
#[must_use]
pub fn calculate_coverage(requirements: &[Requirement], cases: &[TestCase]) -> Coverage {
    let total = requirements.len();
    if total == 0 {
        return Coverage::default();
    }

    let tested: HashSet<&str> = cases.iter().map(|c| c.requirement_id.as_str()).collect();
    let covered = requirements
        .iter()
        .map(|r| r.id.as_str())
        .collect::<HashSet<_>>()
        .intersection(&tested)
        .count();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percentage = (covered as f64 / total as f64 * 100.0).round() as u32;

    Coverage {
        percentage,
        covered,
        total,
    }
}

/// Case counts by kind and priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteStatistics {
    pub total: usize,
    pub automated: usize,
    pub positive: usize,
    pub negative: usize,
    pub boundary: usize,
    pub high_priority: usize,
}

impl SuiteStatistics {
    /// Tally `cases`
    #[must_use]
    pub fn from_cases(cases: &[TestCase]) -> Self {
        cases.iter().fold(
            Self {
                total: cases.len(),
                ..Self::default()
            },
            |mut stats, case| {
                match case.kind {
                    CaseKind::Positive => stats.positive += 1,
                    CaseKind::Negative => stats.negative += 1,
                    CaseKind::Boundary => stats.boundary += 1,
                }
                stats.automated += usize::from(case.automated);
                stats.high_priority += usize::from(case.priority == Priority::High);
                stats
            },
        )
    }
}

/// Output of one synthesis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    /// `TS-<ulid>`
    pub suite_id: String,
    pub test_cases: Vec<TestCase>,
    pub coverage: Coverage,
    pub total_estimated_duration_seconds: u64,
    pub frameworks: Vec<String>,
    /// Synthesized suites always go through human review
    pub human_review_required: bool,
    pub statistics: SuiteStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestSynthesizer;
    use apex_requirements::RequirementClassifier;

    #[test]
    fn coverage_is_zero_without_requirements() {
        assert_eq!(
            calculate_coverage(&[], &[]),
            Coverage {
                percentage: 0,
                covered: 0,
                total: 0
            }
        );
    }

    #[test]
    fn coverage_rounds_partial_sets() {
        let reqs = RequirementClassifier::new().classify(&[
            "A shall work",
            "B shall work",
            "C shall work",
        ]);
        let cases = TestSynthesizer::new().synthesize(&reqs[0], "python");

        let coverage = calculate_coverage(&reqs, &cases);
        assert_eq!(coverage.covered, 1);
        assert_eq!(coverage.total, 3);
        assert_eq!(coverage.percentage, 33);
    }

    #[test]
    fn cases_for_unknown_requirements_do_not_count() {
        let reqs = RequirementClassifier::new().classify(&["A shall work", "B shall work"]);
        let mut cases = TestSynthesizer::new().synthesize(&reqs[0], "python");
        for case in &mut cases {
            case.requirement_id = "ELSEWHERE-1".into();
        }
        assert_eq!(calculate_coverage(&reqs, &cases).covered, 0);
    }

    #[test]
    fn statistics_count_manual_cases() {
        let reqs = RequirementClassifier::new().classify(&["Uploads shall limit file size"]);
        let mut cases = TestSynthesizer::new().synthesize(&reqs[0], "python");
        cases[1].automated = false;

        let stats = SuiteStatistics::from_cases(&cases);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.automated, 2);
        assert_eq!((stats.positive, stats.negative, stats.boundary), (1, 1, 1));
        assert_eq!(stats.high_priority, 1);
    }
}
