//! Outcome decision policies
//!
//! The simulated invoker does not run scripts; it asks an
//! [`OutcomePolicy`] for the verdict. Production invokers decide from the
//! real run instead.

use apex_model::TestCase;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;

/// Result of one invoked case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Assertions held
    Pass,
    /// An assertion failed (`AssertionError`)
    Fail,
    /// The case did not finish in time (`TimeoutError`)
    Error,
}

/// Decides the verdict for a case
pub trait OutcomePolicy: Send + Sync + fmt::Debug {
    /// Verdict for `case`
    fn decide(&self, case: &TestCase) -> Verdict;
}

/// Pass/fail probabilities; the remainder is `Error`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeWeights {
    pub pass: f64,
    pub fail: f64,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self {
            pass: 0.75,
            fail: 0.15,
        }
    }
}

/// Weighted random verdicts (75 % pass, 15 % fail, 10 % error by default)
#[derive(Debug)]
pub struct WeightedOutcome {
    weights: OutcomeWeights,
    rng: Mutex<StdRng>,
}

impl Default for WeightedOutcome {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedOutcome {
    /// Entropy-seeded policy
    #[must_use]
    pub fn new() -> Self {
        Self {
            weights: OutcomeWeights::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible policy
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            weights: OutcomeWeights::default(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Override the probability table
    #[inline]
    #[must_use]
    pub fn with_weights(mut self, weights: OutcomeWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl OutcomePolicy for WeightedOutcome {
    fn decide(&self, _case: &TestCase) -> Verdict {
        let roll: f64 = self.rng.lock().random();
        if roll < self.weights.pass {
            Verdict::Pass
        } else if roll < self.weights.pass + self.weights.fail {
            Verdict::Fail
        } else {
            Verdict::Error
        }
    }
}

/// Same verdict for every case
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub Verdict);

impl OutcomePolicy for FixedOutcome {
    fn decide(&self, _case: &TestCase) -> Verdict {
        self.0
    }
}

/// Verdicts keyed by test case id, with a fallback
#[derive(Debug, Clone)]
pub struct ScriptedOutcome {
    verdicts: HashMap<String, Verdict>,
    fallback: Verdict,
}

impl ScriptedOutcome {
    /// Script with `fallback` for unlisted cases
    #[must_use]
    pub fn new(fallback: Verdict) -> Self {
        Self {
            verdicts: HashMap::new(),
            fallback,
        }
    }

    /// Script `verdict` for `case_id`
    #[must_use]
    pub fn with(mut self, case_id: impl Into<String>, verdict: Verdict) -> Self {
        self.verdicts.insert(case_id.into(), verdict);
        self
    }
}

impl OutcomePolicy for ScriptedOutcome {
    fn decide(&self, case: &TestCase) -> Verdict {
        self.verdicts.get(&case.id).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_model::{CaseKind, Priority};

    fn case(id: &str) -> TestCase {
        TestCase {
            id: id.into(),
            requirement_id: "REQ-1".into(),
            name: "case".into(),
            kind: CaseKind::Positive,
            priority: Priority::Medium,
            description: String::new(),
            preconditions: vec![],
            steps: vec![],
            expected_result: String::new(),
            test_data: Default::default(),
            automated: true,
            script_dialect: "python".into(),
            script_body: String::new(),
            estimated_duration_seconds: 30,
        }
    }

    #[test]
    fn seeded_policies_agree() {
        let a = WeightedOutcome::seeded(7);
        let b = WeightedOutcome::seeded(7);
        let c = case("TC-1");
        let left: Vec<_> = (0..50).map(|_| a.decide(&c)).collect();
        let right: Vec<_> = (0..50).map(|_| b.decide(&c)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn default_weights_roughly_hold() {
        let policy = WeightedOutcome::seeded(42);
        let c = case("TC-1");
        let draws = 10_000;
        let passes = (0..draws).filter(|_| policy.decide(&c) == Verdict::Pass).count();
        let rate = passes as f64 / f64::from(draws);
        assert!((0.72..0.78).contains(&rate), "pass rate {rate}");
    }

    #[test]
    fn degenerate_weights_always_fail() {
        let policy = WeightedOutcome::seeded(1).with_weights(OutcomeWeights {
            pass: 0.0,
            fail: 1.0,
        });
        assert!((0..100).all(|_| policy.decide(&case("x")) == Verdict::Fail));
    }

    #[test]
    fn scripted_outcome_falls_back() {
        let policy = ScriptedOutcome::new(Verdict::Pass).with("TC-2", Verdict::Error);
        assert_eq!(policy.decide(&case("TC-1")), Verdict::Pass);
        assert_eq!(policy.decide(&case("TC-2")), Verdict::Error);
        assert_eq!(FixedOutcome(Verdict::Fail).decide(&case("TC-1")), Verdict::Fail);
    }
}
