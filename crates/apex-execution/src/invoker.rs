//! Test invocation seam
//!
//! A [`TestInvoker`] drives one case against the system under test. The
//! runner owns the lifecycle; the invoker only performs work and reports
//! what happened.

use crate::clock::Clock;
use crate::error::InvokeError;
use crate::outcome::{OutcomePolicy, Verdict};
use apex_model::{ExecutionMetrics, TestCase, TestStep};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Drives test cases against a target
#[async_trait::async_trait]
pub trait TestInvoker: Send + Sync + fmt::Debug {
    /// Prepare the environment for `case`
    async fn prepare(&self, _case: &TestCase) -> Result<(), InvokeError> {
        Ok(())
    }

    /// Perform one step
    async fn perform_step(&self, case: &TestCase, step: &TestStep) -> Result<(), InvokeError>;

    /// Final verdict once every step ran
    async fn verdict(&self, case: &TestCase) -> Result<Verdict, InvokeError>;

    /// Resource usage observed for the last run
    fn sample_metrics(&self) -> ExecutionMetrics;
}

/// Setup delay range in milliseconds
const SETUP_DELAY_MS: std::ops::Range<u64> = 1000..4000;

/// Delay per step
const STEP_DELAY: Duration = Duration::from_millis(500);

/// Invoker that simulates a run: clock-driven delays, policy verdicts and
/// sampled metrics
#[derive(Debug)]
pub struct SimulatedInvoker {
    clock: Arc<dyn Clock>,
    outcome: Arc<dyn OutcomePolicy>,
    rng: Mutex<StdRng>,
    delays: bool,
}

impl SimulatedInvoker {
    /// Create invoker with entropy-seeded metrics
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, outcome: Arc<dyn OutcomePolicy>) -> Self {
        Self {
            clock,
            outcome,
            rng: Mutex::new(StdRng::from_os_rng()),
            delays: true,
        }
    }

    /// Seed metric sampling and setup delays
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Skip simulated delays
    #[inline]
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.delays = false;
        self
    }
}

#[async_trait::async_trait]
impl TestInvoker for SimulatedInvoker {
    async fn prepare(&self, _case: &TestCase) -> Result<(), InvokeError> {
        if self.delays {
            let millis = self.rng.lock().random_range(SETUP_DELAY_MS);
            self.clock.sleep(Duration::from_millis(millis)).await;
        }
        Ok(())
    }

    async fn perform_step(&self, _case: &TestCase, _step: &TestStep) -> Result<(), InvokeError> {
        if self.delays {
            self.clock.sleep(STEP_DELAY).await;
        }
        Ok(())
    }

    async fn verdict(&self, case: &TestCase) -> Result<Verdict, InvokeError> {
        Ok(self.outcome.decide(case))
    }

    fn sample_metrics(&self) -> ExecutionMetrics {
        let mut rng = self.rng.lock();
        ExecutionMetrics {
            cpu_pct: rng.random_range(20.0..70.0),
            mem_mb: rng.random_range(100.0..400.0),
            network_latency_ms: rng.random_range(10.0..60.0),
            response_time_ms: rng.random_range(500.0..2500.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::outcome::FixedOutcome;

    #[test]
    fn metrics_stay_in_range() {
        let invoker = SimulatedInvoker::new(
            Arc::new(ManualClock::default()),
            Arc::new(FixedOutcome(Verdict::Pass)),
        )
        .with_seed(3);

        for _ in 0..200 {
            let m = invoker.sample_metrics();
            assert!((20.0..70.0).contains(&m.cpu_pct));
            assert!((100.0..400.0).contains(&m.mem_mb));
            assert!((10.0..60.0).contains(&m.network_latency_ms));
            assert!((500.0..2500.0).contains(&m.response_time_ms));
        }
    }

    #[tokio::test]
    async fn setup_delay_is_routed_through_the_clock() {
        let clock = Arc::new(ManualClock::default());
        let start = clock.now();
        let invoker = SimulatedInvoker::new(clock.clone(), Arc::new(FixedOutcome(Verdict::Pass)))
            .with_seed(9);

        let case = apex_model::TestCase {
            id: "TC-1".into(),
            requirement_id: "R".into(),
            name: "n".into(),
            kind: apex_model::CaseKind::Positive,
            priority: apex_model::Priority::Medium,
            description: String::new(),
            preconditions: vec![],
            steps: vec![],
            expected_result: String::new(),
            test_data: Default::default(),
            automated: true,
            script_dialect: "python".into(),
            script_body: String::new(),
            estimated_duration_seconds: 1,
        };
        invoker.prepare(&case).await.unwrap();

        let waited = (clock.now() - start).num_milliseconds();
        assert!((1000..4000).contains(&waited), "waited {waited}ms");
    }
}
