//! Testing utilities for the APEX workspace
//!
//! Shared fixtures, deterministic schedulers and a probing invoker.

#![allow(missing_docs)]

use apex_design::TestSynthesizer;
use apex_execution::{
    Clock, ExecutionScheduler, FixedOutcome, InvokeError, ManualClock, OutcomePolicy,
    SimulatedInvoker, TestInvoker, Verdict,
};
use apex_model::{
    CaseKind, ExecutionMetrics, Priority, Requirement, TestCase, TestStep, ValidationKind,
};
use apex_requirements::RequirementClassifier;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Mixed document: prose, blank lines and five requirements
pub const SAMPLE_DOCUMENT: &str = "\
Inventory system requirements

The system shall encrypt stored card numbers.
Search queries must return within 2 seconds.

Reports should look nice.
The portal shall be compliant with the WCAG standard.
Users shall export invoices as PDF.
The dashboard must be intuitive, user-friendly and robust where appropriate.
";

/// Requirements of [`SAMPLE_DOCUMENT`]
pub fn sample_requirements() -> Vec<Requirement> {
    RequirementClassifier::new().classify_document(SAMPLE_DOCUMENT)
}

/// Python cases synthesized from [`SAMPLE_DOCUMENT`]
pub fn sample_cases() -> Vec<TestCase> {
    TestSynthesizer::new()
        .synthesize_suite(&sample_requirements(), "python")
        .test_cases
}

/// Classify a single line with the default classifier
pub fn requirement(id: &str, text: &str) -> Requirement {
    RequirementClassifier::new().build(
        id.to_string(),
        "test".to_string(),
        text,
        format!("{id}-TRACE"),
    )
}

/// Automated positive case with `steps` generic steps
pub fn test_case(id: &str, steps: u32) -> TestCase {
    TestCase {
        id: id.to_string(),
        requirement_id: "REQ-1".to_string(),
        name: format!("test_{}", id.to_lowercase()),
        kind: CaseKind::Positive,
        priority: Priority::Medium,
        description: format!("Verify {id}"),
        preconditions: vec!["System is in ready state".to_string()],
        steps: (1..=steps)
            .map(|i| {
                TestStep::new(
                    i,
                    format!("Perform action {i}"),
                    "Action succeeds",
                    ValidationKind::Assertion,
                )
            })
            .collect(),
        expected_result: "Requirement is satisfied".to_string(),
        test_data: Default::default(),
        automated: true,
        script_dialect: "python".to_string(),
        script_body: String::new(),
        estimated_duration_seconds: 30,
    }
}

/// Manual variant of [`test_case`]
pub fn manual_case(id: &str) -> TestCase {
    TestCase {
        automated: false,
        ..test_case(id, 1)
    }
}

/// `n` automated cases `TC-001..`
pub fn test_cases(n: usize) -> Vec<TestCase> {
    (1..=n).map(|i| test_case(&format!("TC-{i:03}"), 2)).collect()
}

/// Virtual clock at a fixed epoch
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::default())
}

/// Scheduler over a simulated invoker with `outcome` and seeded metrics
pub fn scheduler_with(
    clock: Arc<ManualClock>,
    outcome: impl OutcomePolicy + 'static,
) -> ExecutionScheduler {
    let invoker = SimulatedInvoker::new(clock.clone(), Arc::new(outcome)).with_seed(42);
    ExecutionScheduler::new(Arc::new(invoker), clock)
}

/// Scheduler where every case passes
pub fn passing_scheduler(clock: Arc<ManualClock>) -> ExecutionScheduler {
    scheduler_with(clock, FixedOutcome(Verdict::Pass))
}

/// Lifecycle event seen by a [`RecordingInvoker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseEvent {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default)]
struct RecorderState {
    active: usize,
    peak: usize,
    events: Vec<CaseEvent>,
}

/// Invoker that records how many cases are in flight at once
#[derive(Debug)]
pub struct RecordingInvoker {
    clock: Arc<dyn Clock>,
    step_delay: Duration,
    state: Mutex<RecorderState>,
}

impl RecordingInvoker {
    /// Recorder sleeping `step_delay` on `clock` per step
    pub fn new(clock: Arc<dyn Clock>, step_delay: Duration) -> Self {
        Self {
            clock,
            step_delay,
            state: Mutex::new(RecorderState::default()),
        }
    }

    /// Highest number of concurrently active cases
    pub fn peak(&self) -> usize {
        self.state.lock().peak
    }

    /// Start/finish events in observed order
    pub fn events(&self) -> Vec<CaseEvent> {
        self.state.lock().events.clone()
    }
}

#[async_trait::async_trait]
impl TestInvoker for RecordingInvoker {
    async fn prepare(&self, case: &TestCase) -> Result<(), InvokeError> {
        let mut state = self.state.lock();
        state.active += 1;
        state.peak = state.peak.max(state.active);
        state.events.push(CaseEvent::Started(case.id.clone()));
        Ok(())
    }

    async fn perform_step(&self, _case: &TestCase, _step: &TestStep) -> Result<(), InvokeError> {
        self.clock.sleep(self.step_delay).await;
        Ok(())
    }

    async fn verdict(&self, case: &TestCase) -> Result<Verdict, InvokeError> {
        let mut state = self.state.lock();
        state.active -= 1;
        state.events.push(CaseEvent::Finished(case.id.clone()));
        Ok(Verdict::Pass)
    }

    fn sample_metrics(&self) -> ExecutionMetrics {
        ExecutionMetrics {
            cpu_pct: 30.0,
            mem_mb: 150.0,
            network_latency_ms: 15.0,
            response_time_ms: 700.0,
        }
    }
}
