//! Per-case execution
//!
//! ```text
//! automated:  queued → running → passed | failed | error
//! manual:     queued → skipped
//! ```
//!
//! Every path ends in exactly one terminal state. Failures, timeouts and
//! invoker faults are recorded on the execution; nothing propagates to the
//! caller.

use crate::clock::Clock;
use crate::error::InvokeError;
use crate::invoker::TestInvoker;
use crate::outcome::Verdict;
use apex_model::{
    ErrorDetails, ErrorKind, ExecutionStatus, LogLevel, ModelError, StepArtifact, TestCase,
    TestExecution,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

const LOG_SOURCE: &str = "TestRunner";

/// Default per-case deadline
pub const DEFAULT_CASE_TIMEOUT: Duration = Duration::from_secs(30);

/// How a run ended, before it is written to the record
#[derive(Debug)]
enum Finish {
    Verdict(Verdict),
    Fault(InvokeError),
    TimedOut,
}

/// Runs one test case end to end
#[derive(Debug, Clone)]
pub struct CaseRunner {
    invoker: Arc<dyn TestInvoker>,
    clock: Arc<dyn Clock>,
    case_timeout: Duration,
    environment: String,
}

impl CaseRunner {
    /// Create a runner for `environment`
    #[must_use]
    pub fn new(
        invoker: Arc<dyn TestInvoker>,
        clock: Arc<dyn Clock>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            invoker,
            clock,
            case_timeout: DEFAULT_CASE_TIMEOUT,
            environment: environment.into(),
        }
    }

    /// Set the per-case deadline
    #[inline]
    #[must_use]
    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    /// Clock used for timestamps
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Run `case` to a terminal state
    pub async fn run(&self, case: &TestCase) -> TestExecution {
        let mut execution = TestExecution::queued(
            apex_model::prefixed_id("EXEC"),
            case.id.clone(),
            self.environment.clone(),
            self.clock.now(),
        );

        if let Err(err) = self.drive(case, &mut execution).await {
            error!(execution_id = %execution.id, error = %err, "execution lifecycle violated");
            self.force_error(&mut execution, err.to_string());
        }
        execution
    }

    /// Record for a case whose worker died before reporting
    #[must_use]
    pub fn abandoned(&self, case: &TestCase, reason: &str) -> TestExecution {
        let mut execution = TestExecution::queued(
            apex_model::prefixed_id("EXEC"),
            case.id.clone(),
            self.environment.clone(),
            self.clock.now(),
        );
        self.force_error(&mut execution, format!("worker for {} aborted: {reason}", case.name));
        execution
    }

    async fn drive(
        &self,
        case: &TestCase,
        execution: &mut TestExecution,
    ) -> Result<(), ModelError> {
        if !case.automated {
            execution.transition(ExecutionStatus::Skipped)?;
            let now = self.clock.now();
            execution.start_time = Some(now);
            execution.end_time = Some(now);
            execution.log(
                now,
                LogLevel::Warning,
                format!("Skipping manual test case {}", case.name),
                LOG_SOURCE,
            );
            warn!(test_case_id = %case.id, "manual test case skipped");
            return Ok(());
        }

        execution.transition(ExecutionStatus::Running)?;
        let started = self.clock.now();
        execution.start_time = Some(started);
        execution.log(
            started,
            LogLevel::Info,
            format!("Starting test execution for {}", case.name),
            LOG_SOURCE,
        );
        debug!(execution_id = %execution.id, test_case_id = %case.id, "execution started");

        let invocation = tokio::time::timeout(self.case_timeout, self.invoke(case, execution));
        let finish = match invocation.await {
            Ok(Ok(verdict)) => Finish::Verdict(verdict),
            Ok(Err(fault)) => Finish::Fault(fault),
            Err(_) => Finish::TimedOut,
        };

        let ended = self.clock.now();
        execution.metrics = self.invoker.sample_metrics();
        self.settle(case, execution, finish, ended)?;

        execution.end_time = Some(ended);
        execution.duration_ms = u64::try_from((ended - started).num_milliseconds()).unwrap_or(0);
        debug!(
            execution_id = %execution.id,
            status = %execution.status,
            duration_ms = execution.duration_ms,
            "execution finished"
        );
        Ok(())
    }

    async fn invoke(
        &self,
        case: &TestCase,
        execution: &mut TestExecution,
    ) -> Result<Verdict, InvokeError> {
        self.invoker.prepare(case).await?;
        for step in &case.steps {
            execution.log(
                self.clock.now(),
                LogLevel::Info,
                format!("Executing step {}: {}", step.index, step.action),
                LOG_SOURCE,
            );
            self.invoker.perform_step(case, step).await?;
            execution.artifacts.push(StepArtifact {
                step: step.index,
                url: format!("/screenshots/{}/step-{}.png", execution.id, step.index),
                description: format!("Screenshot for step {}", step.index),
                timestamp: self.clock.now(),
            });
        }
        self.invoker.verdict(case).await
    }

    fn settle(
        &self,
        case: &TestCase,
        execution: &mut TestExecution,
        finish: Finish,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), ModelError> {
        let (status, details) = match finish {
            Finish::Verdict(Verdict::Pass) => {
                execution.transition(ExecutionStatus::Passed)?;
                execution.log(at, LogLevel::Info, "Test completed successfully", LOG_SOURCE);
                return Ok(());
            }
            Finish::Verdict(Verdict::Fail) => (
                ExecutionStatus::Failed,
                ErrorDetails {
                    kind: ErrorKind::Assertion,
                    message: format!("Expected value did not match actual for {}", case.name),
                    stack_trace: assertion_trace(case),
                    screenshot_url: Some(format!("/screenshots/{}/error.png", execution.id)),
                },
            ),
            Finish::Verdict(Verdict::Error) | Finish::TimedOut => (
                ExecutionStatus::Error,
                ErrorDetails {
                    kind: ErrorKind::Timeout,
                    message: format!(
                        "Test execution timed out after {} seconds",
                        self.case_timeout.as_secs()
                    ),
                    stack_trace: "Timeout waiting for element to be visible".to_string(),
                    screenshot_url: Some(format!("/screenshots/{}/timeout.png", execution.id)),
                },
            ),
            Finish::Fault(fault) => (
                ExecutionStatus::Error,
                ErrorDetails {
                    kind: ErrorKind::Invocation,
                    message: fault.to_string(),
                    stack_trace: String::new(),
                    screenshot_url: Some(format!("/screenshots/{}/error.png", execution.id)),
                },
            ),
        };

        execution.transition(status)?;
        execution.log(at, LogLevel::Error, details.message.clone(), LOG_SOURCE);
        execution.error_details = Some(details);
        Ok(())
    }

    /// Finalize as `error` regardless of the current state
    fn force_error(&self, execution: &mut TestExecution, message: String) {
        let now = self.clock.now();
        execution.status = ExecutionStatus::Error;
        execution.start_time.get_or_insert(now);
        execution.end_time = Some(now);
        execution.log(now, LogLevel::Error, message.clone(), LOG_SOURCE);
        execution.error_details = Some(ErrorDetails {
            kind: ErrorKind::Invocation,
            message,
            stack_trace: String::new(),
            screenshot_url: None,
        });
    }
}

fn assertion_trace(case: &TestCase) -> String {
    format!(
        "AssertionError: Expected true but got false\n    \
         at TestCase.{} ({})\n    at TestRunner.execute",
        case.name, case.script_dialect
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::outcome::{FixedOutcome, OutcomePolicy};
    use apex_model::{CaseKind, Priority, TestStep, ValidationKind};

    fn case(id: &str, steps: u32) -> TestCase {
        TestCase {
            id: id.into(),
            requirement_id: "REQ-1".into(),
            name: format!("test_{id}"),
            kind: CaseKind::Positive,
            priority: Priority::Medium,
            description: String::new(),
            preconditions: vec![],
            steps: (1..=steps)
                .map(|i| TestStep::new(i, format!("action {i}"), "ok", ValidationKind::Assertion))
                .collect(),
            expected_result: String::new(),
            test_data: Default::default(),
            automated: true,
            script_dialect: "python".into(),
            script_body: String::new(),
            estimated_duration_seconds: 30,
        }
    }

    fn runner(outcome: impl OutcomePolicy + 'static) -> CaseRunner {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let invoker = crate::SimulatedInvoker::new(clock.clone(), Arc::new(outcome)).with_seed(1);
        CaseRunner::new(Arc::new(invoker), clock, "staging")
    }

    #[derive(Debug)]
    struct Stalling;

    #[async_trait::async_trait]
    impl TestInvoker for Stalling {
        async fn perform_step(&self, _: &TestCase, _: &TestStep) -> Result<(), InvokeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
        async fn verdict(&self, _: &TestCase) -> Result<Verdict, InvokeError> {
            Ok(Verdict::Pass)
        }
        fn sample_metrics(&self) -> apex_model::ExecutionMetrics {
            apex_model::ExecutionMetrics::default()
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[async_trait::async_trait]
    impl TestInvoker for Broken {
        async fn perform_step(&self, case: &TestCase, step: &TestStep) -> Result<(), InvokeError> {
            Err(InvokeError::step(&case.id, step.index, "driver crashed"))
        }
        async fn verdict(&self, _: &TestCase) -> Result<Verdict, InvokeError> {
            Ok(Verdict::Pass)
        }
        fn sample_metrics(&self) -> apex_model::ExecutionMetrics {
            apex_model::ExecutionMetrics::default()
        }
    }

    #[tokio::test]
    async fn passing_case_logs_each_step() {
        let exec = runner(FixedOutcome(Verdict::Pass)).run(&case("TC-1", 3)).await;

        assert_eq!(exec.status, ExecutionStatus::Passed);
        assert!(exec.error_details.is_none());
        assert_eq!(exec.logs.len(), 1 + 3 + 1);
        assert!(exec.logs.iter().all(|l| l.level == LogLevel::Info));
        assert!(exec.logs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(exec.artifacts.len(), 3);
        assert_eq!(exec.artifacts[2].url, format!("/screenshots/{}/step-3.png", exec.id));
        assert!(exec.duration_ms >= 1000 + 3 * 500);
        assert!(exec.id.starts_with("EXEC-"));
        assert!(exec.is_consistent());
    }

    #[tokio::test]
    async fn failing_case_carries_assertion_details() {
        let exec = runner(FixedOutcome(Verdict::Fail)).run(&case("TC-2", 2)).await;

        assert_eq!(exec.status, ExecutionStatus::Failed);
        let details = exec.error_details.as_ref().unwrap();
        assert_eq!(details.kind, ErrorKind::Assertion);
        assert_eq!(
            details.screenshot_url.as_deref(),
            Some(format!("/screenshots/{}/error.png", exec.id).as_str())
        );
        assert_eq!(exec.logs.last().unwrap().level, LogLevel::Error);
        assert!(exec.is_consistent());
    }

    #[tokio::test]
    async fn error_verdict_is_a_timeout() {
        let exec = runner(FixedOutcome(Verdict::Error)).run(&case("TC-3", 1)).await;
        assert_eq!(exec.status, ExecutionStatus::Error);
        assert_eq!(exec.error_details.unwrap().kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn manual_case_is_skipped() {
        let mut manual = case("TC-4", 2);
        manual.automated = false;
        let exec = runner(FixedOutcome(Verdict::Pass)).run(&manual).await;

        assert_eq!(exec.status, ExecutionStatus::Skipped);
        assert_eq!(exec.logs.len(), 1);
        assert_eq!(exec.logs[0].level, LogLevel::Warning);
        assert!(exec.error_details.is_none());
        assert!(exec.artifacts.is_empty());
        assert!(exec.is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_forces_timeout_error() {
        let runner = CaseRunner::new(Arc::new(Stalling), Arc::new(SystemClock), "staging")
            .with_case_timeout(Duration::from_secs(5));
        let exec = runner.run(&case("TC-5", 2)).await;

        assert_eq!(exec.status, ExecutionStatus::Error);
        let details = exec.error_details.as_ref().unwrap();
        assert_eq!(details.kind, ErrorKind::Timeout);
        assert!(details.message.contains("5 seconds"));
        // the step log written before the deadline survives
        assert!(exec.logs.iter().any(|l| l.message.starts_with("Executing step 1")));
        assert!(exec.is_consistent());
    }

    #[tokio::test]
    async fn invoker_fault_is_an_invocation_error() {
        let runner = CaseRunner::new(Arc::new(Broken), Arc::new(ManualClock::default()), "qa");
        let exec = runner.run(&case("TC-6", 2)).await;

        assert_eq!(exec.status, ExecutionStatus::Error);
        let details = exec.error_details.as_ref().unwrap();
        assert_eq!(details.kind, ErrorKind::Invocation);
        assert!(details.message.contains("driver crashed"));
        assert!(exec.artifacts.is_empty());
    }

    #[test]
    fn abandoned_worker_is_finalized() {
        let exec = runner(FixedOutcome(Verdict::Pass)).abandoned(&case("TC-7", 1), "panicked");
        assert_eq!(exec.status, ExecutionStatus::Error);
        assert_eq!(exec.error_details.as_ref().unwrap().kind, ErrorKind::Invocation);
        assert!(exec.is_consistent());
    }
}
