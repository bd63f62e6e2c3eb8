//! Batch scheduler
//!
//! Sequential runs execute cases strictly in input order. Parallel runs
//! split the input into contiguous batches of `max_parallel`; a batch fans
//! out onto tokio tasks gated by a semaphore and fully drains before the
//! next one is admitted. Results always come back in input order.
//!
//! Each case runs on its own task, so a panicking invoker is contained and
//! recorded as an `error` execution.

use crate::clock::Clock;
use crate::invoker::TestInvoker;
use crate::runner::CaseRunner;
use apex_model::{BatchMeta, TestCase, TestExecution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Timing of one drained batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// 0-based batch index
    pub index: usize,
    pub size: usize,
    pub started_at: DateTime<Utc>,
    pub drained_at: DateTime<Utc>,
}

/// Parameters of one scheduler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub environment: String,
    pub parallel: bool,
    /// Upper bound on concurrently running cases; 0 is treated as 1
    pub max_parallel: usize,
    pub suite_id: Option<String>,
}

impl RunPlan {
    /// Parallel plan with the default width of 5
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            parallel: true,
            max_parallel: 5,
            suite_id: None,
        }
    }

    /// Run strictly one case at a time
    #[inline]
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the batch width
    #[inline]
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Tag the run with the suite it executes
    #[inline]
    #[must_use]
    pub fn with_suite_id(mut self, suite_id: impl Into<String>) -> Self {
        self.suite_id = Some(suite_id.into());
        self
    }

    /// Effective batch width
    #[must_use]
    pub fn width(&self) -> usize {
        if self.parallel {
            self.max_parallel.max(1)
        } else {
            1
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub batch: BatchMeta,
    /// Terminal executions, in input order
    pub executions: Vec<TestExecution>,
    pub batches: Vec<BatchSummary>,
    /// Highest number of cases observed running at once
    pub peak_running: usize,
}

/// Counts in-flight cases and remembers the high-water mark
#[derive(Debug, Default)]
struct RunningGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl RunningGauge {
    fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct GaugeGuard(Arc<RunningGauge>);

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Schedules test cases onto a [`TestInvoker`]
#[derive(Debug, Clone)]
pub struct ExecutionScheduler {
    invoker: Arc<dyn TestInvoker>,
    clock: Arc<dyn Clock>,
    case_timeout: Duration,
}

impl ExecutionScheduler {
    /// Create a scheduler
    #[must_use]
    pub fn new(invoker: Arc<dyn TestInvoker>, clock: Arc<dyn Clock>) -> Self {
        Self {
            invoker,
            clock,
            case_timeout: crate::runner::DEFAULT_CASE_TIMEOUT,
        }
    }

    /// Set the per-case deadline
    #[inline]
    #[must_use]
    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    /// Run every case to a terminal state
    pub async fn execute(&self, cases: &[TestCase], plan: &RunPlan) -> ScheduleOutcome {
        let runner = CaseRunner::new(
            Arc::clone(&self.invoker),
            Arc::clone(&self.clock),
            plan.environment.clone(),
        )
        .with_case_timeout(self.case_timeout);

        let batch = BatchMeta {
            batch_id: apex_model::prefixed_id("EX"),
            suite_id: plan.suite_id.clone(),
            environment: plan.environment.clone(),
            parallel: plan.parallel,
            max_parallel: plan.width(),
            total_tests: cases.len(),
            start_time: self.clock.now(),
        };
        info!(
            batch_id = %batch.batch_id,
            total = cases.len(),
            parallel = plan.parallel,
            max_parallel = batch.max_parallel,
            environment = %plan.environment,
            "execution run started"
        );

        let gauge = Arc::new(RunningGauge::default());
        let mut executions = Vec::with_capacity(cases.len());
        let mut batches = Vec::new();

        if plan.parallel {
            let permits = Arc::new(Semaphore::new(batch.max_parallel));
            for (index, chunk) in cases.chunks(batch.max_parallel).enumerate() {
                let started_at = self.clock.now();
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|case| spawn_case(&runner, case, &gauge, Some(&permits)))
                    .collect();
                for (handle, case) in handles.into_iter().zip(chunk) {
                    executions.push(join_case(&runner, case, handle).await);
                }
                batches.push(self.summary(index, chunk.len(), started_at));
            }
        } else if !cases.is_empty() {
            let started_at = self.clock.now();
            for case in cases {
                let handle = spawn_case(&runner, case, &gauge, None);
                executions.push(join_case(&runner, case, handle).await);
            }
            batches.push(self.summary(0, cases.len(), started_at));
        }

        info!(
            batch_id = %batch.batch_id,
            batches = batches.len(),
            peak_running = gauge.peak(),
            "execution run drained"
        );

        ScheduleOutcome {
            batch,
            executions,
            batches,
            peak_running: gauge.peak(),
        }
    }

    fn summary(&self, index: usize, size: usize, started_at: DateTime<Utc>) -> BatchSummary {
        BatchSummary {
            index,
            size,
            started_at,
            drained_at: self.clock.now(),
        }
    }
}

fn spawn_case(
    runner: &CaseRunner,
    case: &TestCase,
    gauge: &Arc<RunningGauge>,
    permits: Option<&Arc<Semaphore>>,
) -> JoinHandle<TestExecution> {
    let runner = runner.clone();
    let case = case.clone();
    let gauge = Arc::clone(gauge);
    let permits = permits.map(Arc::clone);

    tokio::spawn(async move {
        let _permit = match permits {
            Some(permits) => match permits.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => return runner.abandoned(&case, "admission closed"),
            },
            None => None,
        };
        let _running = gauge.enter();
        runner.run(&case).await
    })
}

async fn join_case(
    runner: &CaseRunner,
    case: &TestCase,
    handle: JoinHandle<TestExecution>,
) -> TestExecution {
    match handle.await {
        Ok(execution) => execution,
        Err(join_error) => {
            warn!(test_case_id = %case.id, error = %join_error, "worker did not finish");
            let reason = if join_error.is_panic() {
                "panicked"
            } else {
                "cancelled"
            };
            runner.abandoned(case, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::outcome::{FixedOutcome, Verdict};
    use crate::SimulatedInvoker;
    use apex_model::{CaseKind, ExecutionStatus, Priority, TestStep, ValidationKind};

    fn cases(n: usize) -> Vec<TestCase> {
        (1..=n)
            .map(|i| TestCase {
                id: format!("TC-{i:03}"),
                requirement_id: "REQ-1".into(),
                name: format!("case_{i}"),
                kind: CaseKind::Positive,
                priority: Priority::Medium,
                description: String::new(),
                preconditions: vec![],
                steps: vec![TestStep::new(1, "act", "ok", ValidationKind::Assertion)],
                expected_result: String::new(),
                test_data: Default::default(),
                automated: true,
                script_dialect: "python".into(),
                script_body: String::new(),
                estimated_duration_seconds: 30,
            })
            .collect()
    }

    fn scheduler(clock: Arc<ManualClock>) -> ExecutionScheduler {
        let invoker = SimulatedInvoker::new(clock.clone(), Arc::new(FixedOutcome(Verdict::Pass)))
            .with_seed(5);
        ExecutionScheduler::new(Arc::new(invoker), clock)
    }

    #[tokio::test]
    async fn twelve_cases_run_in_three_batches() {
        let clock = Arc::new(ManualClock::default());
        let outcome = scheduler(clock)
            .execute(&cases(12), &RunPlan::new("staging").with_max_parallel(5))
            .await;

        let sizes: Vec<usize> = outcome.batches.iter().map(|b| b.size).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(outcome.peak_running <= 5);
        assert!(outcome.batch.batch_id.starts_with("EX-"));
        for pair in outcome.batches.windows(2) {
            assert!(pair[1].started_at >= pair[0].drained_at);
        }
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let clock = Arc::new(ManualClock::default());
        let input = cases(7);
        let outcome = scheduler(clock)
            .execute(&input, &RunPlan::new("staging").with_max_parallel(3))
            .await;

        let ids: Vec<&str> = outcome.executions.iter().map(|e| e.test_case_id.as_str()).collect();
        let expected: Vec<&str> = input.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert!(outcome.executions.iter().all(TestExecution::is_terminal));
    }

    #[tokio::test]
    async fn sequential_runs_never_overlap() {
        let clock = Arc::new(ManualClock::default());
        let outcome = scheduler(clock)
            .execute(&cases(4), &RunPlan::new("staging").sequential())
            .await;

        assert_eq!(outcome.peak_running, 1);
        assert_eq!(outcome.batches.len(), 1);
        for pair in outcome.executions.windows(2) {
            assert!(pair[1].start_time >= pair[0].end_time);
        }
        assert!(outcome.executions.iter().all(|e| e.status == ExecutionStatus::Passed));
    }

    #[tokio::test]
    async fn zero_width_is_treated_as_one() {
        let clock = Arc::new(ManualClock::default());
        let outcome = scheduler(clock)
            .execute(&cases(3), &RunPlan::new("staging").with_max_parallel(0))
            .await;

        assert_eq!(outcome.batch.max_parallel, 1);
        assert_eq!(outcome.batches.len(), 3);
        assert_eq!(outcome.peak_running, 1);
    }

    #[tokio::test]
    async fn empty_input_produces_no_batches() {
        let clock = Arc::new(ManualClock::default());
        let outcome = scheduler(clock).execute(&[], &RunPlan::new("staging")).await;
        assert!(outcome.executions.is_empty());
        assert!(outcome.batches.is_empty());
        assert_eq!(outcome.batch.total_tests, 0);
    }

    #[derive(Debug)]
    struct Panicking;

    #[async_trait::async_trait]
    impl TestInvoker for Panicking {
        async fn perform_step(
            &self,
            case: &TestCase,
            _: &TestStep,
        ) -> Result<(), crate::InvokeError> {
            if case.id == "TC-002" {
                panic!("driver exploded");
            }
            Ok(())
        }
        async fn verdict(&self, _: &TestCase) -> Result<Verdict, crate::InvokeError> {
            Ok(Verdict::Pass)
        }
        fn sample_metrics(&self) -> apex_model::ExecutionMetrics {
            apex_model::ExecutionMetrics::default()
        }
    }

    #[tokio::test]
    async fn panicking_worker_does_not_abort_the_run() {
        let scheduler =
            ExecutionScheduler::new(Arc::new(Panicking), Arc::new(ManualClock::default()));
        let outcome = scheduler.execute(&cases(3), &RunPlan::new("staging")).await;

        let statuses: Vec<ExecutionStatus> = outcome.executions.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![ExecutionStatus::Passed, ExecutionStatus::Error, ExecutionStatus::Passed]
        );
        assert_eq!(
            outcome.executions[1].error_details.as_ref().unwrap().kind,
            apex_model::ErrorKind::Invocation
        );
    }
}
