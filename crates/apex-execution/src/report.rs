//! Report aggregation
//!
//! Reports are recomputed from executions on demand. An empty run yields a
//! report flagged `no_data` with no pass rate and zeroed statistics.

use apex_model::{
    BatchMeta, ExecutionReport, ExecutionStatus, FailedTestSummary, ReportArtifacts,
    TestExecution,
};
use chrono::{DateTime, Utc};

/// Aggregate `executions` of the run described by `meta`
#[must_use]
pub fn aggregate(executions: &[TestExecution], meta: &BatchMeta) -> ExecutionReport {
    aggregate_at(executions, meta, Utc::now())
}

/// [`aggregate`] with an explicit generation timestamp
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn aggregate_at(
    executions: &[TestExecution],
    meta: &BatchMeta,
    generated_at: DateTime<Utc>,
) -> ExecutionReport {
    let total = executions.len();
    let count = |status: ExecutionStatus| executions.iter().filter(|e| e.status == status).count();
    let passed = count(ExecutionStatus::Passed);

    let durations = executions.iter().map(|e| e.duration_ms);
    let total_duration_ms: u64 = durations.clone().sum();

    // resource averages only cover executions that actually ran
    let ran: Vec<&TestExecution> = executions
        .iter()
        .filter(|e| e.status != ExecutionStatus::Skipped)
        .collect();
    let mean = |sum: f64| {
        if ran.is_empty() {
            0.0
        } else {
            sum / ran.len() as f64
        }
    };

    let failed_tests = executions
        .iter()
        .filter(|e| e.status == ExecutionStatus::Failed)
        .filter_map(|e| {
            e.error_details.as_ref().map(|details| FailedTestSummary {
                test_case_id: e.test_case_id.clone(),
                error_kind: details.kind,
                error_message: details.message.clone(),
                screenshot_url: details.screenshot_url.clone(),
            })
        })
        .collect();

    ExecutionReport {
        batch_id: meta.batch_id.clone(),
        suite_id: meta.suite_id.clone(),
        environment: meta.environment.clone(),
        generated_at,
        total,
        passed,
        failed: count(ExecutionStatus::Failed),
        errors: count(ExecutionStatus::Error),
        skipped: count(ExecutionStatus::Skipped),
        no_data: total == 0,
        pass_rate_pct: pass_rate(passed, total),
        total_duration_ms,
        avg_test_duration_ms: if total == 0 {
            0
        } else {
            (total_duration_ms as f64 / total as f64).round() as u64
        },
        min_test_duration_ms: durations.clone().min().unwrap_or(0),
        max_test_duration_ms: durations.max().unwrap_or(0),
        avg_cpu_pct: mean(ran.iter().map(|e| e.metrics.cpu_pct).sum()),
        avg_mem_mb: mean(ran.iter().map(|e| e.metrics.mem_mb).sum()),
        failed_tests,
        artifacts: ReportArtifacts::for_batch(&meta.batch_id),
    }
}

/// `round(100 * passed / total, 2)`, or `None` when there is nothing to rate
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pass_rate(passed: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| (passed as f64 * 10_000.0 / total as f64).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_model::{ErrorDetails, ErrorKind, ExecutionMetrics};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn meta() -> BatchMeta {
        BatchMeta {
            batch_id: "EX-1".into(),
            suite_id: Some("TS-1".into()),
            environment: "staging".into(),
            parallel: true,
            max_parallel: 5,
            total_tests: 0,
            start_time: Utc::now(),
        }
    }

    fn execution(id: &str, status: ExecutionStatus, duration_ms: u64) -> TestExecution {
        let mut e = TestExecution::queued(format!("EXEC-{id}"), id, "staging", Utc::now());
        e.status = status;
        e.duration_ms = duration_ms;
        e.metrics = ExecutionMetrics {
            cpu_pct: 40.0,
            mem_mb: 200.0,
            network_latency_ms: 20.0,
            response_time_ms: 800.0,
        };
        if status.requires_error_details() {
            e.error_details = Some(ErrorDetails {
                kind: if status == ExecutionStatus::Failed {
                    ErrorKind::Assertion
                } else {
                    ErrorKind::Timeout
                },
                message: format!("{id} broke"),
                stack_trace: String::new(),
                screenshot_url: Some(format!("/screenshots/EXEC-{id}/error.png")),
            });
        }
        e
    }

    #[test]
    fn empty_run_is_flagged_without_nan() {
        let report = aggregate(&[], &meta());
        assert!(report.no_data);
        assert_eq!(report.total, 0);
        assert_eq!(report.pass_rate_pct, None);
        assert_eq!(report.pass_rate_display(), "n/a");
        assert_eq!(report.avg_test_duration_ms, 0);
        assert!(!report.avg_cpu_pct.is_nan());
        assert!(!report.all_passed());
    }

    #[test]
    fn failed_summaries_exclude_errors() {
        let execs = vec![
            execution("TC-1", ExecutionStatus::Passed, 1000),
            execution("TC-2", ExecutionStatus::Failed, 2000),
            execution("TC-3", ExecutionStatus::Error, 4000),
        ];
        let report = aggregate(&execs, &meta());

        assert_eq!((report.passed, report.failed, report.errors), (1, 1, 1));
        assert_eq!(report.failed_tests.len(), 1);
        assert_eq!(report.failed_tests[0].test_case_id, "TC-2");
        assert_eq!(report.failed_tests[0].error_kind, ErrorKind::Assertion);
        assert_eq!(report.total_duration_ms, 7000);
        assert_eq!(report.avg_test_duration_ms, 2333);
        assert_eq!(report.min_test_duration_ms, 1000);
        assert_eq!(report.max_test_duration_ms, 4000);
        assert_eq!(report.pass_rate_pct, Some(33.33));
        assert_eq!(report.pass_rate_display(), "33.33%");
        assert_eq!(report.artifacts.logs, "/logs/EX-1/");
        assert_eq!(report.suite_id.as_deref(), Some("TS-1"));
    }

    #[test]
    fn skipped_executions_do_not_skew_resource_averages() {
        let mut skipped = execution("TC-2", ExecutionStatus::Skipped, 0);
        skipped.metrics = ExecutionMetrics::default();
        let report = aggregate(&[execution("TC-1", ExecutionStatus::Passed, 10), skipped], &meta());
        assert_eq!(report.skipped, 1);
        assert!((report.avg_cpu_pct - 40.0).abs() < f64::EPSILON);
        assert_eq!(report.pass_rate_pct, Some(50.0));
    }

    fn status() -> impl Strategy<Value = ExecutionStatus> {
        prop_oneof![
            Just(ExecutionStatus::Passed),
            Just(ExecutionStatus::Failed),
            Just(ExecutionStatus::Error),
            Just(ExecutionStatus::Skipped),
        ]
    }

    proptest! {
        #[test]
        fn counts_partition_the_run(statuses in prop::collection::vec(status(), 0..60)) {
            let execs: Vec<TestExecution> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| execution(&format!("TC-{i}"), *s, 100))
                .collect();
            let report = aggregate(&execs, &meta());

            prop_assert_eq!(
                report.passed + report.failed + report.errors + report.skipped,
                report.total
            );
            prop_assert_eq!(report.no_data, execs.is_empty());
            if let Some(rate) = report.pass_rate_pct {
                let exact = 100.0 * report.passed as f64 / report.total as f64;
                prop_assert!((rate - exact).abs() <= 0.005 + 1e-9);
                prop_assert!(((rate * 100.0).round() - rate * 100.0).abs() < 1e-6);
                prop_assert!((0.0..=100.0).contains(&rate));
            }
        }
    }
}
