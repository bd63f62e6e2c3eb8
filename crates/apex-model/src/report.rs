//! Execution report type
//!
//! Reports are derived data: recomputed per run from a list of executions
//! by `apex_execution::report::aggregate`, never persisted by the core.

use crate::execution::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one `failed` execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTestSummary {
    pub test_case_id: String,
    pub error_kind: ErrorKind,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

/// Artifact directories associated with a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifacts {
    pub logs: String,
    pub screenshots: String,
    pub reports: String,
}

impl ReportArtifacts {
    /// Standard layout for `batch_id`
    #[must_use]
    pub fn for_batch(batch_id: &str) -> Self {
        Self {
            logs: format!("/logs/{batch_id}/"),
            screenshots: format!("/screenshots/{batch_id}/"),
            reports: format!("/reports/{batch_id}/"),
        }
    }
}

/// Aggregate statistics over a completed set of executions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub batch_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<String>,
    pub environment: String,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Set when `total == 0`; the rate and averages are then meaningless
    pub no_data: bool,
    /// Rounded to two decimals; `None` when there is no data
    pub pass_rate_pct: Option<f64>,
    pub total_duration_ms: u64,
    pub avg_test_duration_ms: u64,
    pub min_test_duration_ms: u64,
    pub max_test_duration_ms: u64,
    pub avg_cpu_pct: f64,
    pub avg_mem_mb: f64,
    pub failed_tests: Vec<FailedTestSummary>,
    pub artifacts: ReportArtifacts,
}

impl ExecutionReport {
    /// Pass rate as `"NN.NN%"`, or `"n/a"` without data
    #[must_use]
    pub fn pass_rate_display(&self) -> String {
        match self.pass_rate_pct {
            Some(rate) => format!("{rate:.2}%"),
            None => "n/a".to_string(),
        }
    }

    /// Every counted execution passed (false without data)
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.no_data && self.passed == self.total
    }
}
