//! Operation contracts
//!
//! Transport-independent request and response payloads for the three
//! operations plus the chained pipeline. Every response carries `success`
//! and an optional `message`; empty results are `success = false`.

use crate::collaborators::StoredArtifact;
use apex_design::{Coverage, SuiteStatistics, TestSuite};
use apex_execution::BatchSummary;
use apex_model::{BatchMeta, ExecutionReport, Requirement, TestCase, TestExecution};
use apex_requirements::{RecordFormat, TraceabilityMatrix};
use serde::{Deserialize, Serialize};

/// Tracker export payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredConfig {
    pub content: String,
    #[serde(default)]
    pub format: RecordFormat,
}

/// `ClassifyRequirements` request; structured input wins when both are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    #[serde(default)]
    pub source_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_config: Option<StructuredConfig>,
}

impl ClassifyRequest {
    /// Request over document lines
    #[must_use]
    pub fn from_lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            source_lines: lines.into_iter().map(Into::into).collect(),
            structured_config: None,
        }
    }

    /// Request over a whole document
    #[must_use]
    pub fn from_document(document: &str) -> Self {
        Self::from_lines(document.lines())
    }

    /// Request over a tracker export
    #[must_use]
    pub fn structured(content: impl Into<String>, format: RecordFormat) -> Self {
        Self {
            source_lines: Vec::new(),
            structured_config: Some(StructuredConfig {
                content: content.into(),
                format,
            }),
        }
    }
}

/// `ClassifyRequirements` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub requirements: Vec<Requirement>,
    pub ambiguous_count: usize,
    pub testable_count: usize,
    pub traceability: TraceabilityMatrix,
}

/// `SynthesizeTests` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    pub requirements: Vec<Requirement>,
    /// Configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
}

/// `SynthesizeTests` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub suite_id: String,
    pub test_cases: Vec<TestCase>,
    pub coverage: Coverage,
    pub total_estimated_duration_seconds: u64,
    pub frameworks: Vec<String>,
    pub human_review_required: bool,
    pub statistics: SuiteStatistics,
}

impl SynthesizeResponse {
    pub(crate) fn from_suite(suite: TestSuite, success: bool, message: Option<String>) -> Self {
        Self {
            success,
            message,
            suite_id: suite.suite_id,
            test_cases: suite.test_cases,
            coverage: suite.coverage,
            total_estimated_duration_seconds: suite.total_estimated_duration_seconds,
            frameworks: suite.frameworks,
            human_review_required: suite.human_review_required,
            statistics: suite.statistics,
        }
    }
}

/// `RunExecution` request; unset fields fall back to configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExecutionRequest {
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<String>,
}

impl RunExecutionRequest {
    /// Request with configured defaults
    #[must_use]
    pub fn new(test_cases: Vec<TestCase>) -> Self {
        Self {
            test_cases,
            ..Self::default()
        }
    }
}

/// Headline counts of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// `round(total_duration_ms / 1000)`
    pub duration_seconds: u64,
}

impl RunSummary {
    /// Summarize `report`
    #[must_use]
    pub fn from_report(report: &ExecutionReport) -> Self {
        Self {
            total: report.total,
            passed: report.passed,
            failed: report.failed,
            errors: report.errors,
            skipped: report.skipped,
            duration_seconds: (report.total_duration_ms + 500) / 1000,
        }
    }
}

/// What reached the collaborators after a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<StoredArtifact>,
    /// Issue keys that received the report
    pub notified_issues: Vec<String>,
    /// Collaborator failures, never fatal
    pub warnings: Vec<String>,
}

/// `RunExecution` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExecutionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub batch: BatchMeta,
    pub batches: Vec<BatchSummary>,
    pub peak_running: usize,
    pub executions: Vec<TestExecution>,
    pub report: ExecutionReport,
    pub summary: RunSummary,
    pub publication: Publication,
}

/// Classify → synthesize → execute in one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub classification: ClassifyResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<SynthesizeResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<RunExecutionResponse>,
}
