//! Test execution record and its lifecycle
//!
//! ```text
//! queued ──► running ──► passed | failed | error
//!   │
//!   └──────► skipped
//! ```
//!
//! Terminal states are never reopened.

use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Queued,
    Running,
    Passed,
    Failed,
    Skipped,
    Error,
}

impl ExecutionStatus {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped | Self::Error)
    }

    /// Whether this state must carry error details
    #[inline]
    #[must_use]
    pub const fn requires_error_details(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    /// States reachable in one transition
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [ExecutionStatus] {
        use ExecutionStatus::*;
        match self {
            Queued => &[Running, Skipped],
            Running => &[Passed, Failed, Error],
            Passed | Failed | Skipped | Error => &[],
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an execution log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One entry of the per-execution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
}

/// Resource metrics sampled for one execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub cpu_pct: f64,
    pub mem_mb: f64,
    pub network_latency_ms: f64,
    pub response_time_ms: f64,
}

/// Classification of a failed or errored execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected value did not match (status `failed`)
    #[serde(rename = "AssertionError")]
    Assertion,
    /// Case did not finish in time (status `error`)
    #[serde(rename = "TimeoutError")]
    Timeout,
    /// The invoker itself faulted (status `error`)
    #[serde(rename = "InvocationError")]
    Invocation,
}

impl ErrorKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assertion => "AssertionError",
            Self::Timeout => "TimeoutError",
            Self::Invocation => "InvocationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure payload, present iff status is `failed` or `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub kind: ErrorKind,
    pub message: String,
    pub stack_trace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

/// Artifact recorded for one executed step; bytes live in external storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepArtifact {
    pub step: u32,
    pub url: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Execution record for one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    pub id: String,
    pub test_case_id: String,
    pub status: ExecutionStatus,
    pub queued_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub environment: String,
    pub logs: Vec<LogEntry>,
    pub artifacts: Vec<StepArtifact>,
    pub metrics: ExecutionMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

impl TestExecution {
    /// Create a queued execution
    #[must_use]
    pub fn queued(
        id: impl Into<String>,
        test_case_id: impl Into<String>,
        environment: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            test_case_id: test_case_id.into(),
            status: ExecutionStatus::Queued,
            queued_at: at,
            start_time: None,
            end_time: None,
            duration_ms: 0,
            environment: environment.into(),
            logs: Vec::new(),
            artifacts: Vec::new(),
            metrics: ExecutionMetrics::default(),
            error_details: None,
        }
    }

    /// Move to `to`, rejecting transitions the lifecycle does not allow
    ///
    /// # Errors
    /// `ModelError::IllegalTransition` if `to` is not reachable from the
    /// current status.
    pub fn transition(&mut self, to: ExecutionStatus) -> Result<(), ModelError> {
        if self.status.allowed_transitions().contains(&to) {
            self.status = to;
            Ok(())
        } else {
            Err(ModelError::IllegalTransition {
                from: self.status,
                to,
            })
        }
    }

    /// Append a log entry
    pub fn log(
        &mut self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: impl Into<String>,
        source: &str,
    ) {
        self.logs.push(LogEntry {
            timestamp,
            level,
            message: message.into(),
            source: source.to_string(),
        });
    }

    /// Whether the execution reached a terminal state
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Checks `endTime >= startTime` and the error-details pairing
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let times_ok = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end >= start,
            (Some(_), None) => !self.is_terminal(),
            (None, None) => !self.is_terminal(),
            (None, Some(_)) => false,
        };
        times_ok && self.error_details.is_some() == self.status.requires_error_details()
    }
}

/// Metadata describing one scheduler run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeta {
    pub batch_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<String>,
    pub environment: String,
    pub parallel: bool,
    pub max_parallel: usize,
    pub total_tests: usize,
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued() -> TestExecution {
        TestExecution::queued("EXEC-1", "TC-1", "staging", Utc::now())
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut exec = queued();
        exec.transition(ExecutionStatus::Running).unwrap();
        exec.transition(ExecutionStatus::Passed).unwrap();
        assert!(exec.is_terminal());
    }

    #[test]
    fn terminal_states_are_never_reopened() {
        let mut exec = queued();
        exec.transition(ExecutionStatus::Running).unwrap();
        exec.transition(ExecutionStatus::Failed).unwrap();

        let err = exec.transition(ExecutionStatus::Running).unwrap_err();
        assert_eq!(
            err,
            ModelError::IllegalTransition {
                from: ExecutionStatus::Failed,
                to: ExecutionStatus::Running,
            }
        );
    }

    #[test]
    fn queued_cannot_jump_to_passed() {
        let mut exec = queued();
        assert!(exec.transition(ExecutionStatus::Passed).is_err());
        assert_eq!(exec.status, ExecutionStatus::Queued);
    }

    #[test]
    fn consistency_requires_error_details_for_failures() {
        let now = Utc::now();
        let mut exec = queued();
        exec.transition(ExecutionStatus::Running).unwrap();
        exec.transition(ExecutionStatus::Error).unwrap();
        exec.start_time = Some(now);
        exec.end_time = Some(now);
        assert!(!exec.is_consistent());

        exec.error_details = Some(ErrorDetails {
            kind: ErrorKind::Timeout,
            message: "timed out".into(),
            stack_trace: String::new(),
            screenshot_url: None,
        });
        assert!(exec.is_consistent());
    }

    #[test]
    fn error_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::Assertion).unwrap(),
            "\"AssertionError\""
        );
        assert_eq!(ErrorKind::Timeout.to_string(), "TimeoutError");
    }
}
