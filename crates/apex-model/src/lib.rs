//! APEX Model - shared pipeline data types
//!
//! Data flows one way through the pipeline:
//!
//! ```text
//! source text → Requirement → TestCase → TestExecution → ExecutionReport
//! ```
//!
//! Every type here is plain data with serde derives. Behaviour lives in the
//! stage crates (`apex-requirements`, `apex-design`, `apex-execution`).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod execution;
pub mod report;
pub mod requirement;
pub mod test_case;

pub use error::ModelError;
pub use execution::{
    BatchMeta, ErrorDetails, ErrorKind, ExecutionMetrics, ExecutionStatus, LogEntry, LogLevel,
    StepArtifact, TestExecution,
};
pub use report::{ExecutionReport, FailedTestSummary, ReportArtifacts};
pub use requirement::{Requirement, RequirementKind};
pub use test_case::{CaseKind, Priority, TestCase, TestStep, ValidationKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generate a prefixed, time-sortable identifier (`<prefix>-<ulid>`)
#[must_use]
pub fn prefixed_id(prefix: &str) -> String {
    format!("{prefix}-{}", ulid::Ulid::new())
}
