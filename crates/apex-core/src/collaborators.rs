//! External collaborators
//!
//! The issue tracker and artifact store sit outside the core. Calls to them
//! happen after a run has drained; their failures become publication
//! warnings and never touch executions.

use crate::error::CollaboratorError;
use apex_model::ExecutionReport;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Reference to a work item in the issue tracker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: String,
}

impl IssueRef {
    /// Create reference
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Location of a stored report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    pub artifact_id: String,
    pub url: String,
}

/// Work items keyed by requirement id
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IssueTracker: Send + Sync {
    /// Issue tracking `requirement_id`, if any
    async fn find_by_requirement_id(
        &self,
        requirement_id: &str,
    ) -> Result<Option<IssueRef>, CollaboratorError>;

    /// Attach a run report to `issue`
    async fn post_result(
        &self,
        issue: &IssueRef,
        report: &ExecutionReport,
    ) -> Result<(), CollaboratorError>;
}

/// Durable storage for reports
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `report`
    async fn save_report(
        &self,
        report: &ExecutionReport,
    ) -> Result<StoredArtifact, CollaboratorError>;
}

/// In-process issue tracker
#[derive(Debug, Default)]
pub struct InMemoryIssueTracker {
    issues: DashMap<String, IssueRef>,
    results: DashMap<String, Vec<ExecutionReport>>,
}

impl InMemoryIssueTracker {
    /// Create empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `requirement_id` under `key`
    #[must_use]
    pub fn with_issue(self, requirement_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.issues.insert(requirement_id.into(), IssueRef::new(key));
        self
    }

    /// Reports posted to `key`
    #[must_use]
    pub fn results_for(&self, key: &str) -> Vec<ExecutionReport> {
        self.results
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl IssueTracker for InMemoryIssueTracker {
    async fn find_by_requirement_id(
        &self,
        requirement_id: &str,
    ) -> Result<Option<IssueRef>, CollaboratorError> {
        Ok(self.issues.get(requirement_id).map(|entry| entry.value().clone()))
    }

    async fn post_result(
        &self,
        issue: &IssueRef,
        report: &ExecutionReport,
    ) -> Result<(), CollaboratorError> {
        self.results
            .entry(issue.key.clone())
            .or_default()
            .push(report.clone());
        Ok(())
    }
}

/// In-process artifact store
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    reports: DashMap<String, ExecutionReport>,
}

impl InMemoryArtifactStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored report by artifact id
    #[must_use]
    pub fn get(&self, artifact_id: &str) -> Option<ExecutionReport> {
        self.reports.get(artifact_id).map(|entry| entry.value().clone())
    }

    /// Number of stored reports
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether nothing was stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn save_report(
        &self,
        report: &ExecutionReport,
    ) -> Result<StoredArtifact, CollaboratorError> {
        let artifact_id = apex_model::prefixed_id("ART");
        let url = format!("{}{artifact_id}.json", report.artifacts.reports);
        self.reports.insert(artifact_id.clone(), report.clone());
        Ok(StoredArtifact { artifact_id, url })
    }
}
