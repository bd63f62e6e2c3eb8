//! Structured tracker exports
//!
//! Accepts a JSON or YAML document of issue-tracker records:
//!
//! ```yaml
//! project: MLB
//! issues:
//!   - key: MLB-15
//!     summary: Inventory queries
//!     description: Inventory queries shall return within 2 seconds
//!     acceptance_criteria: |
//!       Query with 1000 records
//!       Query with 1M records
//! ```
//!
//! Unlike document lines, every record is a requirement; the text is only
//! used for scoring.

use crate::classifier::RequirementClassifier;
use crate::error::RecordError;
use apex_model::Requirement;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Payload encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for RecordFormat {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(RecordError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One tracker issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
}

impl TrackerRecord {
    /// Description when present and non-blank, else summary
    #[must_use]
    pub fn requirement_text(&self) -> &str {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.summary.trim())
    }

    /// Non-blank acceptance-criteria lines
    pub fn criteria(&self) -> impl Iterator<Item = &str> {
        self.acceptance_criteria
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
            .filter(|line| !line.is_empty())
    }
}

/// A tracker export document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerExport {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub issues: Vec<TrackerRecord>,
}

impl TrackerExport {
    /// Decode an export
    ///
    /// # Errors
    /// - `RecordError::Json` / `RecordError::Yaml` on malformed payloads
    /// - `RecordError::InvalidRecord` for blank or duplicate keys
    pub fn parse(content: &str, format: RecordFormat) -> Result<Self, RecordError> {
        let export: Self = match format {
            RecordFormat::Json => serde_json::from_str(content)?,
            RecordFormat::Yaml => serde_yaml::from_str(content)?,
        };
        export.validate()?;
        Ok(export)
    }

    fn validate(&self) -> Result<(), RecordError> {
        let mut seen = HashSet::new();
        for record in &self.issues {
            if record.key.trim().is_empty() {
                return Err(RecordError::invalid("<blank>", "record key is empty"));
            }
            if !seen.insert(record.key.as_str()) {
                return Err(RecordError::invalid(&record.key, "duplicate record key"));
            }
        }
        Ok(())
    }

    /// Classify every record into a requirement
    #[must_use]
    pub fn classify(&self, classifier: &RequirementClassifier) -> Vec<Requirement> {
        self.issues
            .iter()
            .map(|record| {
                let origin = self.project.as_deref().unwrap_or(&record.key);
                let mut requirement = classifier.build(
                    record.key.clone(),
                    format!("tracker:{origin}"),
                    record.requirement_text(),
                    format!("{}-TRACE", record.key),
                );
                requirement
                    .scenario_hints
                    .extend(record.criteria().map(str::to_string));
                requirement
            })
            .collect()
    }
}
