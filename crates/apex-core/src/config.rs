//! Service configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none)
//! is valid:
//!
//! ```toml
//! default_dialect = "javascript"
//! ambiguity_threshold = 0.4
//!
//! [execution]
//! environment = "qa"
//! max_parallel = 8
//! seed = 7
//! ```

use crate::error::ConfigError;
use apex_execution::RunPlan;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApexConfig {
    /// Script dialect when a request names none
    pub default_dialect: String,
    /// Requirements scoring above this are counted as ambiguous
    pub ambiguity_threshold: f64,
    /// Send reports to the artifact store and issue tracker
    pub publish_reports: bool,
    /// Deadline for each collaborator call
    pub publish_timeout_secs: u64,
    pub execution: ExecutionConfig,
}

impl Default for ApexConfig {
    fn default() -> Self {
        Self {
            default_dialect: "python".to_string(),
            ambiguity_threshold: 0.5,
            publish_reports: true,
            publish_timeout_secs: 10,
            execution: ExecutionConfig::default(),
        }
    }
}

impl ApexConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::InvalidValue`
    /// when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` when the file cannot be read, otherwise as
    /// [`ApexConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ambiguity_threshold) {
            return Err(ConfigError::invalid(
                "ambiguity_threshold",
                format!("{} is outside 0.0..=1.0", self.ambiguity_threshold),
            ));
        }
        if self.publish_timeout_secs == 0 {
            return Err(ConfigError::invalid("publish_timeout_secs", "must be at least 1"));
        }
        self.execution.validate()
    }

    /// With default dialect
    #[inline]
    #[must_use]
    pub fn with_default_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.default_dialect = dialect.into();
        self
    }

    /// With execution settings
    #[inline]
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// With publishing switched on or off
    #[inline]
    #[must_use]
    pub fn with_publishing(mut self, publish: bool) -> Self {
        self.publish_reports = publish;
        self
    }

    /// Collaborator deadline
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub environment: String,
    pub parallel: bool,
    pub max_parallel: usize,
    pub case_timeout_secs: u64,
    /// Seed for simulated outcomes; entropy when absent
    pub seed: Option<u64>,
    /// Route simulated setup/step delays through the clock
    pub simulate_delays: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            environment: "staging".to_string(),
            parallel: true,
            max_parallel: 5,
            case_timeout_secs: 30,
            seed: None,
            simulate_delays: true,
        }
    }
}

impl ExecutionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel == 0 {
            return Err(ConfigError::invalid("execution.max_parallel", "must be at least 1"));
        }
        if self.case_timeout_secs == 0 {
            return Err(ConfigError::invalid("execution.case_timeout_secs", "must be at least 1"));
        }
        if self.environment.trim().is_empty() {
            return Err(ConfigError::invalid("execution.environment", "must not be empty"));
        }
        Ok(())
    }

    /// Per-case deadline
    #[must_use]
    pub fn case_timeout(&self) -> Duration {
        Duration::from_secs(self.case_timeout_secs)
    }

    /// Scheduler plan for these settings
    #[must_use]
    pub fn run_plan(&self) -> RunPlan {
        let plan = RunPlan::new(self.environment.clone()).with_max_parallel(self.max_parallel);
        if self.parallel {
            plan
        } else {
            plan.sequential()
        }
    }
}
