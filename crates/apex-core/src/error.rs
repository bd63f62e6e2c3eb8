//! Error types for APEX Core
//!
//! Operations never return these to callers directly: input and
//! collaborator failures are folded into `success = false` responses or
//! publication warnings. They surface as `Err` only while loading
//! configuration and inside the CLI.

use apex_requirements::RecordError;
use std::path::PathBuf;

/// Main APEX error type
#[derive(Debug, thiserror::Error)]
pub enum ApexError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Structured requirement input did not decode
    #[error("requirement records rejected: {0}")]
    Records(#[from] RecordError),

    /// External collaborator failed
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Request payload is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApexError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Collaborator(
                CollaboratorError::Unavailable { .. } | CollaboratorError::TimedOut { .. }
            )
        )
    }

    /// Check if the caller sent bad input
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Records(_) | Self::InvalidInput(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Issue tracker and artifact store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Service unreachable
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    /// Service did not answer in time
    #[error("{service} did not respond within {secs}s")]
    TimedOut { service: &'static str, secs: u64 },

    /// Service refused the request
    #[error("{service} rejected request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
}

impl CollaboratorError {
    /// Create unavailable error
    pub fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            message: message.into(),
        }
    }

    /// Create rejected error
    pub fn rejected(service: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_outages_are_retryable() {
        let err = ApexError::from(CollaboratorError::unavailable("artifact store", "refused"));
        assert!(err.is_retryable());
        assert!(!err.is_input_error());
        assert_eq!(
            err.to_string(),
            "collaborator error: artifact store unavailable: refused"
        );
    }

    #[test]
    fn rejections_are_not_retryable() {
        let err = ApexError::from(CollaboratorError::rejected("issue tracker", "no permission"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn record_errors_are_input_errors() {
        let err = ApexError::from(RecordError::UnsupportedFormat("xml".into()));
        assert!(err.is_input_error());
    }
}
