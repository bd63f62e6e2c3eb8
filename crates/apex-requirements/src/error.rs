//! Error types for structured requirement ingestion

/// Errors while decoding a structured tracker export
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// JSON payload did not decode
    #[error("invalid JSON tracker export: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML payload did not decode
    #[error("invalid YAML tracker export: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Unrecognised format name
    #[error("unsupported record format: '{0}'")]
    UnsupportedFormat(String),

    /// Record decoded but is unusable
    #[error("invalid record {key}: {message}")]
    InvalidRecord { key: String, message: String },
}

impl RecordError {
    /// Create invalid-record error
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            key: key.into(),
            message: message.into(),
        }
    }
}
