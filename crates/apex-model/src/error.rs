//! Error types for the model crate

use crate::execution::ExecutionStatus;

/// Errors raised while parsing or mutating model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Unknown enum literal
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Which enum was being parsed
        kind: &'static str,
        /// The rejected literal
        value: String,
    },

    /// Execution status transition not allowed by the lifecycle
    #[error("illegal execution transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ExecutionStatus,
        to: ExecutionStatus,
    },
}

impl ModelError {
    /// Create unknown-variant error
    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
