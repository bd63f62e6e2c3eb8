//! APEX Core - operations over the test pipeline
//!
//! [`ApexService`] exposes the three operations (classify requirements,
//! synthesize tests, run an execution) plus a chained pipeline. Requests
//! and responses are transport-independent serde payloads; the `apex`
//! binary drives them from the command line.
//!
//! # Example
//!
//! ```rust
//! use apex_core::{ApexConfig, ApexService, ClassifyRequest};
//!
//! let service = ApexService::new(ApexConfig::default());
//! let response = service.classify(&ClassifyRequest::from_lines([
//!     "The system shall encrypt stored passwords",
//!     "Some background prose",
//! ]));
//! assert!(response.success);
//! assert_eq!(response.requirements.len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod operations;
pub mod service;

pub use collaborators::{
    ArtifactStore, InMemoryArtifactStore, InMemoryIssueTracker, IssueRef, IssueTracker,
    StoredArtifact,
};
pub use config::{ApexConfig, ExecutionConfig};
pub use error::{ApexError, CollaboratorError, ConfigError};
pub use operations::{
    ClassifyRequest, ClassifyResponse, PipelineResponse, Publication, RunExecutionRequest,
    RunExecutionResponse, RunSummary, StructuredConfig, SynthesizeRequest, SynthesizeResponse,
};
pub use service::ApexService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
