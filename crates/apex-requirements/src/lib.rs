//! APEX Requirements - turn raw text into typed, scored requirements
//!
//! # Inputs
//!
//! - Free-form document lines: a line is a requirement iff it says
//!   "shall" or "must" ([`RequirementClassifier::classify`]).
//! - Structured tracker exports in JSON or YAML ([`records`]): every record
//!   is a requirement.
//!
//! Malformed text never errors; it just yields no requirements. Only
//! structured payloads that fail to decode produce a [`RecordError`].
//!
//! # Example
//!
//! ```rust
//! use apex_requirements::RequirementClassifier;
//! use apex_model::RequirementKind;
//!
//! let reqs = RequirementClassifier::new()
//!     .classify(&["The system shall encrypt backups within 5 seconds."]);
//! assert_eq!(reqs.len(), 1);
//! assert_eq!(reqs[0].kind, RequirementKind::Security);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classifier;
pub mod error;
pub mod records;
pub mod traceability;

pub use classifier::{
    ambiguity_score, determine_kind, is_candidate, is_testable, scenario_hints,
    RequirementClassifier,
};
pub use error::RecordError;
pub use records::{RecordFormat, TrackerExport, TrackerRecord};
pub use traceability::{RequirementTrace, TraceabilityMatrix};
