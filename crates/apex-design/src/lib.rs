//! APEX Design - synthesize test cases from requirements
//!
//! Each requirement expands into a positive and a negative case, plus a
//! boundary case when the text talks about seconds, records or sizes.
//! Every case gets ordered steps (from the [`TemplateRegistry`]), a
//! deterministic fixture set and an executable script skeleton in the
//! requested [`ScriptDialect`].
//!
//! # Example
//!
//! ```rust
//! use apex_design::TestSynthesizer;
//! use apex_requirements::RequirementClassifier;
//!
//! let reqs = RequirementClassifier::new()
//!     .classify(&["Queries shall return within 2 seconds"]);
//! let cases = TestSynthesizer::new().synthesize(&reqs[0], "python");
//! assert_eq!(cases.len(), 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod fixtures;
pub mod script;
pub mod suite;
pub mod synthesizer;
pub mod templates;

pub use script::{frameworks_for, render_script, ScriptDialect};
pub use suite::{calculate_coverage, Coverage, SuiteStatistics, TestSuite};
pub use synthesizer::TestSynthesizer;
pub use templates::{StepDraft, StepTemplate, TemplateRegistry};
