//! APEX Execution - bounded parallel test execution
//!
//! The [`ExecutionScheduler`] runs test cases through a [`TestInvoker`],
//! never admitting more than `max_parallel` at once, and
//! [`report::aggregate`] folds the resulting executions into an
//! [`ExecutionReport`](apex_model::ExecutionReport).
//!
//! Time and outcomes are injectable: production runs use [`SystemClock`]
//! and a real invoker, tests use [`ManualClock`] with
//! [`SimulatedInvoker`] and a scripted [`OutcomePolicy`].
//!
//! # Example
//!
//! ```rust
//! use apex_execution::{
//!     ExecutionScheduler, FixedOutcome, ManualClock, RunPlan, SimulatedInvoker, Verdict,
//! };
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let clock = Arc::new(ManualClock::default());
//! let invoker = SimulatedInvoker::new(clock.clone(), Arc::new(FixedOutcome(Verdict::Pass)));
//! let scheduler = ExecutionScheduler::new(Arc::new(invoker), clock);
//!
//! let outcome = scheduler.execute(&[], &RunPlan::new("staging")).await;
//! let report = apex_execution::report::aggregate(&outcome.executions, &outcome.batch);
//! assert!(report.no_data);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod clock;
pub mod error;
pub mod invoker;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::InvokeError;
pub use invoker::{SimulatedInvoker, TestInvoker};
pub use outcome::{
    FixedOutcome, OutcomePolicy, OutcomeWeights, ScriptedOutcome, Verdict, WeightedOutcome,
};
pub use report::{aggregate, pass_rate};
pub use runner::{CaseRunner, DEFAULT_CASE_TIMEOUT};
pub use scheduler::{BatchSummary, ExecutionScheduler, RunPlan, ScheduleOutcome};
