//! Error types for test invocation
//!
//! Invocation faults never escape the scheduler: the runner turns them into
//! an `error` execution carrying `InvocationError` details.

/// Fault raised by a [`TestInvoker`](crate::TestInvoker)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// Environment could not be prepared
    #[error("setup failed for {case_id}: {message}")]
    Setup { case_id: String, message: String },

    /// A step could not be driven
    #[error("step {step} of {case_id} failed to run: {message}")]
    Step {
        case_id: String,
        step: u32,
        message: String,
    },

    /// Target system unreachable
    #[error("test target unavailable: {0}")]
    Unavailable(String),
}

impl InvokeError {
    /// Create step error
    pub fn step(case_id: impl Into<String>, step: u32, message: impl Into<String>) -> Self {
        Self::Step {
            case_id: case_id.into(),
            step,
            message: message.into(),
        }
    }

    /// Create setup error
    pub fn setup(case_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            case_id: case_id.into(),
            message: message.into(),
        }
    }
}
