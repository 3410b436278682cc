//! Error types for the workflow crate.

use thiserror::Error;

/// Opaque error returned by a phase action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving or running phases.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No phase exists at the requested path.
    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    /// Positional arguments were rejected by the phase's validator.
    #[error("invalid arguments for phase {phase}: {message}")]
    InvalidArgs {
        /// Path of the phase that rejected the arguments.
        phase: String,
        /// Why the arguments were rejected.
        message: String,
    },

    /// A phase action returned an error.
    #[error("error execution phase {phase}")]
    PhaseFailed {
        /// Path of the failing phase.
        phase: String,
        /// The error returned by the action.
        #[source]
        source: ActionError,
    },
}

impl WorkflowError {
    /// Check if this error was raised before any action ran.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::UnknownPhase(_) | Self::InvalidArgs { .. })
    }
}

/// A specialized Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
