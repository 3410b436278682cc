//! Positional argument validation for phases.

use crate::{Result, WorkflowError};

/// Rule applied to the positional arguments a phase is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgsValidator {
    /// Accept any number of arguments.
    #[default]
    Any,
    /// Reject every positional argument.
    NoArgs,
}

impl ArgsValidator {
    /// Validate `args` for the phase at `phase_path`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidArgs`] when the arguments break the rule.
    pub fn validate(&self, phase_path: &str, args: &[String]) -> Result<()> {
        let message = match self {
            Self::Any => None,
            Self::NoArgs => args
                .first()
                .map(|arg| format!("unknown command {arg:?} for {phase_path:?}")),
        };

        match message {
            Some(message) => Err(WorkflowError::InvalidArgs {
                phase: phase_path.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}
