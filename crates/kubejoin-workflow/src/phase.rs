//! Phase tree nodes.

use std::fmt;

use futures::future::BoxFuture;

use crate::args::ArgsValidator;
use crate::error::ActionError;

/// Executable body of a leaf phase.
///
/// The action borrows the workflow's run-time data for the duration of one
/// invocation.
pub type PhaseAction<D> = for<'a> fn(&'a D) -> BoxFuture<'a, Result<(), ActionError>>;

/// A named unit of work in a workflow tree.
///
/// `D` is the run-time data type handed to every action of the tree.
pub struct Phase<D: ?Sized> {
    /// Name used to select the phase on the command line.
    pub name: String,
    /// One-line description shown in help output.
    pub short: String,
    /// Example invocations shown in the phase's own help.
    pub example: Option<String>,
    /// Nested phases, in execution order.
    pub phases: Vec<Phase<D>>,
    /// When selected, run every sibling phase at this level instead of itself.
    pub run_all_siblings: bool,
    /// Rule for positional arguments.
    pub args_validator: ArgsValidator,
    /// Action to execute, if this phase does any work of its own.
    pub run: Option<PhaseAction<D>>,
}

impl<D: ?Sized> Phase<D> {
    /// Create a phase with no children and no action.
    #[must_use]
    pub fn new(name: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: short.into(),
            example: None,
            phases: Vec::new(),
            run_all_siblings: false,
            args_validator: ArgsValidator::default(),
            run: None,
        }
    }

    /// Set the example text.
    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Set the child phases.
    #[must_use]
    pub fn with_phases(mut self, phases: Vec<Phase<D>>) -> Self {
        self.phases = phases;
        self
    }

    /// Mark this phase as an aggregator for its siblings.
    #[must_use]
    pub fn run_all_siblings(mut self) -> Self {
        self.run_all_siblings = true;
        self
    }

    /// Set the positional argument rule.
    #[must_use]
    pub fn with_args_validator(mut self, validator: ArgsValidator) -> Self {
        self.args_validator = validator;
        self
    }

    /// Bind an action to this phase.
    #[must_use]
    pub fn with_action(mut self, action: PhaseAction<D>) -> Self {
        self.run = Some(action);
        self
    }

    /// Find a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Phase<D>> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Check if this phase has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.phases.is_empty()
    }
}

impl<D: ?Sized> fmt::Debug for Phase<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("run_all_siblings", &self.run_all_siblings)
            .field("args_validator", &self.args_validator)
            .field("has_action", &self.run.is_some())
            .field("phases", &self.phases)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_data: &()) -> BoxFuture<'_, Result<(), ActionError>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn builder_sets_fields() {
        let phase: Phase<()> = Phase::new("parent", "Parent phase")
            .with_example("kubejoin join phase parent")
            .with_phases(vec![
                Phase::new("all", "Everything").run_all_siblings(),
                Phase::new("leaf", "Leaf")
                    .with_action(noop)
                    .with_args_validator(ArgsValidator::NoArgs),
            ]);

        assert_eq!(phase.name, "parent");
        assert!(!phase.is_leaf());
        assert!(phase.run.is_none());
        assert!(phase.child("all").unwrap().run_all_siblings);

        let leaf = phase.child("leaf").unwrap();
        assert!(leaf.is_leaf());
        assert!(leaf.run.is_some());
        assert_eq!(leaf.args_validator, ArgsValidator::NoArgs);
        assert!(phase.child("missing").is_none());
    }
}
