//! Phase resolution and execution.

use tracing::debug;

use crate::phase::Phase;
use crate::{Result, WorkflowError};

/// Runs the phases of a workflow tree against shared run-time data.
pub struct Runner<D: ?Sized> {
    phases: Vec<Phase<D>>,
    skip_phases: Vec<String>,
}

impl<D: ?Sized> Runner<D> {
    /// Create a runner over the given top-level phases.
    #[must_use]
    pub fn new(phases: Vec<Phase<D>>) -> Self {
        Self {
            phases,
            skip_phases: Vec::new(),
        }
    }

    /// Top-level phases, in execution order.
    #[must_use]
    pub fn phases(&self) -> &[Phase<D>] {
        &self.phases
    }

    /// Set phase paths (`parent/child`) to leave out. Skipping a phase also
    /// skips everything below it.
    pub fn set_skip_phases<I, S>(&mut self, skip: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_phases = skip.into_iter().map(Into::into).collect();
    }

    /// Resolve the phase at `path` and return the actions it selects, keyed
    /// by their full path.
    ///
    /// A `run_all_siblings` phase selects its siblings rather than itself.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownPhase`] if no phase exists at `path`
    /// and [`WorkflowError::InvalidArgs`] if `args` are rejected.
    pub fn select(&self, path: &[&str], args: &[String]) -> Result<Vec<(String, &Phase<D>)>> {
        let (target, siblings, prefix) = self.find(path)?;

        let target_path = join_path(&prefix, &target.name);
        target.args_validator.validate(&target_path, args)?;

        let mut selected = Vec::new();
        if target.run_all_siblings {
            for sibling in siblings.iter().filter(|p| !p.run_all_siblings) {
                self.collect(sibling, &prefix, &mut selected);
            }
        } else {
            self.collect(target, &prefix, &mut selected);
        }
        Ok(selected)
    }

    /// Run the phase at `path` with positional `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or validation fails, or the first
    /// error returned by a selected action.
    pub async fn run_phase(&self, path: &[&str], args: &[String], data: &D) -> Result<()> {
        let selected = self.select(path, args)?;
        Self::execute(selected, data).await
    }

    /// Run every phase of the workflow in order.
    ///
    /// # Errors
    ///
    /// Returns the first error returned by an action.
    pub async fn run(&self, data: &D) -> Result<()> {
        let mut selected = Vec::new();
        for phase in self.phases.iter().filter(|p| !p.run_all_siblings) {
            self.collect(phase, "", &mut selected);
        }
        Self::execute(selected, data).await
    }

    async fn execute(selected: Vec<(String, &Phase<D>)>, data: &D) -> Result<()> {
        for (path, phase) in selected {
            let Some(action) = phase.run else {
                continue;
            };

            debug!(phase = %path, "Running phase");
            action(data)
                .await
                .map_err(|source| WorkflowError::PhaseFailed {
                    phase: path.clone(),
                    source,
                })?;
            debug!(phase = %path, "Phase completed");
        }
        Ok(())
    }

    fn find(&self, path: &[&str]) -> Result<(&Phase<D>, &[Phase<D>], String)> {
        let unknown = || WorkflowError::UnknownPhase(path.join("/"));

        let (first, rest) = path.split_first().ok_or_else(unknown)?;
        let mut siblings = self.phases.as_slice();
        let mut current = siblings
            .iter()
            .find(|p| p.name == *first)
            .ok_or_else(unknown)?;
        let mut prefix = String::new();

        for name in rest {
            let next = current.child(name).ok_or_else(unknown)?;
            prefix = join_path(&prefix, &current.name);
            siblings = current.phases.as_slice();
            current = next;
        }

        Ok((current, siblings, prefix))
    }

    fn collect<'a>(&self, phase: &'a Phase<D>, prefix: &str, out: &mut Vec<(String, &'a Phase<D>)>) {
        let path = join_path(prefix, &phase.name);
        if self.is_skipped(&path) {
            debug!(phase = %path, "Skipping phase");
            return;
        }

        if phase.run.is_some() {
            out.push((path.clone(), phase));
        }
        for child in phase.phases.iter().filter(|p| !p.run_all_siblings) {
            self.collect(child, &path, out);
        }
    }

    fn is_skipped(&self, path: &str) -> bool {
        self.skip_phases.iter().any(|skip| {
            path == skip
                || path
                    .strip_prefix(skip.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
