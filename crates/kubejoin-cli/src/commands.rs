//! Command tree built from the workflow's phases.

use clap::{Arg, ArgAction, ArgMatches, Command};
use kubejoin_workflow::Phase;

/// Positional arguments passed through to a phase's validator.
pub const PHASE_ARGS: &str = "args";

/// Comma-separated phase paths to leave out of `join`.
pub const SKIP_PHASES: &str = "skip-phases";

/// Build the `join` command, with one `join phase ...` subcommand per phase.
pub fn join_command<D: ?Sized>(phases: &[Phase<D>]) -> Command {
    let phase_command = Command::new("phase")
        .about("Use this command to invoke single phase of the join workflow")
        .subcommand_required(true)
        .subcommands(phases.iter().map(phase_command));

    Command::new("join")
        .about("Run the control-plane join workflow")
        .arg(
            Arg::new(SKIP_PHASES)
                .long(SKIP_PHASES)
                .value_name("PHASES")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Phases to skip, as parent/child paths separated by commas"),
        )
        .subcommand(phase_command)
}

/// Only leaf phases take positional arguments, so a misspelled child of a
/// group is reported by clap instead of being handed to the group.
fn phase_command<D: ?Sized>(phase: &Phase<D>) -> Command {
    let mut command = Command::new(phase.name.clone()).about(phase.short.clone());

    if phase.is_leaf() {
        command = command.arg(
            Arg::new(PHASE_ARGS)
                .num_args(0..)
                .trailing_var_arg(true)
                .hide(true),
        );
    } else {
        command = command.subcommands(phase.phases.iter().map(phase_command));
    }
    if let Some(example) = &phase.example {
        command = command.after_help(format!("Examples:\n{example}"));
    }
    command
}

/// Walk the matched `join phase ...` subcommands, returning the selected
/// phase path and its positional arguments.
pub fn selected_phase(matches: &ArgMatches) -> (Vec<String>, Vec<String>) {
    let mut path = Vec::new();
    let mut current = matches;

    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }

    let args = current
        .try_get_many::<String>(PHASE_ARGS)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    (path, args)
}
