//! Phase declarations for the control-plane join workflow.

use futures::future::BoxFuture;
use kubejoin_workflow::{ActionError, ArgsValidator, Phase};

use crate::data::JoinData;
use crate::reschedule::run_dns_reschedule;

/// A phase of the control-plane join workflow.
pub type JoinPhase = Phase<dyn JoinData>;

/// Create the `reschedule-deployments` phase, which forces pods of
/// deployments that ended up on a single node to be scheduled again.
///
/// `example` is shown in the phase's help output.
#[must_use]
pub fn new_reschedule_deployments_phase(example: impl Into<String>) -> JoinPhase {
    Phase::new("reschedule-deployments", "Reschedule deployments")
        .with_example(example)
        .with_phases(vec![
            Phase::new("all", "Reschedule deployments")
                .run_all_siblings()
                .with_args_validator(ArgsValidator::NoArgs),
            new_dns_reschedule_phase(),
        ])
}

fn new_dns_reschedule_phase() -> JoinPhase {
    Phase::new("dns", "Reschedule DNS deployment")
        .with_action(run_dns_reschedule_phase)
        .with_args_validator(ArgsValidator::NoArgs)
}

fn run_dns_reschedule_phase<'a>(
    data: &'a (dyn JoinData + 'static),
) -> BoxFuture<'a, Result<(), ActionError>> {
    Box::pin(async move {
        run_dns_reschedule(data).await?;
        Ok(())
    })
}
