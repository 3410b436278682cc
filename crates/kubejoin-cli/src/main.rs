//! kubejoin - control-plane join workflow runner.
//!
//! This is the entry point for the `kubejoin` binary. Every phase of the join
//! workflow is reachable on its own:
//!
//! ```text
//! kubejoin join phase reschedule-deployments dns
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use kubejoin_phases::{new_reschedule_deployments_phase, JoinData, KubeJoinData, RescheduleConfig};
use kubejoin_workflow::Runner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONTROL_PLANE_JOIN_EXAMPLE: &str = "  \
  # Reschedule the cluster DNS pods after a control-plane node joined
  kubejoin join phase reschedule-deployments dns --kubeconfig /etc/kubernetes/admin.conf

  # Run every reschedule step
  kubejoin join phase reschedule-deployments all";

/// kubejoin - run the phases of a control-plane join.
#[derive(Parser, Debug)]
#[command(name = "kubejoin")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kubeconfig used to reach the cluster. Defaults to `KUBECONFIG` or
    /// `~/.kube/config`, then in-cluster config.
    #[arg(long, global = true, env = "KUBEJOIN_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn join_runner() -> Runner<dyn JoinData> {
    Runner::new(vec![new_reschedule_deployments_phase(
        CONTROL_PLANE_JOIN_EXAMPLE,
    )])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut runner = join_runner();

    let matches = Args::command()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(commands::join_command(runner.phases()))
        .get_matches();
    let args = Args::from_arg_matches(&matches)?;

    // Initialize tracing; success stays silent unless asked for
    let default_filter = if args.verbose {
        "warn,kubejoin=debug,kubejoin_workflow=debug,kubejoin_phases=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(("join", join)) = matches.subcommand() else {
        anyhow::bail!("unknown command");
    };

    if let Some(skip) = join.get_many::<String>(commands::SKIP_PHASES) {
        runner.set_skip_phases(skip.cloned());
    }

    let data = KubeJoinData::new(args.kubeconfig, RescheduleConfig::from_env());
    tracing::debug!(config = ?data.reschedule_config(), "Loaded join configuration");

    match join.subcommand() {
        Some(("phase", phase)) => {
            let (path, phase_args) = commands::selected_phase(phase);
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            runner
                .run_phase(&path, &phase_args, &data)
                .await
                .with_context(|| format!("join phase {} failed", path.join(" ")))?;
        }
        _ => {
            runner.run(&data).await.context("join failed")?;
        }
    }

    Ok(())
}
