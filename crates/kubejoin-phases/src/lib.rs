//! Control-plane join phases for kubejoin.
//!
//! This crate provides the `reschedule-deployments` phase run after a new
//! control-plane node joins a cluster. Its `dns` step looks at where the
//! cluster DNS pods are bound and, if every replica sits on one node, deletes
//! the first half of them so the scheduler spreads their replacements over
//! the new node set.
//!
//! # Example
//!
//! ```no_run
//! use kubejoin_phases::{new_reschedule_deployments_phase, KubeJoinData, RescheduleConfig};
//! use kubejoin_workflow::Runner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Runner::new(vec![new_reschedule_deployments_phase(
//!     "kubejoin join phase reschedule-deployments dns",
//! )]);
//! let data = KubeJoinData::new(None, RescheduleConfig::default());
//!
//! runner
//!     .run_phase(&["reschedule-deployments", "dns"], &[], &data)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature to use [`client::mock::MockPodClient`],
//! an in-memory cluster client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod data;
pub mod error;
pub mod phase;
pub mod reschedule;
pub mod types;

pub use client::{KubeClientProvider, KubePodClient, PodClient};
pub use data::{ClientProvider, JoinData, KubeJoinData};
pub use error::{ClientError, RescheduleError, Result};
pub use phase::{new_reschedule_deployments_phase, JoinPhase};
pub use reschedule::{assess_placement, reschedule_dns, run_dns_reschedule, Placement};
pub use types::{PodRecord, RescheduleConfig, RescheduleOutcome};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock::{MockClientProvider, MockPodClient};
