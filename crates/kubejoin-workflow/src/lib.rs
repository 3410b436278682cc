//! Phase tree and runner for kubejoin workflows.
//!
//! A workflow is a tree of named [`Phase`]s. Leaf phases carry an action that
//! receives the workflow's run-time data; grouping phases only carry children.
//! The [`Runner`] resolves a phase by its path, validates positional
//! arguments, and runs every selected action in declaration order.
//!
//! # Example
//!
//! ```
//! use futures::future::BoxFuture;
//! use kubejoin_workflow::{ActionError, ArgsValidator, Phase, Runner};
//!
//! struct Data;
//!
//! fn greet(_data: &Data) -> BoxFuture<'_, Result<(), ActionError>> {
//!     Box::pin(async { Ok(()) })
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let phase = Phase::new("greet", "Say hello")
//!     .with_action(greet)
//!     .with_args_validator(ArgsValidator::NoArgs);
//!
//! let runner = Runner::new(vec![phase]);
//! runner.run_phase(&["greet"], &[], &Data).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod args;
pub mod error;
pub mod phase;
pub mod runner;

pub use args::ArgsValidator;
pub use error::{ActionError, Result, WorkflowError};
pub use phase::{Phase, PhaseAction};
pub use runner::Runner;
