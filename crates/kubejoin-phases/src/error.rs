//! Error types for the phases crate.
//!
//! Variants that wrap another error keep it as their `source` and leave it out
//! of their own message, so a caller printing the chain shows each cause once.

use std::error::Error as _;

use kube::config::{InferConfigError, KubeconfigError};
use thiserror::Error;

/// Errors raised by a cluster client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Kubernetes API error.
    #[error("Kubernetes API error")]
    Kube(#[from] kube::Error),

    /// The kubeconfig file could not be loaded.
    #[error("failed to load kubeconfig")]
    Kubeconfig(#[from] KubeconfigError),

    /// No in-cluster or local configuration could be found.
    #[error("failed to infer cluster configuration")]
    InferConfig(#[from] InferConfigError),

    /// The cluster could not be reached.
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Render this error and its causes on one line, for log fields.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}

/// A specialized Result type for cluster client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while rescheduling deployments.
#[derive(Error, Debug)]
pub enum RescheduleError {
    /// The run-time data does not provide what the phase needs.
    #[error("invalid run data: {0}")]
    Configuration(String),

    /// The cluster client could not be created.
    #[error("couldn't create Kubernetes client")]
    ClientInit(#[source] ClientError),

    /// The DNS pods could not be listed.
    #[error("couldn't list DNS pods")]
    Query(#[source] ClientError),
}

/// A specialized Result type for reschedule operations.
pub type Result<T> = std::result::Result<T, RescheduleError>;
