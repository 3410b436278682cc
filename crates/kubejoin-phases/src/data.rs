//! Run-time data handed to join phases.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::client::{KubeClientProvider, PodClient};
use crate::error::ClientResult;
use crate::types::RescheduleConfig;

/// Supplies a cluster client on demand.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Return a client for the target cluster, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    async fn client_set(&self) -> ClientResult<Arc<dyn PodClient>>;
}

/// Data shared by every phase of a control-plane join.
pub trait JoinData: Send + Sync {
    /// Access to the cluster, if this data can provide it.
    fn client_provider(&self) -> Option<&dyn ClientProvider> {
        None
    }

    /// Where the DNS pods live.
    fn reschedule_config(&self) -> RescheduleConfig {
        RescheduleConfig::default()
    }
}

/// Join data backed by a real cluster.
pub struct KubeJoinData {
    provider: KubeClientProvider,
    config: RescheduleConfig,
}

impl KubeJoinData {
    /// Create join data that connects with `kubeconfig`, or with the inferred
    /// configuration when `None`.
    #[must_use]
    pub fn new(kubeconfig: Option<PathBuf>, config: RescheduleConfig) -> Self {
        Self {
            provider: KubeClientProvider::new(kubeconfig),
            config,
        }
    }
}

impl JoinData for KubeJoinData {
    fn client_provider(&self) -> Option<&dyn ClientProvider> {
        Some(&self.provider)
    }

    fn reschedule_config(&self) -> RescheduleConfig {
        self.config.clone()
    }
}
