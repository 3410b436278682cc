//! Types for the phases crate.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;

/// Namespace the cluster DNS pods run in.
pub const DEFAULT_DNS_NAMESPACE: &str = "kube-system";

/// Label selector matching the cluster DNS pods.
pub const DEFAULT_DNS_LABEL_SELECTOR: &str = "k8s-app=kube-dns";

/// Snapshot of a pod as returned by a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRecord {
    /// Pod name.
    pub name: String,
    /// Namespace the pod lives in.
    pub namespace: String,
    /// Pod labels.
    pub labels: BTreeMap<String, String>,
    /// Node the pod is bound to, if scheduled.
    pub node_name: Option<String>,
}

impl PodRecord {
    /// Create a record with no labels.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        node_name: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            node_name,
        }
    }

    /// Add a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

}

impl From<Pod> for PodRecord {
    fn from(pod: Pod) -> Self {
        Self {
            name: pod.metadata.name.unwrap_or_default(),
            namespace: pod.metadata.namespace.unwrap_or_default(),
            labels: pod.metadata.labels.unwrap_or_default(),
            node_name: pod
                .spec
                .and_then(|s| s.node_name)
                .filter(|n| !n.is_empty()),
        }
    }
}

/// Where to look for the DNS pods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleConfig {
    /// Namespace of the DNS deployment.
    pub namespace: String,
    /// Label selector for the DNS pods.
    pub dns_label_selector: String,
}

impl Default for RescheduleConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_DNS_NAMESPACE.to_string(),
            dns_label_selector: DEFAULT_DNS_LABEL_SELECTOR.to_string(),
        }
    }
}

impl RescheduleConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `KUBEJOIN_DNS_NAMESPACE`: namespace of the DNS deployment
    /// - `KUBEJOIN_DNS_SELECTOR`: label selector for the DNS pods
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("KUBEJOIN_DNS_NAMESPACE") {
            if !val.is_empty() {
                config.namespace = val;
            }
        }
        if let Ok(val) = std::env::var("KUBEJOIN_DNS_SELECTOR") {
            if !val.is_empty() {
                config.dns_label_selector = val;
            }
        }

        config
    }
}

/// What a reschedule run observed and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescheduleOutcome {
    /// Zero or one replica; nothing to spread.
    NothingToRedistribute {
        /// Number of pods found.
        replicas: usize,
    },
    /// The pods already run on more than one node.
    AlreadySpread {
        /// Number of pods found.
        replicas: usize,
    },
    /// All pods shared a node and some were deleted.
    Rescheduled {
        /// The node every pod was bound to.
        node: Option<String>,
        /// Pods whose delete request succeeded.
        deleted: Vec<String>,
        /// Pods whose delete request failed.
        failed: Vec<String>,
    },
}

impl RescheduleOutcome {
    /// Check if any delete request was issued.
    #[must_use]
    pub fn issued_deletes(&self) -> bool {
        matches!(self, Self::Rescheduled { .. })
    }
}
