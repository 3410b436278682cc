//! Cluster client used by the join phases.
//!
//! [`PodClient`] is the narrow view of the API server the phases need. The
//! [`KubePodClient`] implementation talks to a real cluster through `kube`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams};
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use kube::Client;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::data::ClientProvider;
use crate::error::ClientResult;
use crate::types::PodRecord;

/// List and delete pods in a cluster.
#[async_trait]
pub trait PodClient: Send + Sync {
    /// List pods in `namespace` matching `label_selector`, in API order.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails.
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> ClientResult<Vec<PodRecord>>;

    /// Delete the pod `name` in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete call fails.
    async fn delete_pod(&self, namespace: &str, name: &str) -> ClientResult<()>;
}

/// Pod client backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
}

impl KubePodClient {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the inferred configuration (`KUBECONFIG` or
    /// `~/.kube/config`, then in-cluster).
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is found or it is invalid.
    pub async fn try_default() -> ClientResult<Self> {
        let config = Config::infer().await?;
        Ok(Self::new(Client::try_from(config)?))
    }

    /// Connect using the kubeconfig file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub async fn from_kubeconfig(path: &std::path::Path) -> ClientResult<Self> {
        let kubeconfig = Kubeconfig::read_from(path)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        Ok(Self::new(Client::try_from(config)?))
    }

    fn pods_api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> ClientResult<Vec<PodRecord>> {
        let params = ListParams::default().labels(label_selector);
        let pods = self.pods_api(namespace).list(&params).await?;

        debug!(
            namespace,
            label_selector,
            count = pods.items.len(),
            "Listed pods"
        );

        Ok(pods.items.into_iter().map(PodRecord::from).collect())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> ClientResult<()> {
        self.pods_api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        debug!(namespace, pod = name, "Deleted pod");
        Ok(())
    }
}

/// Creates a [`KubePodClient`] on first use and shares it afterwards.
pub struct KubeClientProvider {
    kubeconfig: Option<PathBuf>,
    client: OnceCell<Arc<KubePodClient>>,
}

impl KubeClientProvider {
    /// Create a provider for the kubeconfig at `kubeconfig`, or the inferred
    /// configuration when `None`.
    #[must_use]
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubeconfig,
            client: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ClientProvider for KubeClientProvider {
    async fn client_set(&self) -> ClientResult<Arc<dyn PodClient>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client = match &self.kubeconfig {
                    Some(path) => {
                        debug!(kubeconfig = %path.display(), "Creating Kubernetes client");
                        KubePodClient::from_kubeconfig(path).await?
                    }
                    None => {
                        debug!("Creating Kubernetes client from inferred configuration");
                        KubePodClient::try_default().await?
                    }
                };
                ClientResult::Ok(Arc::new(client))
            })
            .await?;

        Ok(Arc::clone(client) as Arc<dyn PodClient>)
    }
}

/// In-memory cluster client for testing without a real cluster.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use crate::error::ClientError;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// A pod client that stores pods in memory.
    #[derive(Default)]
    pub struct MockPodClient {
        pods: Mutex<Vec<PodRecord>>,
        list_error: Mutex<Option<String>>,
        failing_deletes: Mutex<HashSet<String>>,
        delete_requests: Mutex<Vec<String>>,
        list_calls: Mutex<usize>,
    }

    impl MockPodClient {
        /// Create a mock holding `pods`, in list order.
        #[must_use]
        pub fn new(pods: Vec<PodRecord>) -> Self {
            Self {
                pods: Mutex::new(pods),
                ..Self::default()
            }
        }

        /// Make every list call fail with `message`.
        pub fn fail_list(&self, message: impl Into<String>) {
            *self.list_error.lock() = Some(message.into());
        }

        /// Make deleting the pod `name` fail.
        pub fn fail_delete(&self, name: impl Into<String>) {
            self.failing_deletes.lock().insert(name.into());
        }

        /// Names passed to every delete call, in order, including failed ones.
        #[must_use]
        pub fn delete_requests(&self) -> Vec<String> {
            self.delete_requests.lock().clone()
        }

        /// Number of list calls made.
        #[must_use]
        pub fn list_calls(&self) -> usize {
            *self.list_calls.lock()
        }

        /// Names of the pods still present.
        #[must_use]
        pub fn pod_names(&self) -> Vec<String> {
            self.pods.lock().iter().map(|p| p.name.clone()).collect()
        }
    }

    #[async_trait]
    impl PodClient for MockPodClient {
        async fn list_pods(
            &self,
            namespace: &str,
            label_selector: &str,
        ) -> ClientResult<Vec<PodRecord>> {
            *self.list_calls.lock() += 1;

            if let Some(message) = self.list_error.lock().clone() {
                return Err(ClientError::Unavailable(message));
            }
            let requirements = parse_selector(label_selector)?;

            Ok(self
                .pods
                .lock()
                .iter()
                .filter(|p| p.namespace == namespace && matches_all(p, &requirements))
                .cloned()
                .collect())
        }

        async fn delete_pod(&self, namespace: &str, name: &str) -> ClientResult<()> {
            self.delete_requests.lock().push(name.to_string());

            if self.failing_deletes.lock().contains(name) {
                return Err(ClientError::Unavailable(format!(
                    "delete of {namespace}/{name} refused"
                )));
            }

            let mut pods = self.pods.lock();
            let before = pods.len();
            pods.retain(|p| !(p.namespace == namespace && p.name == name));
            if pods.len() == before {
                return Err(ClientError::Unavailable(format!(
                    "pod {namespace}/{name} not found"
                )));
            }
            Ok(())
        }
    }

    /// Parse an equality-based selector (`k=v`, `k==v`, bare `k`) into
    /// `(key, value)` pairs. Set-based terms and `!=` are refused rather than
    /// guessed at.
    fn parse_selector(selector: &str) -> ClientResult<Vec<(&str, Option<&str>)>> {
        let is_label = |s: &str| {
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        };

        selector
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| {
                let (key, value) = match term.split_once("==").or_else(|| term.split_once('=')) {
                    Some((key, value)) => (key.trim(), Some(value.trim())),
                    None => (term, None),
                };
                if key.is_empty() || !is_label(key) || !value.is_none_or(is_label) {
                    return Err(ClientError::Unavailable(format!(
                        "unsupported label selector term {term:?}"
                    )));
                }
                Ok((key, value))
            })
            .collect()
    }

    fn matches_all(pod: &PodRecord, requirements: &[(&str, Option<&str>)]) -> bool {
        requirements.iter().all(|(key, value)| match value {
            Some(value) => pod.labels.get(*key).map(String::as_str) == Some(*value),
            None => pod.labels.contains_key(*key),
        })
    }

    /// A client provider that hands out a fixed mock, or fails.
    pub struct MockClientProvider {
        client: Option<Arc<MockPodClient>>,
        error: String,
    }

    impl MockClientProvider {
        /// Provide `client` on every call.
        #[must_use]
        pub fn new(client: Arc<MockPodClient>) -> Self {
            Self {
                client: Some(client),
                error: String::new(),
            }
        }

        /// Fail every call with `message`.
        #[must_use]
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                client: None,
                error: message.into(),
            }
        }
    }

    #[async_trait]
    impl ClientProvider for MockClientProvider {
        async fn client_set(&self) -> ClientResult<Arc<dyn PodClient>> {
            match &self.client {
                Some(client) => Ok(Arc::clone(client) as Arc<dyn PodClient>),
                None => Err(ClientError::Unavailable(self.error.clone())),
            }
        }
    }
}
