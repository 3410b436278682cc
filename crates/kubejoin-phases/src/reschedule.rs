//! DNS rescheduling after a control-plane join.
//!
//! When a control-plane node joins, every DNS replica may still be bound to
//! the node that existed before. If so, the first half of the replicas (in
//! list order) is deleted so the scheduler places their replacements on the
//! larger node set.

use tracing::{debug, info, warn};

use crate::client::PodClient;
use crate::data::JoinData;
use crate::error::{RescheduleError, Result};
use crate::types::{PodRecord, RescheduleConfig, RescheduleOutcome};

/// How a set of replicas is spread over nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// Zero or one replica.
    TooFewReplicas,
    /// At least two replicas run on different nodes.
    Spread,
    /// Every replica runs on `node`; `victims` should be deleted.
    CoLocated {
        /// The shared node.
        node: Option<&'a str>,
        /// The first half of the replicas, in list order.
        victims: &'a [PodRecord],
    },
}

/// Decide whether `pods` need rescheduling and which of them to delete.
///
/// The scan stops at the first pod bound to a different node than the first
/// pod. When all pods share a node, the first `len / 2` are selected.
#[must_use]
pub fn assess_placement(pods: &[PodRecord]) -> Placement<'_> {
    let Some((reference, rest)) = pods.split_first() else {
        return Placement::TooFewReplicas;
    };
    if rest.is_empty() {
        return Placement::TooFewReplicas;
    }

    if rest.iter().any(|pod| pod.node_name != reference.node_name) {
        return Placement::Spread;
    }

    Placement::CoLocated {
        node: reference.node_name.as_deref(),
        victims: &pods[..pods.len() / 2],
    }
}

/// Rebalance the DNS pods described by `config` using `client`.
///
/// Delete failures are logged and reported in the outcome; they do not stop
/// the remaining deletes and do not make the call fail.
///
/// # Errors
///
/// Returns [`RescheduleError::Query`] if the DNS pods cannot be listed.
pub async fn reschedule_dns(
    client: &dyn PodClient,
    config: &RescheduleConfig,
) -> Result<RescheduleOutcome> {
    let pods = client
        .list_pods(&config.namespace, &config.dns_label_selector)
        .await
        .map_err(RescheduleError::Query)?;
    let replicas = pods.len();

    let (node, victims) = match assess_placement(&pods) {
        Placement::TooFewReplicas => {
            debug!(replicas, "Not enough DNS replicas to redistribute");
            return Ok(RescheduleOutcome::NothingToRedistribute { replicas });
        }
        Placement::Spread => {
            debug!(replicas, "DNS replicas already spread across nodes");
            return Ok(RescheduleOutcome::AlreadySpread { replicas });
        }
        Placement::CoLocated { node, victims } => (node, victims),
    };

    info!(
        namespace = %config.namespace,
        node = node.unwrap_or("<unscheduled>"),
        replicas,
        deleting = victims.len(),
        "All DNS replicas share one node, deleting pods to reschedule them"
    );

    let mut deleted = Vec::with_capacity(victims.len());
    let mut failed = Vec::new();
    for pod in victims {
        match client.delete_pod(&config.namespace, &pod.name).await {
            Ok(()) => deleted.push(pod.name.clone()),
            Err(e) => {
                warn!(
                    namespace = %config.namespace,
                    pod = %pod.name,
                    error = %e.chain(),
                    "Failed to delete DNS pod"
                );
                failed.push(pod.name.clone());
            }
        }
    }

    if !failed.is_empty() {
        warn!(
            failed = failed.len(),
            deleted = deleted.len(),
            "Some DNS pods were not deleted and stay on their current node"
        );
    }

    Ok(RescheduleOutcome::Rescheduled {
        node: node.map(str::to_string),
        deleted,
        failed,
    })
}

/// Run the DNS reschedule against the cluster provided by `data`.
///
/// # Errors
///
/// Returns [`RescheduleError::Configuration`] if `data` cannot provide a
/// cluster client, [`RescheduleError::ClientInit`] if the client cannot be
/// created, and [`RescheduleError::Query`] if the DNS pods cannot be listed.
pub async fn run_dns_reschedule(data: &dyn JoinData) -> Result<RescheduleOutcome> {
    let provider = data.client_provider().ok_or_else(|| {
        RescheduleError::Configuration(
            "reschedule-deployments phase invoked with run data that cannot provide a Kubernetes client"
                .to_string(),
        )
    })?;

    let client = provider
        .client_set()
        .await
        .map_err(RescheduleError::ClientInit)?;

    reschedule_dns(client.as_ref(), &data.reschedule_config()).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::mock::{MockClientProvider, MockPodClient};
    use crate::data::ClientProvider;

    const NS: &str = "kube-system";

    fn pod(name: &str, node: Option<&str>) -> PodRecord {
        PodRecord::new(name, NS, node.map(str::to_string)).with_label("k8s-app", "kube-dns")
    }

    fn on(node: &str, names: &[&str]) -> Vec<PodRecord> {
        names.iter().map(|n| pod(n, Some(node))).collect()
    }

    async fn run(pods: Vec<PodRecord>) -> (RescheduleOutcome, MockPodClient) {
        let client = MockPodClient::new(pods);
        let outcome = reschedule_dns(&client, &RescheduleConfig::default())
            .await
            .unwrap();
        (outcome, client)
    }

    struct TestJoinData {
        provider: Option<MockClientProvider>,
    }

    impl JoinData for TestJoinData {
        fn client_provider(&self) -> Option<&dyn ClientProvider> {
            self.provider.as_ref().map(|p| p as &dyn ClientProvider)
        }
    }

    #[tokio::test]
    async fn empty_collection_is_a_noop() {
        let (outcome, client) = run(vec![]).await;

        assert_eq!(outcome, RescheduleOutcome::NothingToRedistribute { replicas: 0 });
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn single_replica_is_a_noop() {
        let (outcome, client) = run(on("node1", &["a"])).await;

        assert_eq!(outcome, RescheduleOutcome::NothingToRedistribute { replicas: 1 });
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn two_replicas_on_different_nodes() {
        let (outcome, client) = run(vec![pod("a", Some("node1")), pod("b", Some("node2"))]).await;

        assert_eq!(outcome, RescheduleOutcome::AlreadySpread { replicas: 2 });
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn mismatch_at_last_position() {
        let mut pods = on("node1", &["a", "b", "c"]);
        pods.push(pod("d", Some("node2")));

        let (outcome, client) = run(pods).await;

        assert_eq!(outcome, RescheduleOutcome::AlreadySpread { replicas: 4 });
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn unscheduled_reference_differs_from_scheduled_pods() {
        let (outcome, client) = run(vec![
            pod("a", None),
            pod("b", Some("node1")),
            pod("c", Some("node1")),
        ])
        .await;

        assert_eq!(outcome, RescheduleOutcome::AlreadySpread { replicas: 3 });
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn two_colocated_replicas_delete_the_first() {
        let (outcome, client) = run(on("node1", &["a", "b"])).await;

        assert_eq!(
            outcome,
            RescheduleOutcome::Rescheduled {
                node: Some("node1".to_string()),
                deleted: vec!["a".to_string()],
                failed: vec![],
            }
        );
        assert_eq!(client.delete_requests(), vec!["a"]);
        assert_eq!(client.pod_names(), vec!["b"]);
    }

    #[tokio::test]
    async fn three_colocated_replicas_delete_one() {
        let (_, client) = run(on("node1", &["a", "b", "c"])).await;

        assert_eq!(client.delete_requests(), vec!["a"]);
        assert_eq!(client.pod_names(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn four_colocated_replicas_delete_first_half_in_order() {
        let (_, client) = run(on("node1", &["a", "b", "c", "d"])).await;

        assert_eq!(client.delete_requests(), vec!["a", "b"]);
        assert_eq!(client.pod_names(), vec!["c", "d"]);
    }

    #[test]
    fn selection_is_floor_of_half() {
        for n in 2..=9 {
            let names: Vec<String> = (0..n).map(|i| format!("dns-{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let pods = on("node1", &refs);

            match assess_placement(&pods) {
                Placement::CoLocated { node, victims } => {
                    assert_eq!(node, Some("node1"));
                    assert_eq!(victims, &pods[..n / 2]);
                }
                other => panic!("expected co-located placement, got {other:?}"),
            }
        }
    }

    #[test]
    fn unscheduled_pods_count_as_colocated() {
        let pods = vec![pod("a", None), pod("b", None)];

        assert_eq!(
            assess_placement(&pods),
            Placement::CoLocated {
                node: None,
                victims: &pods[..1],
            }
        );
    }

    #[tokio::test]
    async fn list_failure_is_a_query_error() {
        let client = MockPodClient::new(on("node1", &["a", "b"]));
        client.fail_list("connection refused");

        let err = reschedule_dns(&client, &RescheduleConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RescheduleError::Query(_)));
        assert_eq!(err.to_string(), "couldn't list DNS pods");
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string).as_deref(),
            Some("cluster unavailable: connection refused")
        );
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_does_not_stop_the_batch() {
        let client = MockPodClient::new(on("node1", &["a", "b", "c", "d"]));
        client.fail_delete("a");

        let outcome = reschedule_dns(&client, &RescheduleConfig::default())
            .await
            .unwrap();

        assert_eq!(client.delete_requests(), vec!["a", "b"]);
        assert_eq!(
            outcome,
            RescheduleOutcome::Rescheduled {
                node: Some("node1".to_string()),
                deleted: vec!["b".to_string()],
                failed: vec!["a".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn spread_cluster_is_idempotent() {
        let client = MockPodClient::new(vec![
            pod("a", Some("node1")),
            pod("b", Some("node2")),
            pod("c", Some("node1")),
        ]);
        let config = RescheduleConfig::default();

        for _ in 0..2 {
            let outcome = reschedule_dns(&client, &config).await.unwrap();
            assert!(!outcome.issued_deletes());
        }
        assert_eq!(client.list_calls(), 2);
        assert!(client.delete_requests().is_empty());
    }

    #[tokio::test]
    async fn uses_configured_namespace_and_selector() {
        let client = MockPodClient::new(vec![
            PodRecord::new("x", "dns", Some("node1".to_string())).with_label("app", "coredns"),
            PodRecord::new("y", "dns", Some("node1".to_string())).with_label("app", "coredns"),
            pod("a", Some("node1")),
            pod("b", Some("node1")),
        ]);
        let config = RescheduleConfig {
            namespace: "dns".to_string(),
            dns_label_selector: "app=coredns".to_string(),
        };

        reschedule_dns(&client, &config).await.unwrap();

        assert_eq!(client.delete_requests(), vec!["x"]);
    }

    #[tokio::test]
    async fn run_data_without_client_is_a_configuration_error() {
        let data = TestJoinData { provider: None };

        let err = run_dns_reschedule(&data).await.unwrap_err();

        assert!(matches!(err, RescheduleError::Configuration(_)));
    }

    #[tokio::test]
    async fn client_creation_failure_is_a_client_init_error() {
        let data = TestJoinData {
            provider: Some(MockClientProvider::failing("no kubeconfig")),
        };

        let err = run_dns_reschedule(&data).await.unwrap_err();

        assert!(matches!(err, RescheduleError::ClientInit(_)));
        assert!(err
            .to_string()
            .starts_with("couldn't create Kubernetes client"));
    }

    #[tokio::test]
    async fn run_through_join_data() {
        let client = Arc::new(MockPodClient::new(on("node1", &["a", "b"])));
        let data = TestJoinData {
            provider: Some(MockClientProvider::new(Arc::clone(&client))),
        };

        let outcome = run_dns_reschedule(&data).await.unwrap();

        assert!(outcome.issued_deletes());
        assert_eq!(client.delete_requests(), vec!["a"]);
    }
}
