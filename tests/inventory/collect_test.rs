//! Inventory collection tests.

use async_trait::async_trait;
use topoaudit::inventory::{
    collect_inventory, is_platform_namespace, InventoryError, InventoryFeed, StaticTopology,
    TopologyFeed, DEFAULT_NAMESPACE_PREFIX,
};
use topoaudit::types::{ClusterTopology, TopologyMode, WorkloadKind, WorkloadRef};

/// In-memory feed with a fixed namespace order.
struct FakeFeed {
    namespaces: Vec<&'static str>,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl InventoryFeed for FakeFeed {
    async fn namespaces(&self) -> Result<Vec<String>, InventoryError> {
        Ok(self.namespaces.iter().map(|n| (*n).to_owned()).collect())
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError> {
        if self.fail_on == Some(namespace) {
            return Err(InventoryError::TopologyUnavailable("boom".to_owned()));
        }
        Ok(vec![WorkloadRef::deployment(namespace, "operator", Some(1))])
    }

    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError> {
        Ok(vec![WorkloadRef::stateful_set(namespace, "db", Some(1))])
    }
}

#[test]
fn platform_namespace_prefix() {
    assert!(is_platform_namespace("openshift-etcd", DEFAULT_NAMESPACE_PREFIX));
    assert!(!is_platform_namespace("openshift", DEFAULT_NAMESPACE_PREFIX));
    assert!(!is_platform_namespace("kube-system", DEFAULT_NAMESPACE_PREFIX));
}

#[tokio::test]
async fn collects_only_platform_namespaces() {
    let feed = FakeFeed {
        namespaces: vec!["default", "openshift-etcd", "kube-system", "openshift-dns"],
        fail_on: None,
    };
    let inventory = collect_inventory(&feed, DEFAULT_NAMESPACE_PREFIX)
        .await
        .expect("collect");

    assert_eq!(inventory.len(), 4);
    assert!(inventory
        .iter()
        .all(|w| w.namespace.starts_with("openshift-")));
    // Deployments before StatefulSets within a namespace.
    assert_eq!(inventory[0].kind, WorkloadKind::Deployment);
    assert_eq!(inventory[1].kind, WorkloadKind::StatefulSet);
    assert_eq!(inventory[0].namespace, "openshift-etcd");
}

#[tokio::test]
async fn custom_prefix() {
    let feed = FakeFeed {
        namespaces: vec!["openshift-etcd", "platform-core"],
        fail_on: None,
    };
    let inventory = collect_inventory(&feed, "platform-").await.expect("collect");
    assert_eq!(inventory.len(), 2);
    assert!(inventory.iter().all(|w| w.namespace == "platform-core"));
}

#[tokio::test]
async fn feed_errors_propagate() {
    let feed = FakeFeed {
        namespaces: vec!["openshift-etcd"],
        fail_on: Some("openshift-etcd"),
    };
    assert!(collect_inventory(&feed, DEFAULT_NAMESPACE_PREFIX)
        .await
        .is_err());
}

#[tokio::test]
async fn static_topology_returns_its_value() {
    let topology = ClusterTopology::new(TopologyMode::SingleReplica, TopologyMode::HighlyAvailable);
    let feed = StaticTopology(topology);
    assert_eq!(feed.topology().await.expect("static"), topology);
}
