//! Input feeds: workload inventory and cluster topology.
//!
//! The engine never talks to a cluster. It consumes these two traits, which
//! are implemented here from captured snapshot files
//! ([`snapshot::SnapshotFeed`]) and from explicit values
//! ([`StaticTopology`]).

use async_trait::async_trait;
use tracing::debug;

use crate::types::{ClusterTopology, WorkloadRef};

pub mod snapshot;

/// Namespace prefix marking platform ownership.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "openshift-";

/// Errors from the input feeds.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A snapshot file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot file is not the expected JSON shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A workload item is missing a required field.
    #[error("{kind} item #{index} has no {field}")]
    MalformedItem {
        /// Kubernetes kind of the item.
        kind: String,
        /// Position in the list.
        index: usize,
        /// The missing field path.
        field: &'static str,
    },

    /// No source supplied the topology facts.
    #[error("cluster topology unavailable: {0}")]
    TopologyUnavailable(String),
}

/// Read-only view of the platform workloads in a cluster.
#[async_trait]
pub trait InventoryFeed: Send + Sync {
    /// All namespace names known to the feed.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if the source cannot be read.
    async fn namespaces(&self) -> Result<Vec<String>, InventoryError>;

    /// Deployments in one namespace.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if the source cannot be read.
    async fn deployments(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError>;

    /// StatefulSets in one namespace.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if the source cannot be read.
    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError>;
}

/// Source of the cluster's topology facts, read once per run.
#[async_trait]
pub trait TopologyFeed: Send + Sync {
    /// Control-plane and infrastructure topology.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::TopologyUnavailable`] when the facts are missing.
    async fn topology(&self) -> Result<ClusterTopology, InventoryError>;
}

/// Topology supplied directly, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct StaticTopology(pub ClusterTopology);

#[async_trait]
impl TopologyFeed for StaticTopology {
    async fn topology(&self) -> Result<ClusterTopology, InventoryError> {
        Ok(self.0)
    }
}

/// Whether a namespace is platform-owned.
pub fn is_platform_namespace(namespace: &str, prefix: &str) -> bool {
    namespace.starts_with(prefix)
}

/// Gather every Deployment and StatefulSet from platform namespaces.
///
/// Namespaces are visited in the order the feed returns them; Deployments
/// come before StatefulSets within each.
///
/// # Errors
///
/// Returns the first feed error encountered.
pub async fn collect_inventory(
    feed: &dyn InventoryFeed,
    prefix: &str,
) -> Result<Vec<WorkloadRef>, InventoryError> {
    let mut inventory = Vec::new();

    for namespace in feed.namespaces().await? {
        if !is_platform_namespace(&namespace, prefix) {
            continue;
        }

        let deployments = feed.deployments(&namespace).await?;
        let stateful_sets = feed.stateful_sets(&namespace).await?;
        debug!(
            namespace = %namespace,
            deployments = deployments.len(),
            stateful_sets = stateful_sets.len(),
            "namespace collected"
        );

        inventory.extend(deployments);
        inventory.extend(stateful_sets);
    }

    Ok(inventory)
}
