//! File-backed feeds built from cluster CLI output.
//!
//! The workloads file is a Kubernetes `List` as produced by
//! `oc get deployments,statefulsets -A -o json`. The topology comes from the
//! `Infrastructure` object named `cluster` (`oc get infrastructure cluster -o
//! json`), either in its own file or as an item of the list.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{InventoryError, InventoryFeed, TopologyFeed};
use crate::types::{ClusterTopology, TopologyMode, WorkloadKind, WorkloadRef};

/// Name of the singleton `Infrastructure` object.
const INFRASTRUCTURE_NAME: &str = "cluster";

#[derive(Debug, Default, Deserialize)]
struct RawObject {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    spec: Option<RawSpec>,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    items: Vec<RawObject>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSpec {
    #[serde(default)]
    replicas: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    control_plane_topology: Option<TopologyMode>,
    #[serde(default)]
    infrastructure_topology: Option<TopologyMode>,
}

impl RawObject {
    /// List items, or the object itself when it is not a list.
    fn into_items(self) -> Vec<RawObject> {
        let is_list = self.kind.as_deref().is_some_and(|k| k.ends_with("List"));
        if is_list || !self.items.is_empty() {
            self.items
        } else {
            vec![self]
        }
    }
}

/// Topology facts as found in a snapshot; either field may be absent.
#[derive(Debug, Clone, Copy, Default)]
struct PartialTopology {
    control_plane: Option<TopologyMode>,
    infrastructure: Option<TopologyMode>,
}

/// Inventory and topology read from snapshot files.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFeed {
    namespaces: BTreeSet<String>,
    workloads: Vec<WorkloadRef>,
    topology: Option<PartialTopology>,
}

impl SnapshotFeed {
    /// Read the workloads file and, optionally, a separate infrastructure file.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if a file cannot be read or parsed, or a
    /// workload item lacks its name or namespace.
    pub async fn load(
        workloads: &Path,
        infrastructure: Option<&Path>,
    ) -> Result<Self, InventoryError> {
        let contents = read(workloads).await?;
        let mut feed = Self::from_json(&contents, &workloads.display().to_string())?;

        if let Some(path) = infrastructure {
            let contents = read(path).await?;
            feed.merge_json(&contents, &path.display().to_string())?;
        }

        debug!(
            namespaces = feed.namespaces.len(),
            workloads = feed.workloads.len(),
            has_topology = feed.topology.is_some(),
            "snapshot loaded"
        );
        Ok(feed)
    }

    /// Build a feed from one JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] on malformed JSON or items.
    pub fn from_json(contents: &str, origin: &str) -> Result<Self, InventoryError> {
        let mut feed = Self::default();
        feed.merge_json(contents, origin)?;
        Ok(feed)
    }

    /// Add the objects of another JSON document to this feed.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] on malformed JSON or items.
    pub fn merge_json(&mut self, contents: &str, origin: &str) -> Result<(), InventoryError> {
        let root: RawObject =
            serde_json::from_str(contents).map_err(|source| InventoryError::Parse {
                path: origin.to_owned(),
                source,
            })?;

        for (index, item) in root.into_items().into_iter().enumerate() {
            self.absorb(index, item)?;
        }
        Ok(())
    }

    fn absorb(&mut self, index: usize, item: RawObject) -> Result<(), InventoryError> {
        let kind_name = item.kind.clone().unwrap_or_default();
        let kind = match kind_name.as_str() {
            "Deployment" => WorkloadKind::Deployment,
            "StatefulSet" => WorkloadKind::StatefulSet,
            "Namespace" => {
                if let Some(name) = item.metadata.name {
                    self.namespaces.insert(name);
                }
                return Ok(());
            }
            "Infrastructure" => {
                let name = item.metadata.name.as_deref().unwrap_or(INFRASTRUCTURE_NAME);
                if name == INFRASTRUCTURE_NAME {
                    let status = item.status.unwrap_or_default();
                    self.topology = Some(PartialTopology {
                        control_plane: status.control_plane_topology,
                        infrastructure: status.infrastructure_topology,
                    });
                }
                return Ok(());
            }
            other => {
                debug!(kind = other, index, "ignoring snapshot item");
                return Ok(());
            }
        };

        let malformed = |field| InventoryError::MalformedItem {
            kind: kind_name.clone(),
            index,
            field,
        };
        let name = item.metadata.name.ok_or_else(|| malformed("metadata.name"))?;
        let namespace = item
            .metadata
            .namespace
            .ok_or_else(|| malformed("metadata.namespace"))?;
        let declared_replicas = item.spec.and_then(|s| s.replicas);

        self.namespaces.insert(namespace.clone());
        self.workloads.push(WorkloadRef {
            name,
            namespace,
            kind,
            declared_replicas,
        });
        Ok(())
    }

    fn in_namespace(&self, namespace: &str, kind: WorkloadKind) -> Vec<WorkloadRef> {
        self.workloads
            .iter()
            .filter(|w| w.kind == kind && w.namespace == namespace)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InventoryFeed for SnapshotFeed {
    async fn namespaces(&self) -> Result<Vec<String>, InventoryError> {
        Ok(self.namespaces.iter().cloned().collect())
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError> {
        Ok(self.in_namespace(namespace, WorkloadKind::Deployment))
    }

    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InventoryError> {
        Ok(self.in_namespace(namespace, WorkloadKind::StatefulSet))
    }
}

#[async_trait]
impl TopologyFeed for SnapshotFeed {
    async fn topology(&self) -> Result<ClusterTopology, InventoryError> {
        let partial = self.topology.ok_or_else(|| {
            InventoryError::TopologyUnavailable("snapshot has no Infrastructure object".to_owned())
        })?;
        let control_plane = partial.control_plane.ok_or_else(|| {
            InventoryError::TopologyUnavailable("status.controlPlaneTopology is not set".to_owned())
        })?;
        let infrastructure = partial.infrastructure.ok_or_else(|| {
            InventoryError::TopologyUnavailable(
                "status.infrastructureTopology is not set".to_owned(),
            )
        })?;
        Ok(ClusterTopology::new(control_plane, infrastructure))
    }
}

async fn read(path: &Path) -> Result<String, InventoryError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InventoryError::Read {
            path: path.display().to_string(),
            source,
        })
}
