//! Core types shared by the audit engine, the inventory feeds and the sinks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Topology mode reported by the cluster for one dimension.
///
/// Only [`TopologyMode::SingleReplica`] carries meaning for the audit; every
/// other mode is treated as "not single-replica".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyMode {
    /// One replica per component.
    SingleReplica,
    /// Redundant replicas per component.
    HighlyAvailable,
    /// Component runs outside the cluster (hosted control planes).
    External,
    /// Any value this build does not recognise.
    #[serde(other)]
    Other,
}

impl TopologyMode {
    /// Whether this mode demands a single replica.
    pub fn is_single_replica(self) -> bool {
        self == Self::SingleReplica
    }

    /// The spelling used by the cluster API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleReplica => "SingleReplica",
            Self::HighlyAvailable => "HighlyAvailable",
            Self::External => "External",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for TopologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known topology mode.
#[derive(Debug, thiserror::Error)]
#[error("unknown topology mode: {0:?} (expected SingleReplica, HighlyAvailable or External)")]
pub struct UnknownTopologyMode(pub String);

impl FromStr for TopologyMode {
    type Err = UnknownTopologyMode;

    /// Parse the exact cluster API spelling.
    ///
    /// Unlike deserialization, unknown values are an error rather than
    /// [`TopologyMode::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SingleReplica" => Ok(Self::SingleReplica),
            "HighlyAvailable" => Ok(Self::HighlyAvailable),
            "External" => Ok(Self::External),
            _ => Err(UnknownTopologyMode(s.to_owned())),
        }
    }
}

/// The pair of topology facts fetched once per audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    /// Topology governing control-plane workloads.
    pub control_plane: TopologyMode,
    /// Topology governing infrastructure workloads.
    pub infrastructure: TopologyMode,
}

impl ClusterTopology {
    /// Build a topology pair.
    pub fn new(control_plane: TopologyMode, infrastructure: TopologyMode) -> Self {
        Self {
            control_plane,
            infrastructure,
        }
    }

    /// Whether either dimension is single-replica.
    ///
    /// When this is false the audit has nothing to check.
    pub fn any_single_replica(&self) -> bool {
        self.control_plane.is_single_replica() || self.infrastructure.is_single_replica()
    }
}

// ---------------------------------------------------------------------------
// Workloads
// ---------------------------------------------------------------------------

/// Kind of a scalable platform workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    /// `apps/v1` Deployment.
    Deployment,
    /// `apps/v1` StatefulSet.
    StatefulSet,
}

impl WorkloadKind {
    /// The Kubernetes `kind` string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known workload kind.
#[derive(Debug, thiserror::Error)]
#[error("unknown workload kind: {0:?} (expected Deployment or StatefulSet)")]
pub struct UnknownWorkloadKind(pub String);

impl FromStr for WorkloadKind {
    type Err = UnknownWorkloadKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" | "deployments" | "deploy" => Ok(Self::Deployment),
            "statefulset" | "statefulsets" | "sts" => Ok(Self::StatefulSet),
            _ => Err(UnknownWorkloadKind(s.to_owned())),
        }
    }
}

/// A platform workload observed in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadRef {
    /// Workload name.
    pub name: String,
    /// Namespace the workload lives in.
    pub namespace: String,
    /// Deployment or StatefulSet.
    pub kind: WorkloadKind,
    /// `spec.replicas` as declared; `None` when the field was absent.
    pub declared_replicas: Option<u32>,
}

impl WorkloadRef {
    /// Build a Deployment reference.
    pub fn deployment(namespace: &str, name: &str, replicas: Option<u32>) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            kind: WorkloadKind::Deployment,
            declared_replicas: replicas,
        }
    }

    /// Build a StatefulSet reference.
    pub fn stateful_set(namespace: &str, name: &str, replicas: Option<u32>) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            kind: WorkloadKind::StatefulSet,
            declared_replicas: replicas,
        }
    }

    /// Sort key giving reports a stable order.
    pub fn sort_key(&self) -> (&str, WorkloadKind, &str) {
        (&self.namespace, self.kind, &self.name)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Which topology dimension governs a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Governed by the infrastructure topology.
    Infrastructure,
    /// Governed by the control-plane topology.
    ControlPlane,
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Why a workload failed the single-replica rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationReason {
    /// The declared replica count is not the expected one.
    WrongReplicaCount {
        /// Replicas the topology expects.
        expected: u32,
        /// Replicas the workload declares.
        actual: u32,
    },
    /// The workload declares no replica count at all.
    MissingReplicaCount,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongReplicaCount { expected, actual } => write!(
                f,
                "has wrong number of replicas: expected {expected}, found {actual}"
            ),
            Self::MissingReplicaCount => f.write_str("does not declare a replica count"),
        }
    }
}

/// Outcome of validating one workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    /// The workload matches the expectation, or is outside the rule.
    Compliant,
    /// The workload breaks the rule.
    Violation(ViolationReason),
    /// Allow-listed workload that is already compliant; the entry can go.
    CompliantWithWarning(String),
}

impl Verdict {
    /// Whether this verdict fails the run.
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    /// Whether this verdict carries an advisory.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::CompliantWithWarning(_))
    }
}
