//! Decides whether a workload falls under the single-replica rule.

use crate::types::{Classification, ClusterTopology};

/// Infrastructure workloads follow the infrastructure topology, everything
/// else follows the control-plane topology. Subject iff that mode is
/// single-replica.
pub fn is_subject_to_single_replica_rule(
    classification: Classification,
    topology: &ClusterTopology,
) -> bool {
    let governing = match classification {
        Classification::Infrastructure => topology.infrastructure,
        Classification::ControlPlane => topology.control_plane,
    };
    governing.is_single_replica()
}
