//! Replica count validation for a single workload.

use crate::types::{Verdict, ViolationReason, WorkloadRef};

/// Replicas every subject workload must declare.
pub const EXPECTED_REPLICAS: u32 = 1;

/// Produce the verdict for one workload.
///
/// Workloads outside the rule are compliant without looking at replicas. A
/// subject workload with no declared count is a violation, allow-listed or
/// not. Allow-listed workloads otherwise never fail; when they already run
/// the expected count the verdict carries a pruning advisory.
pub fn validate(workload: &WorkloadRef, subject_to_rule: bool, allowed_to_fail: bool) -> Verdict {
    if !subject_to_rule {
        return Verdict::Compliant;
    }

    let Some(actual) = workload.declared_replicas else {
        return Verdict::Violation(ViolationReason::MissingReplicaCount);
    };

    match (allowed_to_fail, actual == EXPECTED_REPLICAS) {
        (false, true) => Verdict::Compliant,
        (false, false) => Verdict::Violation(ViolationReason::WrongReplicaCount {
            expected: EXPECTED_REPLICAS,
            actual,
        }),
        (true, true) => Verdict::CompliantWithWarning(format!(
            "{} in namespace {} has one replica, consider taking it off the topology allow-list",
            workload.name, workload.namespace
        )),
        (true, false) => Verdict::Compliant,
    }
}
