//! Workload classification against the static policy tables.

use crate::policy::{AllowListPolicy, ClassificationPolicy, PolicyDocument};
use crate::types::{Classification, WorkloadRef};

/// Classifies workloads and answers allow-list lookups.
///
/// Owns its tables; built once per run and never mutated.
#[derive(Debug, Clone)]
pub struct Classifier {
    infrastructure: ClassificationPolicy,
    allow_list: AllowListPolicy,
}

impl Classifier {
    /// Build a classifier from the two policy tables.
    pub fn new(infrastructure: ClassificationPolicy, allow_list: AllowListPolicy) -> Self {
        Self {
            infrastructure,
            allow_list,
        }
    }

    /// Build a classifier from a policy document.
    pub fn from_policy(policy: PolicyDocument) -> Self {
        Self::new(policy.infrastructure, policy.allow_list)
    }

    /// Infrastructure if listed for the workload's namespace and kind,
    /// control plane otherwise.
    pub fn classify(&self, workload: &WorkloadRef) -> Classification {
        if self
            .infrastructure
            .contains(workload.kind, &workload.namespace, &workload.name)
        {
            Classification::Infrastructure
        } else {
            Classification::ControlPlane
        }
    }

    /// Whether the workload may deviate from the expected replica count.
    ///
    /// Matches on namespace and name; the kind is ignored.
    pub fn is_allowed_to_fail(&self, workload: &WorkloadRef) -> bool {
        self.allow_list.contains(&workload.namespace, &workload.name)
    }

    /// The infrastructure table in use.
    pub fn infrastructure(&self) -> &ClassificationPolicy {
        &self.infrastructure
    }

    /// The allow-list in use.
    pub fn allow_list(&self) -> &AllowListPolicy {
        &self.allow_list
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_policy(PolicyDocument::builtin())
    }
}
