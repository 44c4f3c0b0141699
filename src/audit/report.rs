//! Structured results of an audit run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Classification, ClusterTopology, Verdict, WorkloadRef};

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// Neither topology is single-replica; nothing was checked.
    Skipped,
    /// Every workload is compliant.
    Passed,
    /// At least one workload violates the rule.
    Failed,
}

impl AuditStatus {
    /// Upper-case label used in human-readable output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Skipped => "SKIPPED",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }
}

/// Everything the engine decided about one workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The workload evaluated.
    pub workload: WorkloadRef,
    /// Infrastructure or control plane.
    pub classification: Classification,
    /// Whether the single-replica rule applied.
    pub subject_to_rule: bool,
    /// Whether the workload is on the allow-list.
    pub allowed_to_fail: bool,
    /// The verdict.
    pub verdict: Verdict,
}

impl Finding {
    /// Human-readable message for violations and warnings, `None` otherwise.
    pub fn message(&self) -> Option<String> {
        let w = &self.workload;
        match &self.verdict {
            Verdict::Compliant => None,
            Verdict::Violation(reason) => Some(format!(
                "{} {} in {} namespace {reason}",
                w.kind, w.name, w.namespace
            )),
            Verdict::CompliantWithWarning(reason) => Some(reason.clone()),
        }
    }
}

/// Result of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Topology the run evaluated against.
    pub topology: ClusterTopology,
    /// Overall status.
    pub status: AuditStatus,
    /// Per-workload findings, sorted by namespace, kind and name.
    /// Empty when the run was skipped.
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// Report for a run that had nothing to check.
    pub fn skipped(topology: ClusterTopology, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            topology,
            status: AuditStatus::Skipped,
            findings: Vec::new(),
        }
    }

    /// Report from evaluated findings, in any order.
    ///
    /// `started_at` is the time the run began, before any evaluation.
    pub fn from_findings(
        topology: ClusterTopology,
        mut findings: Vec<Finding>,
        started_at: DateTime<Utc>,
    ) -> Self {
        findings.sort_by(|a, b| {
            a.workload
                .sort_key()
                .cmp(&b.workload.sort_key())
                .then_with(|| a.workload.declared_replicas.cmp(&b.workload.declared_replicas))
        });
        let status = if findings.iter().any(|f| f.verdict.is_violation()) {
            AuditStatus::Failed
        } else {
            AuditStatus::Passed
        };
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            topology,
            status,
            findings,
        }
    }

    /// Findings that fail the run.
    pub fn violations(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.verdict.is_violation())
    }

    /// Findings carrying an allow-list advisory.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.verdict.is_warning())
    }

    /// Number of workloads the rule applied to.
    pub fn checked_count(&self) -> usize {
        self.findings.iter().filter(|f| f.subject_to_rule).count()
    }

    /// `Ok` unless the run failed; the error lists every violation.
    ///
    /// # Errors
    ///
    /// Returns [`AuditFailure`] when the status is [`AuditStatus::Failed`].
    pub fn into_result(self) -> Result<Self, AuditFailure> {
        if self.status != AuditStatus::Failed {
            return Ok(self);
        }
        let violations = self.violations().filter_map(Finding::message).collect();
        Err(AuditFailure { violations })
    }
}

/// Aggregate failure carrying every violation of a run.
#[derive(Debug, thiserror::Error)]
#[error("{} workload(s) violate the single-replica topology:\n{}", .violations.len(), .violations.join("\n"))]
pub struct AuditFailure {
    /// One message per violating workload.
    pub violations: Vec<String>,
}
