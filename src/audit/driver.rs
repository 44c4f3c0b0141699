//! Runs the audit over a full inventory.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::classifier::Classifier;
use super::expectation::is_subject_to_single_replica_rule;
use super::report::{AuditReport, AuditStatus, Finding};
use super::validator::validate;
use crate::types::{ClusterTopology, WorkloadRef};

/// The audit engine: a classifier plus the evaluation pipeline.
///
/// Cheap to clone; the policy tables are shared behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct AuditEngine {
    classifier: Arc<Classifier>,
}

impl AuditEngine {
    /// Build an engine around a classifier.
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Evaluate a single workload.
    pub fn evaluate(&self, workload: &WorkloadRef, topology: &ClusterTopology) -> Finding {
        let classification = self.classifier.classify(workload);
        let subject_to_rule = is_subject_to_single_replica_rule(classification, topology);
        let allowed_to_fail = self.classifier.is_allowed_to_fail(workload);
        let verdict = validate(workload, subject_to_rule, allowed_to_fail);

        debug!(
            workload = %workload,
            classification = ?classification,
            subject_to_rule,
            allowed_to_fail,
            verdict = ?verdict,
            "workload evaluated"
        );

        Finding {
            workload: workload.clone(),
            classification,
            subject_to_rule,
            allowed_to_fail,
            verdict,
        }
    }

    /// Audit the inventory sequentially.
    pub fn run(&self, inventory: &[WorkloadRef], topology: ClusterTopology) -> AuditReport {
        let started_at = Utc::now();
        if !topology.any_single_replica() {
            return skipped(topology, inventory.len(), started_at);
        }

        info!(
            workloads = inventory.len(),
            control_plane = %topology.control_plane,
            infrastructure = %topology.infrastructure,
            "audit started"
        );

        let findings = inventory
            .iter()
            .map(|w| self.evaluate(w, &topology))
            .collect();
        finish(AuditReport::from_findings(topology, findings, started_at))
    }

    /// Audit the inventory across up to `workers` tasks.
    ///
    /// Produces the same report as [`AuditEngine::run`] for the same input.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker task panics or is cancelled.
    pub async fn run_concurrent(
        &self,
        inventory: Vec<WorkloadRef>,
        topology: ClusterTopology,
        workers: usize,
    ) -> anyhow::Result<AuditReport> {
        let started_at = Utc::now();
        if !topology.any_single_replica() {
            return Ok(skipped(topology, inventory.len(), started_at));
        }

        let total = inventory.len();
        let workers = workers.clamp(1, total.max(1));
        let chunk_size = total.div_ceil(workers).max(1);

        info!(
            workloads = total,
            workers,
            control_plane = %topology.control_plane,
            infrastructure = %topology.infrastructure,
            "audit started"
        );

        let mut set = JoinSet::new();
        let mut remaining = inventory;
        while !remaining.is_empty() {
            let rest = remaining.split_off(chunk_size.min(remaining.len()));
            let chunk = std::mem::replace(&mut remaining, rest);
            let engine = self.clone();
            set.spawn(async move {
                chunk
                    .iter()
                    .map(|w| engine.evaluate(w, &topology))
                    .collect::<Vec<_>>()
            });
        }

        let mut findings = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            let chunk = joined.map_err(|e| anyhow::anyhow!("audit worker failed: {e}"))?;
            findings.extend(chunk);
        }

        Ok(finish(AuditReport::from_findings(topology, findings, started_at)))
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(Classifier::default())
    }
}

fn skipped(
    topology: ClusterTopology,
    workloads: usize,
    started_at: DateTime<Utc>,
) -> AuditReport {
    info!(
        workloads,
        control_plane = %topology.control_plane,
        infrastructure = %topology.infrastructure,
        "audit skipped: no single-replica topology"
    );
    AuditReport::skipped(topology, started_at)
}

fn finish(report: AuditReport) -> AuditReport {
    for finding in report.violations() {
        if let Some(message) = finding.message() {
            warn!(workload = %finding.workload, "{message}");
        }
    }

    let violations = report.violations().count();
    let warnings = report.warnings().count();
    match report.status {
        AuditStatus::Failed => warn!(
            run_id = %report.run_id,
            checked = report.checked_count(),
            violations,
            warnings,
            "audit failed"
        ),
        _ => info!(
            run_id = %report.run_id,
            checked = report.checked_count(),
            warnings,
            "audit passed"
        ),
    }
    report
}
