//! Audit report tests.

use chrono::{DateTime, TimeZone, Utc};
use topoaudit::audit::{AuditReport, AuditStatus, Finding};
use topoaudit::types::{
    Classification, ClusterTopology, TopologyMode, Verdict, ViolationReason, WorkloadRef,
};

fn topology() -> ClusterTopology {
    ClusterTopology::new(TopologyMode::SingleReplica, TopologyMode::SingleReplica)
}

fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn finding(workload: WorkloadRef, verdict: Verdict) -> Finding {
    Finding {
        workload,
        classification: Classification::ControlPlane,
        subject_to_rule: true,
        allowed_to_fail: false,
        verdict,
    }
}

#[test]
fn wrong_count_message_names_workload() {
    let f = finding(
        WorkloadRef::deployment("openshift-apiserver", "apiserver", Some(3)),
        Verdict::Violation(ViolationReason::WrongReplicaCount {
            expected: 1,
            actual: 3,
        }),
    );
    let message = f.message().expect("violation has a message");
    assert!(message.contains("apiserver in openshift-apiserver namespace"));
    assert!(message.contains("wrong number of replicas"));
    assert!(message.contains("found 3"));
}

#[test]
fn missing_count_message_is_distinct() {
    let f = finding(
        WorkloadRef::stateful_set("openshift-logging", "elasticsearch", None),
        Verdict::Violation(ViolationReason::MissingReplicaCount),
    );
    let message = f.message().expect("violation has a message");
    assert!(message.contains("does not declare a replica count"));
}

#[test]
fn violation_message_ends_with_reason_text() {
    for reason in [
        ViolationReason::WrongReplicaCount {
            expected: 1,
            actual: 2,
        },
        ViolationReason::MissingReplicaCount,
    ] {
        let f = finding(
            WorkloadRef::deployment("openshift-dns", "dns-operator", Some(2)),
            Verdict::Violation(reason.clone()),
        );
        let message = f.message().expect("violation has a message");
        assert!(message.starts_with("Deployment dns-operator in openshift-dns namespace "));
        assert!(message.ends_with(&reason.to_string()));
    }
}

#[test]
fn compliant_has_no_message() {
    let f = finding(
        WorkloadRef::deployment("openshift-etcd", "etcd-operator", Some(1)),
        Verdict::Compliant,
    );
    assert!(f.message().is_none());
}

#[test]
fn warnings_alone_pass() {
    let report = AuditReport::from_findings(
        topology(),
        vec![finding(
            WorkloadRef::deployment("openshift-console", "console", Some(1)),
            Verdict::CompliantWithWarning("console can leave the allow-list".to_owned()),
        )],
        started(),
    );
    assert_eq!(report.status, AuditStatus::Passed);
    assert_eq!(report.warnings().count(), 1);
    assert!(report.into_result().is_ok());
}

#[test]
fn failure_lists_every_violation() {
    let report = AuditReport::from_findings(
        topology(),
        vec![
            finding(
                WorkloadRef::deployment("openshift-b", "two", Some(2)),
                Verdict::Violation(ViolationReason::WrongReplicaCount {
                    expected: 1,
                    actual: 2,
                }),
            ),
            finding(
                WorkloadRef::deployment("openshift-a", "none", None),
                Verdict::Violation(ViolationReason::MissingReplicaCount),
            ),
        ],
        started(),
    );
    assert_eq!(report.status, AuditStatus::Failed);

    let failure = report.into_result().expect_err("should fail");
    assert_eq!(failure.violations.len(), 2);
    // Sorted by namespace.
    assert!(failure.violations[0].contains("openshift-a"));
    let text = failure.to_string();
    assert!(text.starts_with("2 workload(s) violate"));
    assert!(text.contains("openshift-b"));
}

#[test]
fn report_serializes_status_and_verdicts() {
    let report = AuditReport::from_findings(
        topology(),
        vec![finding(
            WorkloadRef::deployment("openshift-b", "two", Some(2)),
            Verdict::Violation(ViolationReason::WrongReplicaCount {
                expected: 1,
                actual: 2,
            }),
        )],
        started(),
    );
    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["topology"]["control_plane"], "SingleReplica");
    assert_eq!(json["findings"][0]["verdict"]["verdict"], "violation");
    assert_eq!(
        json["findings"][0]["verdict"]["reason"]["type"],
        "wrong_replica_count"
    );
}

#[test]
fn report_keeps_given_start_time() {
    let report = AuditReport::from_findings(topology(), Vec::new(), started());
    assert_eq!(report.started_at, started());
    let skipped = AuditReport::skipped(topology(), started());
    assert_eq!(skipped.started_at, started());
}
