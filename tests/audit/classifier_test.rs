//! Classifier tests.

use std::collections::{BTreeMap, BTreeSet};

use topoaudit::audit::Classifier;
use topoaudit::policy::{AllowListPolicy, ClassificationPolicy, NamespaceTable};
use topoaudit::types::{Classification, WorkloadRef};

fn table(ns: &str, names: &[&str]) -> NamespaceTable {
    let mut t = BTreeMap::new();
    t.insert(
        ns.to_owned(),
        names.iter().map(|n| (*n).to_owned()).collect::<BTreeSet<_>>(),
    );
    t
}

#[test]
fn namespace_without_entries_is_control_plane() {
    let classifier = Classifier::default();
    for w in [
        WorkloadRef::deployment("openshift-etcd", "etcd-operator", Some(1)),
        WorkloadRef::stateful_set("openshift-etcd", "etcd", Some(1)),
        WorkloadRef::deployment("openshift-console", "console", Some(2)),
    ] {
        assert_eq!(classifier.classify(&w), Classification::ControlPlane, "{w}");
    }
}

#[test]
fn router_default_is_infrastructure() {
    let classifier = Classifier::default();
    let router = WorkloadRef::deployment("openshift-ingress", "router-default", Some(1));
    assert_eq!(classifier.classify(&router), Classification::Infrastructure);
}

#[test]
fn unlisted_name_in_listed_namespace_is_control_plane() {
    let classifier = Classifier::default();
    let other = WorkloadRef::deployment("openshift-ingress", "router-internal", Some(1));
    assert_eq!(classifier.classify(&other), Classification::ControlPlane);
}

#[test]
fn classification_is_kind_aware() {
    let classifier = Classifier::default();
    let sts = WorkloadRef::stateful_set("openshift-ingress", "router-default", Some(1));
    assert_eq!(classifier.classify(&sts), Classification::ControlPlane);
}

#[test]
fn custom_stateful_set_table_is_honoured() {
    let classifier = Classifier::new(
        ClassificationPolicy {
            deployments: NamespaceTable::new(),
            stateful_sets: table("openshift-storage", &["noobaa-db"]),
        },
        AllowListPolicy::default(),
    );
    let sts = WorkloadRef::stateful_set("openshift-storage", "noobaa-db", Some(1));
    let deploy = WorkloadRef::deployment("openshift-storage", "noobaa-db", Some(1));
    assert_eq!(classifier.classify(&sts), Classification::Infrastructure);
    assert_eq!(classifier.classify(&deploy), Classification::ControlPlane);
}

#[test]
fn allow_list_requires_exact_namespace_and_name() {
    let classifier = Classifier::default();
    assert!(classifier.is_allowed_to_fail(&WorkloadRef::deployment(
        "openshift-monitoring",
        "thanos-querier",
        Some(2)
    )));
    assert!(!classifier.is_allowed_to_fail(&WorkloadRef::deployment(
        "openshift-console-operator",
        "console",
        Some(2)
    )));
    assert!(!classifier.is_allowed_to_fail(&WorkloadRef::deployment(
        "openshift-monitoring",
        "thanos-querier-v2",
        Some(2)
    )));
}

#[test]
fn allow_list_ignores_kind() {
    let classifier = Classifier::default();
    // Listed as a Deployment, but the key carries no kind.
    let sts = WorkloadRef::stateful_set("openshift-console", "console", Some(2));
    assert!(classifier.is_allowed_to_fail(&sts));
    // Listed as a StatefulSet.
    let deploy = WorkloadRef::deployment("openshift-monitoring", "prometheus-k8s", Some(2));
    assert!(classifier.is_allowed_to_fail(&deploy));
}

#[test]
fn empty_allow_list_allows_nothing() {
    let classifier = Classifier::new(ClassificationPolicy::default(), AllowListPolicy::default());
    let w = WorkloadRef::deployment("openshift-console", "console", Some(2));
    assert!(!classifier.is_allowed_to_fail(&w));
    assert_eq!(classifier.classify(&w), Classification::ControlPlane);
}
