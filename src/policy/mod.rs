//! Static policy tables for the topology audit.
//!
//! Two tables drive the audit:
//! - [`ClassificationPolicy`]: which workloads are "infrastructure" rather
//!   than "control plane", partitioned by kind
//! - [`AllowListPolicy`]: which workloads may deviate from the expected
//!   replica count
//!
//! Both are plain data. They are loaded from a TOML [`PolicyDocument`] or
//! taken from [`PolicyDocument::builtin`], and handed to the engine at
//! construction time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::WorkloadKind;

/// Namespace to workload-name table.
pub type NamespaceTable = BTreeMap<String, BTreeSet<String>>;

/// Errors from loading or validating a policy document.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy at {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The policy file is not valid TOML for a policy document.
    #[error("failed to parse policy at {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A table contains an empty namespace or workload name.
    #[error("policy table {table} contains an empty {field}")]
    EmptyEntry {
        /// Table name (e.g. `allow_list`).
        table: &'static str,
        /// `namespace` or `name`.
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Workloads treated as infrastructure, per kind.
///
/// Anything not listed is control plane.
///
/// A table left out of a policy document keeps its built-in contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    /// Infrastructure Deployments by namespace.
    #[serde(default = "builtin_infra_deployments")]
    pub deployments: NamespaceTable,
    /// Infrastructure StatefulSets by namespace.
    #[serde(default = "builtin_infra_stateful_sets")]
    pub stateful_sets: NamespaceTable,
}

impl ClassificationPolicy {
    /// The table for one workload kind.
    pub fn table(&self, kind: WorkloadKind) -> &NamespaceTable {
        match kind {
            WorkloadKind::Deployment => &self.deployments,
            WorkloadKind::StatefulSet => &self.stateful_sets,
        }
    }

    /// Whether `namespace/name` of `kind` is listed as infrastructure.
    pub fn contains(&self, kind: WorkloadKind, namespace: &str, name: &str) -> bool {
        self.table(kind)
            .get(namespace)
            .is_some_and(|names| names.contains(name))
    }
}

// ---------------------------------------------------------------------------
// Allow-list
// ---------------------------------------------------------------------------

/// Workloads permitted to run more than one replica under single-replica
/// topology.
///
/// Keyed by namespace and name only; a Deployment and a StatefulSet sharing a
/// name in the same namespace share the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowListPolicy {
    entries: NamespaceTable,
}

impl AllowListPolicy {
    /// Wrap a namespace table.
    pub fn new(entries: NamespaceTable) -> Self {
        Self { entries }
    }

    /// Exact namespace + name match.
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.entries
            .get(namespace)
            .is_some_and(|names| names.contains(name))
    }

    /// Underlying table.
    pub fn entries(&self) -> &NamespaceTable {
        &self.entries
    }

    /// Total number of allow-listed workloads.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Whether no workload is allow-listed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Serializable policy: both tables together.
///
/// Sections missing from a TOML document keep their built-in values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Infrastructure classification table.
    #[serde(default = "builtin_infrastructure")]
    pub infrastructure: ClassificationPolicy,

    /// Replica-count exceptions.
    #[serde(default = "builtin_allow_list")]
    pub allow_list: AllowListPolicy,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PolicyDocument {
    /// The policy shipped with this build.
    pub fn builtin() -> Self {
        Self {
            infrastructure: builtin_infrastructure(),
            allow_list: builtin_allow_list(),
        }
    }

    /// Parse a policy document from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Parse`] on malformed TOML and
    /// [`PolicyError::EmptyEntry`] on blank keys or names.
    pub fn from_toml(contents: &str, origin: &str) -> Result<Self, PolicyError> {
        let doc: Self = toml::from_str(contents).map_err(|source| PolicyError::Parse {
            path: origin.to_owned(),
            source,
        })?;
        doc.validate()?;
        Ok(doc)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow::anyhow!("failed to render policy: {e}"))
    }

    /// Reject empty namespaces and names in every table.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyEntry`] naming the offending table.
    pub fn validate(&self) -> Result<(), PolicyError> {
        check_table("infrastructure.deployments", &self.infrastructure.deployments)?;
        check_table(
            "infrastructure.stateful_sets",
            &self.infrastructure.stateful_sets,
        )?;
        check_table("allow_list", self.allow_list.entries())?;
        Ok(())
    }
}

fn check_table(table: &'static str, entries: &NamespaceTable) -> Result<(), PolicyError> {
    for (namespace, names) in entries {
        if namespace.trim().is_empty() {
            return Err(PolicyError::EmptyEntry {
                table,
                field: "namespace",
            });
        }
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(PolicyError::EmptyEntry {
                table,
                field: "name",
            });
        }
    }
    Ok(())
}

/// Load and validate a policy document from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_policy(path: &Path) -> Result<PolicyDocument, PolicyError> {
    let contents = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.display().to_string(),
        source,
    })?;
    PolicyDocument::from_toml(&contents, &path.display().to_string())
}

// Built-in tables.

fn table(entries: &[(&str, &[&str])]) -> NamespaceTable {
    entries
        .iter()
        .map(|(ns, names)| {
            (
                (*ns).to_owned(),
                names.iter().map(|n| (*n).to_owned()).collect(),
            )
        })
        .collect()
}

fn builtin_infrastructure() -> ClassificationPolicy {
    ClassificationPolicy {
        deployments: builtin_infra_deployments(),
        stateful_sets: builtin_infra_stateful_sets(),
    }
}

fn builtin_infra_deployments() -> NamespaceTable {
    table(&[("openshift-ingress", &["router-default"])])
}

fn builtin_infra_stateful_sets() -> NamespaceTable {
    // No platform StatefulSet is infrastructure today.
    NamespaceTable::new()
}

fn builtin_allow_list() -> AllowListPolicy {
    // Operators that still run two replicas under single-replica topology.
    // Entries come off as each operator learns the topology API.
    AllowListPolicy::new(table(&[
        ("openshift-authentication", &["oauth-openshift"]),
        ("openshift-console", &["console", "downloads"]),
        ("openshift-image-registry", &["image-registry"]),
        (
            "openshift-monitoring",
            &[
                "prometheus-adapter",
                "thanos-querier",
                "alertmanager-main",
                "prometheus-k8s",
            ],
        ),
        ("openshift-operator-lifecycle-manager", &["packageserver"]),
    ]))
}
