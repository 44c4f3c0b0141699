//! topoaudit: single-replica topology compliance audit.
//!
//! Given a snapshot of a cluster's platform workloads and its topology
//! facts, checks that every platform Deployment and StatefulSet runs exactly
//! one replica wherever its governing topology is `SingleReplica`, except
//! for allow-listed workloads.
//!
//! See `DESIGN.md` for the architecture.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod policy;
pub mod types;

pub mod audit;
pub mod inventory;
pub mod sink;
