//! Topology-aware replica compliance engine.
//!
//! Per workload, the pipeline is: [`classifier::Classifier::classify`] →
//! [`expectation::is_subject_to_single_replica_rule`] → allow-list lookup →
//! [`validator::validate`]. [`driver::AuditEngine`] runs it over an
//! inventory and folds the verdicts into an [`report::AuditReport`].
//!
//! Every step is a pure function of its inputs. Workloads are evaluated
//! independently and the report is sorted, so inventory order never affects
//! the result.

pub mod classifier;
pub mod driver;
pub mod expectation;
pub mod report;
pub mod validator;

pub use classifier::Classifier;
pub use driver::AuditEngine;
pub use report::{AuditFailure, AuditReport, AuditStatus, Finding};
