//! # Stack Reconcile
//!
//! The decision engine of a monitoring stack operator.
//!
//! Each reconciliation pass compares the live objects of a monitoring
//! instance (metrics collector, dashboards, alerting, log search and its UI)
//! with freshly built desired objects and decides what is safe to change.
//! This crate answers two questions for that loop:
//!
//! - does a live object *really* differ from its desired counterpart, once
//!   platform-filled defaults and intentionally unset fields are discounted;
//! - which replica groups of the quorum-based search cluster may be created,
//!   updated or deleted this pass without stranding it below quorum.
//!
//! Both are pure computations over the snapshots they are handed.
//!
//! ## Modules
//!
//! - [`value`] - In-memory object trees and logical emptiness
//! - [`diff`] - Structural diff and noise filtering
//! - [`cluster`] - Replica group safety rules and planning
//! - [`config`] - Reconciler configuration
//! - [`logging`] - Log subscriber setup
//! - [`error`] - Errors at the fallible edges

pub mod cluster;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod value;

pub use cluster::{
    copy_immutable_fields, plan_statefulsets, ClusterMapping, PlanAction, PlannerConfig,
    QuorumConflict, QuorumPolicy, ReplicaGroup, StatefulSetPlan,
};
pub use config::ReconcileConfig;
pub use diff::{compare, compare_values, filter_diff, plan_resource, ResourceAction, StructuralLine};
pub use error::{Error, Result};
pub use value::Value;
