//! Quorum-safe planning of replica group changes.

use k8s_openapi::api::apps::v1::StatefulSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::group::ReplicaGroup;
use super::guard::{copy_immutable_fields, ImmutableFields};
use super::mapping::{ClusterMapping, QuorumPolicy};
use crate::diff::compare;

/// PlannerConfig holds the policy the planner applies on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub quorum: QuorumPolicy,
    pub immutable_fields: ImmutableFields,
}

/// QuorumConflict explains why this pass may not update or remove groups.
///
/// It is part of the plan, not a failure: the caller reports it as a
/// degraded condition and the next pass re-evaluates from fresh state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error(
    "refusing to go from {existing_size} ready to {expected_size} desired replicas: \
     at least {min_quorum} must remain and more than 1/{majority_denominator} of the ready replicas"
)]
pub struct QuorumConflict {
    pub existing_size: i64,
    pub expected_size: i64,
    pub min_quorum: i32,
    pub majority_denominator: i32,
}

/// StatefulSetPlan is the outcome of one reconciliation pass.
///
/// A group never appears in more than one list. Whenever `conflict` is set,
/// `update` and `delete` are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetPlan {
    pub create: Vec<StatefulSet>,
    pub update: Vec<StatefulSet>,
    pub delete: Vec<StatefulSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<QuorumConflict>,
    /// At least one replica is ready.
    pub existing_cluster: bool,
    /// Exactly one replica is ready, so updates restart it in place.
    pub bounce_nodes: bool,
}

/// A single step of a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanAction<'a> {
    Create(&'a StatefulSet),
    Update(&'a StatefulSet),
    Delete(&'a StatefulSet),
}

impl<'a> PlanAction<'a> {
    pub fn group(&self) -> &'a StatefulSet {
        match *self {
            PlanAction::Create(g) | PlanAction::Update(g) | PlanAction::Delete(g) => g,
        }
    }
}

impl StatefulSetPlan {
    /// Returns true if the pass has nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Steps in execution order: capacity is added before anything is
    /// changed, and removals come last.
    pub fn actions(&self) -> impl Iterator<Item = PlanAction<'_>> {
        self.create
            .iter()
            .map(PlanAction::Create)
            .chain(self.update.iter().map(PlanAction::Update))
            .chain(self.delete.iter().map(PlanAction::Delete))
    }
}

/// Plans which replica groups to create, update and delete this pass.
///
/// Groups only in `expected` are created. Groups in both are updated when the
/// filtered diff is non-empty or the replica count changed, but only while
/// scale-down is allowed or no cluster exists yet. Groups only in `existing`
/// are deleted while scale-down is allowed. Anything refused is retried on a
/// later pass. Each name is planned once, from its first entry.
pub fn plan_statefulsets(
    existing: &[StatefulSet],
    expected: &[StatefulSet],
    config: &PlannerConfig,
) -> StatefulSetPlan {
    let mapping = ClusterMapping::new(existing, expected);
    let scale_down_allowed = mapping.is_scale_down_allowed(&config.quorum);
    let existing_cluster = mapping.has_existing_cluster();

    let mut plan = StatefulSetPlan {
        existing_cluster,
        bounce_nodes: mapping.bounce_nodes(),
        ..Default::default()
    };

    for desired in mapping.expected_groups() {
        let name = desired.group_name();
        let Some(live) = mapping.existing(name) else {
            info!(group = name, replicas = desired.desired_replicas(), "creating replica group");
            plan.create.push(desired.clone());
            continue;
        };

        if !scale_down_allowed && existing_cluster {
            debug!(group = name, "holding update until scale-down is safe");
            continue;
        }

        let mut desired = desired.clone();
        copy_immutable_fields(&mut desired, live, &config.immutable_fields);

        let diff = compare(live, &desired);
        let resized = live.desired_replicas() != desired.desired_replicas();
        if diff.is_empty() && !resized {
            debug!(group = name, "replica group unchanged");
            continue;
        }

        info!(
            group = name,
            from = live.desired_replicas(),
            to = desired.desired_replicas(),
            diff = %diff,
            "updating replica group"
        );
        plan.update.push(desired);
    }

    for live in mapping.existing_groups() {
        let name = live.group_name();
        if mapping.expected(name).is_some() {
            continue;
        }
        if scale_down_allowed {
            info!(group = name, "deleting replica group");
            plan.delete.push(live.clone());
        } else {
            debug!(group = name, "holding deletion until scale-down is safe");
        }
    }

    if existing_cluster && !scale_down_allowed {
        let conflict = QuorumConflict {
            existing_size: mapping.existing_size(),
            expected_size: mapping.expected_size(),
            min_quorum: config.quorum.min_quorum,
            majority_denominator: config.quorum.majority_denominator,
        };
        warn!(%conflict, "replica group changes blocked by quorum policy");
        plan.conflict = Some(conflict);
    }

    plan
}
