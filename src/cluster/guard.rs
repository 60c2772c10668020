//! Copy-forward of fields that cannot change after a replica group exists.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Container;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Env var holding the voter list the quorum component bootstrapped with.
pub const INITIAL_VOTERS_ENV: &str = "cluster.initial_master_nodes";

/// Env var holding the role set a node was bootstrapped with.
pub const ACTIVE_ROLES_ENV: &str = "node.roles";

/// ImmutableFields names the bootstrap env vars that are carried forward
/// from the live group on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImmutableFields {
    pub bootstrap_env: Vec<String>,
}

impl Default for ImmutableFields {
    fn default() -> Self {
        ImmutableFields {
            bootstrap_env: vec![INITIAL_VOTERS_ENV.to_string(), ACTIVE_ROLES_ENV.to_string()],
        }
    }
}

/// Copies the fields of `existing` that may never change onto `desired`.
///
/// Volume claim templates and the label selector are fixed at creation. The
/// bootstrap env vars record the cluster's first formation and must not be
/// rewritten by a later desired-state computation: for every container
/// present in both pod templates, a var set on the live container is copied
/// over, and a var absent from the live container is dropped from the
/// desired one.
///
/// The drop means a bootstrap var can never be added to a group that already
/// exists. A group created without `node.roles` keeps running without it;
/// introducing it requires recreating the group under a new name.
///
/// Must run before comparing the pair and before applying an update.
pub fn copy_immutable_fields(desired: &mut StatefulSet, existing: &StatefulSet, fields: &ImmutableFields) {
    let (Some(spec), Some(live_spec)) = (desired.spec.as_mut(), existing.spec.as_ref()) else {
        return;
    };

    spec.volume_claim_templates = live_spec.volume_claim_templates.clone();
    spec.selector = live_spec.selector.clone();

    let live_containers = live_spec
        .template
        .spec
        .as_ref()
        .map(|pod| pod.containers.as_slice())
        .unwrap_or_default();
    let Some(pod) = spec.template.spec.as_mut() else {
        return;
    };

    for container in pod.containers.iter_mut() {
        let Some(live) = live_containers.iter().find(|c| c.name == container.name) else {
            continue;
        };
        for name in &fields.bootstrap_env {
            copy_env(container, live, name);
        }
    }
}

fn copy_env(container: &mut Container, live: &Container, name: &str) {
    let live_var = live
        .env
        .as_ref()
        .and_then(|env| env.iter().find(|var| var.name == name));

    match live_var {
        Some(var) => {
            trace!(container = %container.name, env = name, "carrying bootstrap env forward");
            let env = container.env.get_or_insert_with(Vec::new);
            match env.iter_mut().find(|v| v.name == name) {
                Some(slot) => *slot = var.clone(),
                None => env.push(var.clone()),
            }
        }
        None => {
            if let Some(env) = container.env.as_mut() {
                env.retain(|v| v.name != name);
            }
        }
    }
}
