//! Replica group accessors.

use k8s_openapi::api::apps::v1::StatefulSet;

/// Replica count the platform assumes when a group leaves it unset.
pub const DEFAULT_REPLICAS: i32 = 1;

/// ReplicaGroup is one independently named, independently replicated pool of
/// stateful workers, such as one tier of search-cluster master nodes.
pub trait ReplicaGroup {
    /// Returns the group name; groups are matched across passes by name.
    fn group_name(&self) -> &str;

    /// Returns the replica count the group is asked to run.
    fn desired_replicas(&self) -> i32;

    /// Returns the replica count observed ready.
    fn ready_replicas(&self) -> i32;
}

impl ReplicaGroup for StatefulSet {
    fn group_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn desired_replicas(&self) -> i32 {
        match &self.spec {
            Some(spec) => spec.replicas.unwrap_or(DEFAULT_REPLICAS),
            None => 0,
        }
    }

    fn ready_replicas(&self) -> i32 {
        self.status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{StatefulSetSpec, StatefulSetStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_unset_fields() {
        let empty = StatefulSet::default();
        assert_eq!(empty.group_name(), "");
        assert_eq!(empty.desired_replicas(), 0);
        assert_eq!(empty.ready_replicas(), 0);

        let defaulted = StatefulSet {
            spec: Some(StatefulSetSpec::default()),
            ..Default::default()
        };
        assert_eq!(defaulted.desired_replicas(), DEFAULT_REPLICAS);
    }

    #[test]
    fn test_populated_group() {
        let sts = StatefulSet {
            metadata: ObjectMeta {
                name: Some("es-master".to_string()),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            status: Some(StatefulSetStatus {
                replicas: 3,
                ready_replicas: Some(2),
                ..Default::default()
            }),
        };
        assert_eq!(sts.group_name(), "es-master");
        assert_eq!(sts.desired_replicas(), 3);
        assert_eq!(sts.ready_replicas(), 2);
    }
}
