//! Live-versus-desired comparison entry points.

use serde::Serialize;
use tracing::{debug, warn};

use super::differ::diff_values;
use super::filter::filter_diff;
use crate::value::Value;

/// Compares a live object with a freshly built desired object.
///
/// Returns the filtered diff; an empty string means no action is needed.
/// An object that cannot be lowered to a value tree compares as unchanged,
/// since a missed update is picked up on the next pass.
pub fn compare<T: Serialize + ?Sized>(live: &T, desired: &T) -> String {
    let lowered = Value::from_serialize(live).and_then(|l| Ok((l, Value::from_serialize(desired)?)));
    match lowered {
        Ok((live, desired)) => compare_values(&live, &desired),
        Err(e) => {
            warn!(error = %e, "unable to lower object for comparison, treating as unchanged");
            String::new()
        }
    }
}

/// Compares two value trees.
pub fn compare_values(live: &Value, desired: &Value) -> String {
    filter_diff(&diff_values(live, desired))
}

/// What the reconcile loop should do with a single, non-grouped resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAction {
    /// Nothing is live yet.
    Create,
    /// The live object differs in a way that matters.
    Update { diff: String },
    Unchanged,
}

/// Decides the action for a config map, secret, deployment, service,
/// ingress or volume claim. No quorum planning applies to these.
pub fn plan_resource<T: Serialize>(live: Option<&T>, desired: &T) -> ResourceAction {
    let Some(live) = live else {
        return ResourceAction::Create;
    };
    let diff = compare(live, desired);
    if diff.is_empty() {
        debug!("resource unchanged");
        ResourceAction::Unchanged
    } else {
        ResourceAction::Update { diff }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn config_map(data: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("grafana-datasources".to_string()),
                ..Default::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_resource_is_created() {
        let desired = config_map(&[("datasource.yaml", "url: http://prometheus:9090")]);
        assert_eq!(plan_resource(None, &desired), ResourceAction::Create);
    }

    #[test]
    fn test_platform_metadata_is_not_an_update() {
        let desired = config_map(&[("datasource.yaml", "url: http://prometheus:9090")]);
        let mut live = desired.clone();
        live.metadata.uid = Some("6f1c0a7e".to_string());
        live.metadata.resource_version = Some("4711".to_string());
        live.metadata.namespace = Some("monitoring".to_string());

        assert_eq!(plan_resource(Some(&live), &desired), ResourceAction::Unchanged);
    }

    #[test]
    fn test_changed_data_is_an_update() {
        let live = config_map(&[("datasource.yaml", "url: http://prometheus:9090")]);
        let desired = config_map(&[("datasource.yaml", "url: http://prometheus:9091")]);

        match plan_resource(Some(&live), &desired) {
            ResourceAction::Update { diff } => {
                assert!(diff.contains("+    datasource.yaml: \"url: http://prometheus:9091\""), "{diff}");
                assert!(diff.contains("-    datasource.yaml: \"url: http://prometheus:9090\""), "{diff}");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }
}
