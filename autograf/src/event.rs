//! Inbound Kubernetes namespace event decoding.
//!
//! The upstream watcher appends entries to the inbound stream with a
//! `whatHappened` description and a JSON-encoded `k8sObject` payload. Only
//! namespace additions are of interest here; everything else is skipped by
//! the orchestrator.

use k8s_openapi::api::core::v1::Namespace;

use crate::error::AutografResult;

/// Stream entry field carrying the event description.
pub const WHAT_HAPPENED_FIELD: &str = "whatHappened";

/// Stream entry field carrying the JSON-encoded Kubernetes object.
pub const K8S_OBJECT_FIELD: &str = "k8sObject";

/// Event description emitted by the upstream watcher when a namespace is
/// created.
pub const NAMESPACE_ADDED_EVENT: &str = "namespace added";

/// Label selecting the dashboard template to provision for a namespace.
///
/// A namespace without this label does not want a dashboard; that is not an
/// error.
pub const TEMPLATE_LABEL: &str = "grafana-template";

/// Label carrying the human-readable title of the provisioned dashboard.
pub const DASHBOARD_NAME_LABEL: &str = "grafana-dashboard-name";

/// Decodes the JSON-encoded namespace payload of an inbound event.
pub fn decode_namespace(payload: &str) -> AutografResult<Namespace> {
    let namespace = serde_json::from_str::<Namespace>(payload)?;

    Ok(namespace)
}

/// Returns the value of `label` on the namespace if present and non-empty.
pub fn non_empty_label<'a>(namespace: &'a Namespace, label: &str) -> Option<&'a str> {
    namespace
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(label))
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Returns the namespace's name, or an empty string when unset.
pub fn namespace_name(namespace: &Namespace) -> &str {
    namespace.metadata.name.as_deref().unwrap_or_default()
}
