//! Downward-API environment for the APM agent
//!
//! Every container gets these variables, read from the pod's own metadata
//! or the node it runs on rather than from literal values.

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector};

/// `(variable, fieldPath)` pairs injected into every container
pub const OBSERVABILITY_ENV: [(&str, &str); 4] = [
    ("DD_AGENT_HOST", "status.hostIP"),
    ("DD_ENV", "metadata.labels['example.com/env']"),
    ("DD_REQUESTS_SERVICE", "metadata.labels['example.com/service']"),
    ("DD_SERVICE", "metadata.labels['example.com/service']"),
];

/// Build an env var whose value comes from a pod field
pub fn field_ref(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Translate [`OBSERVABILITY_ENV`] into container env entries
pub fn observability_env() -> Vec<EnvVar> {
    OBSERVABILITY_ENV
        .iter()
        .map(|(name, field_path)| field_ref(name, field_path))
        .collect()
}
