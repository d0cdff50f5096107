//! Label sets and the post-build propagation pass
//!
//! Propagation runs after the chart is fully built. It only knows a target
//! kind and a label set, so it reaches resources regardless of which part of
//! the tree created them.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::resource::ResourceKind;
use crate::scope::Scope;

/// Owning service
pub const SERVICE_LABEL: &str = "example.com/service";
/// Owning department
pub const DEPARTMENT_LABEL: &str = "example.com/department";
/// Channel to page for the service
pub const SLACK_CHANNEL_LABEL: &str = "example.com/slack-channel";

/// String-to-string labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ownership labels derived from the config
    pub fn common(config: &ChartConfig) -> Self {
        let mut labels = Self::new();
        labels.insert(SERVICE_LABEL, &config.name);
        labels.insert(DEPARTMENT_LABEL, &config.service_info.department);
        labels.insert(SLACK_CHANNEL_LABEL, &config.service_info.slack_channel);
        labels
    }

    /// Build from a JSON object, rejecting anything but string values
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| ChartError::InvalidLabel {
            key: String::new(),
            message: format!("expected an object of labels, got {value}"),
        })?;

        let mut labels = Self::new();
        for (key, value) in object {
            if key.is_empty() {
                return Err(ChartError::InvalidLabel {
                    key: key.clone(),
                    message: "key must not be empty".to_string(),
                });
            }
            let value = value.as_str().ok_or_else(|| ChartError::InvalidLabel {
                key: key.clone(),
                message: format!("value must be a string, got {value}"),
            })?;
            labels.insert(key, value);
        }
        Ok(labels)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every label in `self` is present with the same value in `labels`
    pub fn is_subset_of(&self, labels: &BTreeMap<String, String>) -> bool {
        self.iter()
            .all(|(key, value)| labels.get(key).map(String::as_str) == Some(value))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl From<BTreeMap<String, String>> for LabelSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Upsert a label set into every resource of one kind
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    kind: ResourceKind,
    labels: LabelSet,
}

impl LabelPropagation {
    pub fn new(kind: ResourceKind, labels: LabelSet) -> Self {
        Self { kind, labels }
    }

    /// Apply to the whole subtree and return how many resources matched
    ///
    /// Matching nothing is not an error. Applying twice is the same as
    /// applying once.
    pub fn apply(&self, scope: &mut Scope) -> usize {
        let mut touched = 0;
        for node in scope.resources_mut().filter(|node| node.kind() == self.kind) {
            for (key, value) in self.labels.iter() {
                node.add_label(key, value);
            }
            debug!(resource = %node.to_ref(), labels = self.labels.len(), "propagated labels");
            touched += 1;
        }
        touched
    }
}
