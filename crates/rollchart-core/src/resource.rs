//! Typed resource nodes
//!
//! A [`ResourceNode`] is one Kubernetes object registered in a scope. Its
//! payload is a [`Resource`], a tagged union over the kinds the chart builder
//! emits, so callers can filter by [`ResourceKind`] without downcasting.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{Metadata, Resource as _};
use serde::Serialize;

use crate::rollout::Rollout;

/// Discriminator for [`Resource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    ConfigMap,
    Service,
    ServiceAccount,
    Ingress,
    Rollout,
}

impl ResourceKind {
    /// Kubernetes `kind` string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMap => ConfigMap::KIND,
            Self::Service => Service::KIND,
            Self::ServiceAccount => ServiceAccount::KIND,
            Self::Ingress => Ingress::KIND,
            Self::Rollout => Rollout::KIND,
        }
    }

    /// Kubernetes `apiVersion` string
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::ConfigMap => ConfigMap::API_VERSION,
            Self::Service => Service::API_VERSION,
            Self::ServiceAccount => ServiceAccount::API_VERSION,
            Self::Ingress => Ingress::API_VERSION,
            Self::Rollout => Rollout::API_VERSION,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Kubernetes object payload
///
/// Serializes as the bare manifest (`apiVersion`, `kind`, `metadata`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    ConfigMap(ConfigMap),
    Service(Service),
    ServiceAccount(ServiceAccount),
    Ingress(Ingress),
    Rollout(Rollout),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
            Self::Service(_) => ResourceKind::Service,
            Self::ServiceAccount(_) => ResourceKind::ServiceAccount,
            Self::Ingress(_) => ResourceKind::Ingress,
            Self::Rollout(_) => ResourceKind::Rollout,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::ConfigMap(r) => r.metadata(),
            Self::Service(r) => r.metadata(),
            Self::ServiceAccount(r) => r.metadata(),
            Self::Ingress(r) => r.metadata(),
            Self::Rollout(r) => r.metadata(),
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::ConfigMap(r) => r.metadata_mut(),
            Self::Service(r) => r.metadata_mut(),
            Self::ServiceAccount(r) => r.metadata_mut(),
            Self::Ingress(r) => r.metadata_mut(),
            Self::Rollout(r) => r.metadata_mut(),
        }
    }
}

impl From<ConfigMap> for Resource {
    fn from(r: ConfigMap) -> Self {
        Self::ConfigMap(r)
    }
}

impl From<Service> for Resource {
    fn from(r: Service) -> Self {
        Self::Service(r)
    }
}

impl From<ServiceAccount> for Resource {
    fn from(r: ServiceAccount) -> Self {
        Self::ServiceAccount(r)
    }
}

impl From<Ingress> for Resource {
    fn from(r: Ingress) -> Self {
        Self::Ingress(r)
    }
}

impl From<Rollout> for Resource {
    fn from(r: Rollout) -> Self {
        Self::Rollout(r)
    }
}

/// Handle to a registered resource, used for cross-references by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A resource owned by a scope
///
/// The name is resolved when the node is registered and cannot be changed
/// afterwards. Labels and annotations stay mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    id: String,
    path: String,
    resource: Resource,
}

impl ResourceNode {
    /// Only scopes construct nodes; the name must already be resolved
    pub(crate) fn new(id: String, path: String, resource: Resource) -> Self {
        debug_assert!(resource.metadata().name.is_some());
        Self { id, path, resource }
    }

    /// Construct id, unique among its siblings
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `/`-joined construct path from the chart root
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    pub fn name(&self) -> &str {
        self.resource.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind(),
            name: self.name().to_string(),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.resource.metadata().labels.as_ref()
    }

    pub fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.resource.metadata().annotations.as_ref()
    }

    /// Insert or overwrite a label
    pub fn add_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.resource
            .metadata_mut()
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    /// Insert or overwrite an annotation
    pub fn add_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.resource
            .metadata_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }
}
