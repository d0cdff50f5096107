//! Rollchart Core - typed resource graph for blue/green web services
//!
//! This crate provides:
//! - `ChartConfig`: The declarative input record
//! - `Scope`: A tree of resource nodes with depth-first discovery
//! - `ResourceNode`: One typed Kubernetes object (ConfigMap, Service, ...)
//! - `Chart`: The blue/green chart builder
//! - `LabelPropagation`: Post-build label injection by resource kind
//! - `App`: Chart ownership and in-memory YAML synthesis

pub mod app;
pub mod chart;
pub mod config;
pub mod env;
pub mod error;
pub mod labels;
pub mod resource;
pub mod rollout;
pub mod scope;

pub use app::{App, SynthesizedChart};
pub use chart::{Chart, ChartResources, build};
pub use config::{ChartConfig, Environment, ServiceInfo};
pub use env::{OBSERVABILITY_ENV, observability_env};
pub use error::{ChartError, Result};
pub use labels::{LabelPropagation, LabelSet};
pub use resource::{Resource, ResourceKind, ResourceNode, ResourceRef};
pub use rollout::{BlueGreenStrategy, Rollout, RolloutSpec, RolloutStrategy};
pub use scope::{Node, Scope};
