//! Blue/green web service chart
//!
//! Builds the resource graph for one service from a [`ChartConfig`]:
//!
//! 1. ConfigMap `vars`, loaded into the container with `envFrom`
//! 2. Service `service`, the active traffic target
//! 3. Service `service-preview`, the preview traffic target
//! 4. ServiceAccount bound to an IAM role
//! 5. Ingress `ingress` routing to the active service
//! 6. Ingress `ingress-preview` routing to the preview service
//! 7. Rollout `web` switching between the two services
//!
//! Later resources reference earlier ones through the [`ResourceRef`] returned
//! at registration, never through a recomputed name.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapEnvSource, Container, ContainerPort, EnvFromSource, PodSpec,
    PodTemplateSpec, Service, ServiceAccount, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::info;

use crate::config::ChartConfig;
use crate::env::observability_env;
use crate::error::Result;
use crate::labels::{LabelPropagation, LabelSet};
use crate::resource::{ResourceKind, ResourceRef};
use crate::rollout::{BlueGreenStrategy, Rollout, RolloutSpec, RolloutStrategy};
use crate::scope::Scope;

/// Annotation binding a service account to an IAM role (IRSA)
pub const ROLE_ARN_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

pub const HEALTH_CHECK_PATH: &str = "/api/v1/health";

/// Seconds the old ReplicaSet keeps running after promotion
pub const SCALE_DOWN_DELAY_SECONDS: i32 = 60;

pub const LISTEN_PORTS: &str = r#"[{"HTTP": 80}, {"HTTPS": 443}]"#;

const INGRESS_CLASS: &str = "alb";
const PORT_NAME: &str = "app-traffic";

/// AWS Load Balancer Controller annotations
pub mod alb {
    pub const GROUP_NAME: &str = "alb.ingress.kubernetes.io/group.name";
    pub const TARGET_TYPE: &str = "alb.ingress.kubernetes.io/target-type";
    pub const LISTEN_PORTS: &str = "alb.ingress.kubernetes.io/listen-ports";
    pub const SSL_REDIRECT: &str = "alb.ingress.kubernetes.io/ssl-redirect";
    pub const HEALTHCHECK_PATH: &str = "alb.ingress.kubernetes.io/healthcheck-path";
    pub const SCHEME: &str = "alb.ingress.kubernetes.io/scheme";
    pub const TARGET_GROUP_ATTRIBUTES: &str = "alb.ingress.kubernetes.io/target-group-attributes";
}

/// References to everything [`build`] registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartResources {
    pub config_map: ResourceRef,
    pub service: ResourceRef,
    pub preview_service: ResourceRef,
    pub service_account: ResourceRef,
    pub ingress: ResourceRef,
    pub preview_ingress: ResourceRef,
    pub rollout: ResourceRef,
}

/// A scope synthesized as one manifest file
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    scope: Scope,
}

impl Chart {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            scope: Scope::new(id),
        }
    }

    /// Build the blue/green chart and label its ingresses
    pub fn from_config(id: impl Into<String>, config: &ChartConfig) -> Result<Self> {
        let mut chart = Self::new(id);
        build(&mut chart.scope, config)?;
        LabelPropagation::new(ResourceKind::Ingress, LabelSet::common(config))
            .apply(&mut chart.scope);
        Ok(chart)
    }

    pub fn id(&self) -> &str {
        self.scope.id()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn validate(&self) -> Result<()> {
        self.scope.validate()
    }
}

/// Register the seven chart resources under `scope`
///
/// The config is validated first, so a bad record leaves `scope` untouched.
pub fn build(scope: &mut Scope, config: &ChartConfig) -> Result<ChartResources> {
    config.validate()?;

    let selector = BTreeMap::from([("name".to_string(), config.name.clone())]);

    let config_map = scope.add(
        "vars",
        ConfigMap {
            data: Some(BTreeMap::from([("test".to_string(), "asd".to_string())])),
            ..Default::default()
        },
    )?;

    let service = scope.add("service", service_manifest(&config.name, config.port, &selector))?;
    let preview_service = scope.add(
        "service-preview",
        service_manifest(&config.preview_name(), config.port, &selector),
    )?;

    let service_account = scope.add(
        "service-account",
        ServiceAccount {
            metadata: ObjectMeta {
                name: Some(config.name.clone()),
                annotations: Some(BTreeMap::from([(
                    ROLE_ARN_ANNOTATION.to_string(),
                    config.role_arn.clone(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        },
    )?;

    let annotations = alb_annotations(&config.argo_project);
    let ingress = scope.add(
        "ingress",
        ingress_manifest(&config.name, config, &service, &annotations),
    )?;
    let preview_ingress = scope.add(
        "ingress-preview",
        ingress_manifest(&config.preview_name(), config, &preview_service, &annotations),
    )?;

    let rollout = scope.add(
        "web",
        rollout_manifest(
            config,
            &selector,
            &service,
            &preview_service,
            &config_map,
            &service_account,
        ),
    )?;

    info!(
        chart = scope.id(),
        env = %config.env,
        resources = scope.resources().count(),
        "built chart"
    );

    Ok(ChartResources {
        config_map,
        service,
        preview_service,
        service_account,
        ingress,
        preview_ingress,
        rollout,
    })
}

fn alb_annotations(argo_project: &str) -> BTreeMap<String, String> {
    [
        (alb::GROUP_NAME, argo_project),
        (alb::TARGET_TYPE, "ip"),
        (alb::LISTEN_PORTS, LISTEN_PORTS),
        (alb::SSL_REDIRECT, "443"),
        (alb::HEALTHCHECK_PATH, HEALTH_CHECK_PATH),
        (alb::SCHEME, "internal"),
        (alb::TARGET_GROUP_ATTRIBUTES, "deregistration_delay.timeout_seconds=30"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn service_manifest(name: &str, port: u16, selector: &BTreeMap<String, String>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some(PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                port: i32::from(port),
                target_port: Some(IntOrString::Int(i32::from(port))),
                ..Default::default()
            }]),
            type_: Some("NodePort".to_string()),
            selector: Some(selector.clone()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn ingress_manifest(
    name: &str,
    config: &ChartConfig,
    backend: &ResourceRef,
    annotations: &BTreeMap<String, String>,
) -> Ingress {
    let path = HTTPIngressPath {
        path: Some("/".to_string()),
        path_type: "Prefix".to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: backend.name.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(i32::from(config.port)),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    };

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            annotations: Some(annotations.clone()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(INGRESS_CLASS.to_string()),
            rules: Some(vec![IngressRule {
                host: Some(config.hostname.clone()),
                http: Some(HTTPIngressRuleValue { paths: vec![path] }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn rollout_manifest(
    config: &ChartConfig,
    selector: &BTreeMap<String, String>,
    service: &ResourceRef,
    preview_service: &ResourceRef,
    config_map: &ResourceRef,
    service_account: &ResourceRef,
) -> Rollout {
    let port = i32::from(config.port);

    let container = Container {
        name: config.name.clone(),
        command: Some(vec![config.command.clone()]),
        env: Some(observability_env()),
        env_from: Some(vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: config_map.name.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ports: Some(vec![ContainerPort {
            container_port: port,
            ..Default::default()
        }]),
        ..Default::default()
    };

    let template = PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(selector.clone()),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![container],
            service_account_name: Some(service_account.name.clone()),
            volumes: Some(Vec::new()),
            ..Default::default()
        }),
    };

    let spec = RolloutSpec {
        replicas: None,
        selector: Some(LabelSelector {
            match_labels: Some(selector.clone()),
            ..Default::default()
        }),
        strategy: RolloutStrategy {
            blue_green: Some(BlueGreenStrategy {
                active_service: service.name.clone(),
                preview_service: Some(preview_service.name.clone()),
                auto_promotion_enabled: Some(true),
                scale_down_delay_seconds: Some(SCALE_DOWN_DELAY_SECONDS),
            }),
        },
        template,
    };

    Rollout::new(
        ObjectMeta {
            name: Some(config.name.clone()),
            ..Default::default()
        },
        spec,
    )
}
