//! Chart configuration record
//!
//! The record is parsed from JSON with camelCase keys. Every field is
//! required; a missing key fails deserialization with serde's
//! "missing field" message, and [`ChartConfig::validate`] rejects values
//! that parse but cannot produce a usable chart.

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};

/// Longest `name` whose `-preview` variant still fits a DNS-1123 label
const MAX_NAME_LEN: usize = 63 - PREVIEW_SUFFIX.len();

const PREVIEW_SUFFIX: &str = "-preview";

/// Input to the chart builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    /// Base name shared by the service, ingress, service account and rollout
    pub name: String,

    /// Command run by the rollout's container
    pub command: String,

    /// Port exposed by the container and both services
    pub port: u16,

    /// IAM role bound to the service account
    pub role_arn: String,

    /// Deployment environment
    pub env: Environment,

    /// Host routed by both ingresses
    pub hostname: String,

    /// ALB group name shared by ingresses of one project
    pub argo_project: String,

    /// Ownership labels
    pub service_info: ServiceInfo,
}

/// Ownership information turned into common labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub department: String,
    pub slack_channel: String,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Qa,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Qa => "qa",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChartConfig {
    /// Parse a config record from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChartConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot express as types
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ChartError::invalid_config(
                "port",
                "must be a positive integer",
            ));
        }

        let required = [
            ("name", &self.name),
            ("command", &self.command),
            ("roleArn", &self.role_arn),
            ("hostname", &self.hostname),
            ("argoProject", &self.argo_project),
            ("serviceInfo.department", &self.service_info.department),
            ("serviceInfo.slackChannel", &self.service_info.slack_channel),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ChartError::invalid_config(field, "must not be empty"));
            }
        }

        if !is_dns_label(&self.name) || self.name.len() > MAX_NAME_LEN {
            return Err(ChartError::invalid_config(
                "name",
                format!(
                    "must be a lowercase DNS label of at most {MAX_NAME_LEN} characters \
                     (a-z, 0-9 and '-', starting and ending alphanumeric)"
                ),
            ));
        }

        Ok(())
    }

    /// Name used by the preview service and ingress
    pub fn preview_name(&self) -> String {
        format!("{}{PREVIEW_SUFFIX}", self.name)
    }
}

/// RFC 1123 label: lowercase alphanumerics and '-', alphanumeric at both ends
fn is_dns_label(value: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    !value.is_empty()
        && value.chars().all(|c| alnum(c) || c == '-')
        && value.starts_with(alnum)
        && value.ends_with(alnum)
}
