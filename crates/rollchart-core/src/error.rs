//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid config field `{field}`: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Duplicate construct id '{id}' in scope '{scope}'")]
    DuplicateId { scope: String, id: String },

    #[error("Duplicate {kind} name '{name}' in chart")]
    DuplicateName { kind: String, name: String },

    #[error("Invalid label '{key}': {message}")]
    InvalidLabel { key: String, message: String },

    #[error("Failed to render manifest: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl ChartError {
    pub(crate) fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
