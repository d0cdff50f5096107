//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use std::path::Path;

use miette::Diagnostic;
use rollchart_core::ChartError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Config file could not be parsed or failed validation
    #[error("Invalid config {path}: {message}")]
    #[diagnostic(code(rollchart::cli::config))]
    Config {
        path: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Resource tree could not be built or rendered
    #[error("Build failed: {message}")]
    #[diagnostic(code(rollchart::cli::build))]
    Build { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(rollchart::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Wrap an IO failure on `path`
    pub fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("failed to {} {}: {}", action, path.display(), err),
        }
    }

    /// Classify a core error raised while loading or building from `path`
    pub fn from_chart(path: &Path, err: ChartError) -> Self {
        match err {
            ChartError::ConfigParse(_) => Self::Config {
                path: path.display().to_string(),
                message: err.to_string(),
                help: Some("every field of the config record is required".to_string()),
            },
            ChartError::InvalidConfig { .. } => Self::Config {
                path: path.display().to_string(),
                message: err.to_string(),
                help: None,
            },
            other => Self::Build {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
