//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Command-line override rejected
    #[error("Invalid override for {field}: {message}")]
    InvalidOverride { field: String, message: String },

    /// Frame clock could not be started
    #[error("Failed to start frame clock: {message}")]
    Clock { message: String },

    /// Run ended abnormally
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn invalid_override(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn clock(message: impl Into<String>) -> Self {
        Self::Clock {
            message: message.into(),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}
