//! Error types for the CLI application.

use dasv_adapters::AdapterError;
use dasv_pipeline::{PipelineError, RunStatus};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fixture could not be loaded
    #[error(transparent)]
    Fixture(#[from] AdapterError),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Run status reported for this error
    ///
    /// Anything that stops the run before subjects are processed is a
    /// configuration problem.
    pub fn status(&self) -> RunStatus {
        match self {
            CliError::Pipeline(e) => e.status(),
            CliError::Serialization(_) => RunStatus::PartialFailure,
            _ => RunStatus::ConfigError,
        }
    }
}
