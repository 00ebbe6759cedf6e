//! Analysis error types

use dasv_domain::DomainError;
use thiserror::Error;

/// Errors that abort an analysis run
///
/// Insufficient samples and invalid scenario sets are not errors here: they
/// become category statuses inside the analysis record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A domain invariant was violated
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<dasv_discovery::DiscoveryError> for AnalysisError {
    fn from(err: dasv_discovery::DiscoveryError) -> Self {
        AnalysisError::Config(err.to_string())
    }
}
