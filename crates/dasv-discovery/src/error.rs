//! Discovery error types

use dasv_domain::DomainError;
use thiserror::Error;

/// Errors that abort a discovery run
///
/// Adapter failures, disagreements and stale data are not errors: they are
/// recorded in the discovery record's health map and review flags.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The aggregator was built without adapters
    #[error("No source adapters configured")]
    NoAdapters,

    /// Every adapter failed or returned nothing for the subject
    #[error("No source returned data for '{subject}': {reasons}")]
    AllSourcesUnavailable {
        /// Subject being discovered
        subject: String,
        /// Per-adapter reasons, joined
        reasons: String,
    },

    /// The caller cancelled the run; nothing partial is returned
    #[error("Discovery for '{0}' was cancelled")]
    Cancelled(String),

    /// A domain invariant was violated
    #[error(transparent)]
    Domain(#[from] DomainError),
}
