//! Gatekeeper error types

use dasv_domain::{DomainError, RecordId};
use thiserror::Error;

/// Errors that can occur during gatekeeper operations
///
/// A failing check is not an error; it is recorded in the verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Records handed in as evidence do not belong to the finding
    #[error("Evidence mismatch: {0}")]
    EvidenceMismatch(String),

    /// A verdict was concluded against the wrong finding
    #[error("Verdict for finding {actual} cannot conclude validation of {expected}")]
    FindingMismatch {
        /// Finding under validation
        expected: RecordId,
        /// Finding the verdict refers to
        actual: RecordId,
    },

    /// Invalid lifecycle transition
    #[error(transparent)]
    Domain(#[from] DomainError),
}
