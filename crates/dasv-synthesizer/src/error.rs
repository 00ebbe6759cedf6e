//! Synthesis error types

use dasv_domain::RecordId;
use thiserror::Error;

/// Errors that prevent a finding from being composed
///
/// A recommendation that contradicts its own valuation gap is not an error:
/// the finding is still produced and flagged for review.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// The analysis record was computed from a different discovery record
    #[error("Analysis references discovery record {referenced}, not {discovery}")]
    RecordMismatch {
        /// Discovery record handed to the composer
        discovery: RecordId,
        /// Discovery record the analysis actually references
        referenced: RecordId,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
