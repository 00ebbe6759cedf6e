//! Adapter error types

use thiserror::Error;

/// Errors returned by a source adapter
///
/// None of these abort discovery: the aggregator records the adapter as
/// unavailable and continues with the remaining sources.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The provider could not be reached or refused the request
    #[error("Adapter '{adapter}' unavailable: {reason}")]
    Unavailable {
        /// Adapter name
        adapter: String,
        /// What went wrong
        reason: String,
    },

    /// The provider answered with data that could not be interpreted
    #[error("Invalid response from '{adapter}': {reason}")]
    InvalidResponse {
        /// Adapter name
        adapter: String,
        /// What went wrong
        reason: String,
    },

    /// The shared rate-limit budget is exhausted
    #[error("Rate limit exceeded for '{0}'")]
    RateLimited(String),

    /// A fixture file could not be read or parsed
    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl AdapterError {
    /// Shorthand for [`AdapterError::Unavailable`]
    pub fn unavailable(adapter: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::Unavailable {
            adapter: adapter.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Fixture(err.to_string())
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Fixture(err.to_string())
    }
}
