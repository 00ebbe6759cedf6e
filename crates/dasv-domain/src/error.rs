//! Domain error types

use thiserror::Error;

/// Errors raised when a domain value would violate its invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Risk impact outside 1..=5
    #[error("Invalid impact {0}: must be between 1 and 5")]
    InvalidImpact(u8),

    /// A probability outside [0, 1]
    #[error("Probability {value} for '{name}' is outside [0.0, 1.0]")]
    ProbabilityOutOfRange {
        /// Risk category or scenario name
        name: String,
        /// Offending value
        value: f64,
    },

    /// The same risk category was entered twice
    #[error("Duplicate risk category: {0}")]
    DuplicateRiskCategory(String),

    /// Scenario probabilities do not sum to 1.0 within tolerance
    #[error("Scenario probabilities sum to {sum:.4}, outside 1.0 ± {tolerance}")]
    ScenarioProbabilityInvalid {
        /// Actual sum of probabilities
        sum: f64,
        /// Allowed deviation from 1.0
        tolerance: f64,
    },

    /// A scenario set must hold at least one scenario with a unique name
    #[error("Invalid scenario set: {0}")]
    InvalidScenarioSet(String),

    /// Sample minimums are inconsistent
    #[error("Invalid sample minimums: {0}")]
    InvalidSampleMinimums(String),

    /// A lifecycle state machine was driven through a forbidden edge
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// An identifier failed to parse
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}
