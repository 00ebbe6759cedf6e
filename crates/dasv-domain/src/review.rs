//! Review flags: recoverable issues surfaced downstream instead of raised

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of recoverable issue that needs human review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    /// Adapters disagree on a field beyond tolerance
    FieldDisagreement,
    /// An observation is older than the staleness limit
    StaleObservation,
    /// An adapter reported itself degraded
    DegradedSource,
    /// An adapter contributed nothing to the run
    SourceUnavailable,
    /// A stated conclusion contradicts the quantity it summarizes
    ConsistencyViolation,
    /// Adapters report the same event id with different statuses
    EventConflict,
}

impl ReviewKind {
    /// Snake-case name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::FieldDisagreement => "field_disagreement",
            ReviewKind::StaleObservation => "stale_observation",
            ReviewKind::DegradedSource => "degraded_source",
            ReviewKind::SourceUnavailable => "source_unavailable",
            ReviewKind::ConsistencyViolation => "consistency_violation",
            ReviewKind::EventConflict => "event_conflict",
        }
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable issue recorded on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFlag {
    /// Field, adapter or event id the issue concerns
    pub subject: String,
    /// Issue kind
    pub kind: ReviewKind,
    /// Human-readable explanation
    pub reason: String,
}

impl ReviewFlag {
    /// Create a review flag
    pub fn new(subject: impl Into<String>, kind: ReviewKind, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            reason: reason.into(),
        }
    }
}
