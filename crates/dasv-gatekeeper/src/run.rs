//! Certification lifecycle of one validation

use crate::GatekeeperError;
use dasv_domain::{Finding, RecordId, ValidationState, ValidationVerdict};

/// Tracks `not_validated → in_progress → {certified | rejected}` for one finding
///
/// The finding is never touched; re-validation needs a fresh run.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    finding_ref: RecordId,
    state: ValidationState,
}

impl ValidationRun {
    /// Start tracking a finding
    pub fn new(finding: &Finding) -> Self {
        Self {
            finding_ref: finding.id(),
            state: ValidationState::NotValidated,
        }
    }

    /// Finding under validation
    pub fn finding_ref(&self) -> RecordId {
        self.finding_ref
    }

    /// Current state
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Move to `in_progress`
    pub fn begin(&mut self) -> Result<(), GatekeeperError> {
        self.state = self.state.transition(ValidationState::InProgress)?;
        Ok(())
    }

    /// Conclude with a verdict, moving to `certified` or `rejected`
    pub fn conclude(&mut self, verdict: &ValidationVerdict) -> Result<ValidationState, GatekeeperError> {
        if verdict.finding_ref() != self.finding_ref {
            return Err(GatekeeperError::FindingMismatch {
                expected: self.finding_ref,
                actual: verdict.finding_ref(),
            });
        }
        let next = if verdict.certified() {
            ValidationState::Certified
        } else {
            ValidationState::Rejected
        };
        self.state = self.state.transition(next)?;
        Ok(self.state)
    }
}
