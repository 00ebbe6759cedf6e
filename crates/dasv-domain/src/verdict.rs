//! Validation verdicts and certification state

use crate::propagation::clamp_unit;
use crate::{DomainError, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of one validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    /// Check passed
    Pass,
    /// Non-blocking issue, logged and surfaced
    Flag,
    /// Blocking issue; prevents certification
    Fail,
}

impl CheckResult {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckResult::Pass => "pass",
            CheckResult::Flag => "flag",
            CheckResult::Fail => "fail",
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One check with its result and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name
    pub name: String,
    /// Result
    pub result: CheckResult,
    /// Free-text reason
    pub reason: String,
}

impl CheckOutcome {
    /// Passing check
    pub fn pass(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, CheckResult::Pass, reason)
    }

    /// Flagged check
    pub fn flag(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, CheckResult::Flag, reason)
    }

    /// Failed check
    pub fn fail(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, CheckResult::Fail, reason)
    }

    /// Create a check outcome
    pub fn new(name: impl Into<String>, result: CheckResult, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result,
            reason: reason.into(),
        }
    }
}

/// How rigorously the gate validates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationDepth {
    /// Default depth
    #[default]
    Standard,
    /// Stricter significance checking
    Comprehensive,
    /// Highest threshold; missing disclosures block
    Institutional,
}

impl ValidationDepth {
    /// Certification threshold used when none is configured
    pub fn default_threshold(&self) -> f64 {
        match self {
            ValidationDepth::Standard | ValidationDepth::Comprehensive => 0.90,
            ValidationDepth::Institutional => 0.95,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationDepth::Standard => "standard",
            ValidationDepth::Comprehensive => "comprehensive",
            ValidationDepth::Institutional => "institutional",
        }
    }
}

impl fmt::Display for ValidationDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ValidationDepth::Standard),
            "comprehensive" => Ok(ValidationDepth::Comprehensive),
            "institutional" => Ok(ValidationDepth::Institutional),
            other => Err(format!(
                "unknown validation depth '{}': expected standard, comprehensive or institutional",
                other
            )),
        }
    }
}

/// Output of the validation gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    id: RecordId,
    finding_ref: RecordId,
    created_at: DateTime<Utc>,
    checks: Vec<CheckOutcome>,
    aggregate_reliability: f64,
    threshold: f64,
    certified: bool,
}

impl ValidationVerdict {
    /// Build a verdict
    ///
    /// Certified only when the aggregate reliability meets the threshold and
    /// no check failed. A single `fail` blocks regardless of the aggregate.
    pub fn new(
        finding_ref: RecordId,
        checks: Vec<CheckOutcome>,
        aggregate_reliability: f64,
        threshold: f64,
    ) -> Self {
        let aggregate_reliability = clamp_unit(aggregate_reliability);
        let any_fail = checks.iter().any(|c| c.result == CheckResult::Fail);
        let certified = !any_fail && aggregate_reliability >= threshold;

        Self {
            id: RecordId::new(),
            finding_ref,
            created_at: Utc::now(),
            checks,
            aggregate_reliability,
            threshold,
            certified,
        }
    }

    /// Verdict id
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Finding the verdict applies to
    pub fn finding_ref(&self) -> RecordId {
        self.finding_ref
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Every check, in checklist order
    pub fn checks(&self) -> &[CheckOutcome] {
        &self.checks
    }

    /// Check by name
    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Aggregate reliability in [0, 1]
    pub fn aggregate_reliability(&self) -> f64 {
        self.aggregate_reliability
    }

    /// Threshold the verdict was judged against
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether the finding is ready for publication
    pub fn certified(&self) -> bool {
        self.certified
    }

    /// Number of checks with the given result
    pub fn count(&self, result: CheckResult) -> usize {
        self.checks.iter().filter(|c| c.result == result).count()
    }

    /// Everything a caller must remediate before resubmitting
    pub fn rejection_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .checks
            .iter()
            .filter(|c| c.result != CheckResult::Pass)
            .map(|c| format!("{} [{}]: {}", c.name, c.result, c.reason))
            .collect();

        if self.aggregate_reliability < self.threshold {
            reasons.push(format!(
                "aggregate reliability {:.3} below threshold {:.3}",
                self.aggregate_reliability, self.threshold
            ));
        }
        reasons
    }
}

/// Certification lifecycle of one validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// Not yet validated
    #[default]
    NotValidated,
    /// Checks running
    InProgress,
    /// Ready for publication
    Certified,
    /// Failed the gate
    Rejected,
}

impl ValidationState {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::NotValidated => "not_validated",
            ValidationState::InProgress => "in_progress",
            ValidationState::Certified => "certified",
            ValidationState::Rejected => "rejected",
        }
    }

    /// Move to `next`
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTransition`] for any edge outside
    /// `not_validated → in_progress → {certified | rejected}`
    pub fn transition(self, next: ValidationState) -> Result<ValidationState, DomainError> {
        use ValidationState::*;
        match (self, next) {
            (NotValidated, InProgress) | (InProgress, Certified) | (InProgress, Rejected) => {
                Ok(next)
            }
            _ => Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fail_blocks_high_aggregate() {
        let checks = vec![
            CheckOutcome::pass("provenance", "ok"),
            CheckOutcome::fail("price_consistency", "re-fetched price 8% away"),
        ];
        let verdict = ValidationVerdict::new(RecordId::new(), checks, 0.97, 0.90);
        assert!(!verdict.certified());
        assert!(verdict.rejection_reasons()[0].contains("price_consistency"));
    }

    #[test]
    fn test_flags_do_not_block() {
        let checks = vec![
            CheckOutcome::pass("provenance", "ok"),
            CheckOutcome::flag("disclosures", "missing risk disclosure"),
        ];
        let verdict = ValidationVerdict::new(RecordId::new(), checks, 0.91, 0.90);
        assert!(verdict.certified());
        assert_eq!(verdict.count(CheckResult::Flag), 1);
    }

    #[test]
    fn test_low_aggregate_rejected_with_reason() {
        let verdict = ValidationVerdict::new(RecordId::new(), Vec::new(), 0.57, 0.90);
        assert!(!verdict.certified());
        assert!(verdict.rejection_reasons()[0].contains("below threshold"));
    }

    #[test]
    fn test_depth_thresholds_and_parse() {
        assert_eq!(ValidationDepth::Standard.default_threshold(), 0.90);
        assert_eq!(ValidationDepth::Institutional.default_threshold(), 0.95);
        assert_eq!("Institutional".parse::<ValidationDepth>().unwrap(), ValidationDepth::Institutional);
        assert!("deep".parse::<ValidationDepth>().is_err());
    }

    #[test]
    fn test_validation_state_machine() {
        let state = ValidationState::NotValidated;
        assert!(state.transition(ValidationState::Certified).is_err());
        let state = state.transition(ValidationState::InProgress).unwrap();
        let state = state.transition(ValidationState::Rejected).unwrap();
        assert!(state.transition(ValidationState::InProgress).is_err());
    }

    #[test]
    fn test_artifact_keys() {
        let verdict = ValidationVerdict::new(RecordId::new(), vec![CheckOutcome::pass("x", "ok")], 0.95, 0.9);
        let json = serde_json::to_value(&verdict).unwrap();
        for key in ["finding_ref", "checks", "aggregate_reliability", "certified"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["checks"][0]["result"], "pass");
    }
}
