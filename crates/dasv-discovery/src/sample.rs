//! Sample Validator
//!
//! Classifies repeated events into mutually exclusive status categories and
//! judges whether a category holds enough observations for a statistic.

use crate::DiscoveryError;
use dasv_domain::propagation::sample_penalty;
use dasv_domain::{DiscoveryRecord, Event, EventSet, EventStatus, SampleAdequacy, SampleMinimums};

/// Gatekeeper for statistical claims over counted observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleValidator {
    minimums: SampleMinimums,
}

impl SampleValidator {
    /// Create a validator
    ///
    /// # Errors
    /// Returns [`DiscoveryError::Domain`] if the minimums are inconsistent
    pub fn new(minimums: SampleMinimums) -> Result<Self, DiscoveryError> {
        minimums.validate()?;
        Ok(Self { minimums })
    }

    /// Configured minimums
    pub fn minimums(&self) -> SampleMinimums {
        self.minimums
    }

    /// Classify events into closed and open categories, never merged
    pub fn partition(&self, events: impl IntoIterator<Item = Event>) -> EventSet {
        EventSet::partition(events)
    }

    /// Adequacy of an observation count
    pub fn assess(&self, n: usize) -> SampleAdequacy {
        self.minimums.assess(n)
    }

    /// Adequacy of one event category in a discovery record
    pub fn assess_category(&self, record: &DiscoveryRecord, status: EventStatus) -> SampleAdequacy {
        self.assess(record.count(status))
    }

    /// Confidence penalty for a statistic over `n` observations
    ///
    /// Below the basic minimum the shortfall is measured against `basic`; a
    /// computed statistic on a basic-only sample is measured against
    /// `significant`.
    pub fn penalty(&self, n: usize) -> f64 {
        if n < self.minimums.basic {
            sample_penalty(n, self.minimums.basic)
        } else {
            sample_penalty(n, self.minimums.significant)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inconsistent_minimums() {
        assert!(SampleValidator::new(SampleMinimums { basic: 0, significant: 5 }).is_err());
        assert!(SampleValidator::new(SampleMinimums { basic: 10, significant: 5 }).is_err());
    }

    #[test]
    fn test_assess_levels() {
        let validator = SampleValidator::default();
        assert_eq!(
            validator.assess(3),
            SampleAdequacy::Insufficient { observed: 3, required: 5 }
        );
        assert_eq!(validator.assess(5), SampleAdequacy::Basic);
        assert_eq!(validator.assess(15), SampleAdequacy::Significant);
    }

    #[test]
    fn test_penalty_against_each_minimum() {
        let validator = SampleValidator::default();
        assert!((validator.penalty(3) - 0.4).abs() < 1e-12);
        // 12 of 15 for significance
        assert!((validator.penalty(12) - 0.2).abs() < 1e-12);
        assert_eq!(validator.penalty(15), 0.0);
    }
}
