//! Sample-size minimums and adequacy

use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Minimum observation counts for statistical claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMinimums {
    /// Below this a statistic is not computed at all
    pub basic: usize,
    /// At or above this a statistic counts as statistically significant
    pub significant: usize,
}

impl Default for SampleMinimums {
    fn default() -> Self {
        Self {
            basic: 5,
            significant: 15,
        }
    }
}

impl SampleMinimums {
    /// Check `0 < basic <= significant`
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.basic == 0 {
            return Err(DomainError::InvalidSampleMinimums(
                "basic minimum must be greater than 0".to_string(),
            ));
        }
        if self.basic > self.significant {
            return Err(DomainError::InvalidSampleMinimums(format!(
                "basic minimum {} exceeds significant minimum {}",
                self.basic, self.significant
            )));
        }
        Ok(())
    }

    /// Classify an observation count
    pub fn assess(&self, n: usize) -> SampleAdequacy {
        if n < self.basic {
            SampleAdequacy::Insufficient {
                observed: n,
                required: self.basic,
            }
        } else if n < self.significant {
            SampleAdequacy::Basic
        } else {
            SampleAdequacy::Significant
        }
    }
}

/// How well a sample supports a statistical claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum SampleAdequacy {
    /// Too few observations; the statistic must not be computed
    Insufficient {
        /// Observations available
        observed: usize,
        /// Basic minimum
        required: usize,
    },
    /// Enough for a basic statistic, not for significance
    Basic,
    /// Statistically significant sample
    Significant,
}

impl SampleAdequacy {
    /// Whether a statistic may be computed
    pub fn is_sufficient(&self) -> bool {
        !matches!(self, SampleAdequacy::Insufficient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_minimums() {
        let m = SampleMinimums::default();
        assert_eq!(m.basic, 5);
        assert_eq!(m.significant, 15);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_invalid_minimums() {
        assert!(SampleMinimums { basic: 0, significant: 15 }.validate().is_err());
        assert!(SampleMinimums { basic: 20, significant: 15 }.validate().is_err());
    }

    #[test]
    fn test_assess() {
        let m = SampleMinimums::default();
        assert_eq!(
            m.assess(3),
            SampleAdequacy::Insufficient { observed: 3, required: 5 }
        );
        assert_eq!(m.assess(5), SampleAdequacy::Basic);
        assert_eq!(m.assess(14), SampleAdequacy::Basic);
        assert_eq!(m.assess(15), SampleAdequacy::Significant);
        assert!(!m.assess(0).is_sufficient());
    }
}
