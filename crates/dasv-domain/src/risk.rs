//! Risk matrix

use crate::propagation::clamp_unit;
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Impact severity on a 1..=5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Impact(u8);

impl Impact {
    /// Create an impact level
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidImpact`] outside 1..=5
    pub fn new(level: u8) -> Result<Self, DomainError> {
        if !(1..=5).contains(&level) {
            return Err(DomainError::InvalidImpact(level));
        }
        Ok(Self(level))
    }

    /// Numeric level
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Impact {
    type Error = DomainError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Impact> for u8 {
    fn from(impact: Impact) -> Self {
        impact.0
    }
}

/// One risk category with independently estimated probability and impact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrixEntry {
    /// Risk category name
    pub category: String,
    /// Probability of occurrence
    pub probability: f64,
    /// Impact if it occurs
    pub impact: Impact,
    /// Field(s) the estimate was taken from
    pub evidence: String,
    /// Confidence in the estimate
    pub confidence: f64,
}

impl RiskMatrixEntry {
    /// Create an entry, validating the probability
    pub fn new(
        category: impl Into<String>,
        probability: f64,
        impact: Impact,
        evidence: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, DomainError> {
        let category = category.into();
        if !(0.0..=1.0).contains(&probability) {
            return Err(DomainError::ProbabilityOutOfRange {
                name: category,
                value: probability,
            });
        }
        Ok(Self {
            category,
            probability,
            impact,
            evidence: evidence.into(),
            confidence: clamp_unit(confidence),
        })
    }

    /// Raw expected severity: probability × impact
    pub fn raw_score(&self) -> f64 {
        self.probability * f64::from(self.impact.level())
    }

    /// Confidence-weighted contribution to the aggregate score
    pub fn weighted_score(&self) -> f64 {
        self.raw_score() * self.confidence
    }
}

/// A set of risk entries with no duplicate category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskMatrix {
    entries: Vec<RiskMatrixEntry>,
}

impl RiskMatrix {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    ///
    /// # Errors
    /// Returns [`DomainError::DuplicateRiskCategory`] if the category exists
    pub fn insert(&mut self, entry: RiskMatrixEntry) -> Result<(), DomainError> {
        if self.entries.iter().any(|e| e.category == entry.category) {
            return Err(DomainError::DuplicateRiskCategory(entry.category));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[RiskMatrixEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the matrix is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Σ probability × impact × confidence
    pub fn aggregate_score(&self) -> f64 {
        self.entries.iter().map(RiskMatrixEntry::weighted_score).sum()
    }

    /// Σ probability × impact, ignoring confidence
    pub fn unweighted_score(&self) -> f64 {
        self.entries.iter().map(RiskMatrixEntry::raw_score).sum()
    }

    /// The `n` largest contributors to the aggregate score
    ///
    /// Ties are broken by category name so the result is deterministic.
    pub fn top_contributors(&self, n: usize) -> Vec<&RiskMatrixEntry> {
        let mut ranked: Vec<&RiskMatrixEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            b.weighted_score()
                .total_cmp(&a.weighted_score())
                .then_with(|| a.category.cmp(&b.category))
        });
        ranked.truncate(n);
        ranked
    }
}
