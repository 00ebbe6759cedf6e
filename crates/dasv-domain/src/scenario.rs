//! Scenario sets (bear/base/bull or any N-way partition)

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default allowed deviation of the probability sum from 1.0
pub const SCENARIO_SUM_TOLERANCE: f64 = 0.005;

/// One scenario with its probability and outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Probability of the scenario
    pub probability: f64,
    /// Outcome under the scenario (e.g. return)
    pub outcome: f64,
}

/// A validated partition of scenarios
///
/// Probabilities must sum to 1.0 within tolerance. An invalid sum is an error,
/// never silently renormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Validate and build a scenario set
    ///
    /// # Errors
    /// - [`DomainError::InvalidScenarioSet`] for an empty set or duplicate names
    /// - [`DomainError::ProbabilityOutOfRange`] for a probability outside [0, 1]
    /// - [`DomainError::ScenarioProbabilityInvalid`] when the sum is off by more than `tolerance`
    pub fn new(scenarios: Vec<Scenario>, tolerance: f64) -> Result<Self, DomainError> {
        if scenarios.is_empty() {
            return Err(DomainError::InvalidScenarioSet(
                "at least one scenario is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for s in &scenarios {
            if !names.insert(s.name.as_str()) {
                return Err(DomainError::InvalidScenarioSet(format!(
                    "duplicate scenario '{}'",
                    s.name
                )));
            }
            if !(0.0..=1.0).contains(&s.probability) {
                return Err(DomainError::ProbabilityOutOfRange {
                    name: s.name.clone(),
                    value: s.probability,
                });
            }
        }

        let sum: f64 = scenarios.iter().map(|s| s.probability).sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(DomainError::ScenarioProbabilityInvalid { sum, tolerance });
        }

        Ok(Self { scenarios })
    }

    /// Scenarios in the given order
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Sum of probabilities
    pub fn probability_sum(&self) -> f64 {
        self.scenarios.iter().map(|s| s.probability).sum()
    }

    /// Probability-weighted outcome
    pub fn expected_outcome(&self) -> f64 {
        self.scenarios
            .iter()
            .map(|s| s.probability * s.outcome)
            .sum()
    }
}
