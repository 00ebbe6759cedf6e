//! Which analysis categories to run

use dasv_domain::{CategoryKind, DiscoveryRecord, EventStatus};
use std::collections::BTreeSet;

/// Field prefix for growth components
pub const GROWTH_PREFIX: &str = "growth.";
/// Field prefix for risk estimates
pub const RISK_PREFIX: &str = "risk.";
/// Field prefix for scenarios
pub const SCENARIO_PREFIX: &str = "scenario.";

/// A set of categories to analyze
///
/// An inferred plan runs only categories whose inputs exist. An explicit plan
/// runs every requested category, so a missing input is reported as an
/// insufficient sample rather than silently skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPlan {
    categories: BTreeSet<CategoryKind>,
}

impl AnalysisPlan {
    /// Every category
    pub fn all() -> Self {
        Self::only(CategoryKind::ALL)
    }

    /// Exactly the given categories
    pub fn only(categories: impl IntoIterator<Item = CategoryKind>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Categories whose inputs are present in a discovery record
    pub fn infer(record: &DiscoveryRecord) -> Self {
        let has_prefix = |prefix: &str| record.fields().keys().any(|name| name.starts_with(prefix));

        let mut categories = BTreeSet::new();
        if record.count(EventStatus::Closed) > 0 {
            categories.insert(CategoryKind::ClosedPerformance);
        }
        if record.count(EventStatus::Open) > 0 {
            categories.insert(CategoryKind::OpenExposure);
        }
        if has_prefix(GROWTH_PREFIX) {
            categories.insert(CategoryKind::Growth);
        }
        if has_prefix(RISK_PREFIX) {
            categories.insert(CategoryKind::RiskMatrix);
        }
        if has_prefix(SCENARIO_PREFIX) {
            categories.insert(CategoryKind::Scenarios);
        }
        Self { categories }
    }

    /// Whether a category is planned
    pub fn includes(&self, kind: CategoryKind) -> bool {
        self.categories.contains(&kind)
    }

    /// Planned categories in evaluation order
    pub fn categories(&self) -> impl Iterator<Item = CategoryKind> + '_ {
        self.categories.iter().copied()
    }

    /// Whether nothing is planned
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
