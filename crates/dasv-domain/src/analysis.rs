//! Analysis records: derived metrics per category, each with its own confidence

use crate::discovery::DiscoveryRef;
use crate::propagation::{combine, sample_penalty, MAX_SAMPLE_PENALTY};
use crate::risk::RiskMatrix;
use crate::sample::SampleAdequacy;
use crate::scenario::ScenarioSet;
use crate::{DomainError, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Analysis category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Statistics over closed events only
    ClosedPerformance,
    /// Statistics over open events only
    OpenExposure,
    /// Growth decomposition
    Growth,
    /// Risk matrix
    RiskMatrix,
    /// Scenario analysis
    Scenarios,
}

impl CategoryKind {
    /// Every category, in evaluation order
    pub const ALL: [CategoryKind; 5] = [
        CategoryKind::ClosedPerformance,
        CategoryKind::OpenExposure,
        CategoryKind::Growth,
        CategoryKind::RiskMatrix,
        CategoryKind::Scenarios,
    ];

    /// Category name as used in artifacts and metric paths
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::ClosedPerformance => "closed_performance",
            CategoryKind::OpenExposure => "open_exposure",
            CategoryKind::Growth => "growth",
            CategoryKind::RiskMatrix => "risk_matrix",
            CategoryKind::Scenarios => "scenarios",
        }
    }

    /// Parse a category name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of one analysis category
///
/// `pending → computing → {computed | insufficient_sample | error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryStatus {
    /// Not started
    Pending,
    /// In progress
    Computing,
    /// Computed from an adequate sample
    Computed,
    /// Excluded: too few observations
    InsufficientSample {
        /// Observations available
        observed: usize,
        /// Minimum required
        required: usize,
    },
    /// Excluded: the computation was structurally invalid
    Error {
        /// What went wrong
        reason: String,
    },
}

impl CategoryStatus {
    /// Short status name
    pub fn name(&self) -> &'static str {
        match self {
            CategoryStatus::Pending => "pending",
            CategoryStatus::Computing => "computing",
            CategoryStatus::Computed => "computed",
            CategoryStatus::InsufficientSample { .. } => "insufficient_sample",
            CategoryStatus::Error { .. } => "error",
        }
    }

    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CategoryStatus::Pending | CategoryStatus::Computing)
    }

    /// Whether the category may feed headlines and downstream inputs
    pub fn is_computed(&self) -> bool {
        matches!(self, CategoryStatus::Computed)
    }

    fn can_transition_to(&self, next: &CategoryStatus) -> bool {
        match (self, next) {
            (CategoryStatus::Pending, CategoryStatus::Computing) => true,
            (CategoryStatus::Computing, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Explanation for an excluded category
    pub fn exclusion_reason(&self) -> Option<String> {
        match self {
            CategoryStatus::InsufficientSample { observed, required } => Some(format!(
                "insufficient sample: {} observation(s), {} required",
                observed, required
            )),
            CategoryStatus::Error { reason } => Some(format!("error: {}", reason)),
            _ => None,
        }
    }
}

/// Drives one category through its lifecycle, rejecting forbidden edges
#[derive(Debug, Clone)]
pub struct CategoryState {
    kind: CategoryKind,
    status: CategoryStatus,
}

impl CategoryState {
    /// A pending category
    pub fn new(kind: CategoryKind) -> Self {
        Self {
            kind,
            status: CategoryStatus::Pending,
        }
    }

    /// Category being tracked
    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    /// Current status
    pub fn status(&self) -> &CategoryStatus {
        &self.status
    }

    /// Move to `next`
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTransition`] for any edge outside the lifecycle
    pub fn transition(&mut self, next: CategoryStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.name().to_string(),
                to: next.name().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// `pending → computing`
    pub fn begin(&mut self) -> Result<(), DomainError> {
        self.transition(CategoryStatus::Computing)
    }

    /// `computing → computed`
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(CategoryStatus::Computed)
    }

    /// `computing → insufficient_sample`
    pub fn insufficient(&mut self, observed: usize, required: usize) -> Result<(), DomainError> {
        self.transition(CategoryStatus::InsufficientSample { observed, required })
    }

    /// `computing → error`
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(CategoryStatus::Error {
            reason: reason.into(),
        })
    }

    /// Consume the tracker, returning the final status
    pub fn into_status(self) -> CategoryStatus {
        self.status
    }
}

/// A derived metric with its propagated confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, unique within its category
    pub name: String,
    /// Value
    pub value: f64,
    /// `combine()` of the inputs' confidences
    pub confidence: f64,
    /// Discovery fields or event categories the metric was derived from
    pub inputs: Vec<String>,
}

impl Metric {
    /// Create a metric
    pub fn new(name: impl Into<String>, value: f64, confidence: f64, inputs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value,
            confidence: crate::propagation::clamp_unit(confidence),
            inputs,
        }
    }
}

/// Final state of one analysis category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Category
    pub kind: CategoryKind,
    /// Terminal status
    #[serde(flatten)]
    pub status: CategoryStatus,
    /// Metrics (empty unless computed)
    pub metrics: Vec<Metric>,
    /// Category confidence: `combine()` of its metrics (0 unless computed)
    pub confidence: f64,
    /// Sample adequacy, for categories backed by counted observations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<SampleAdequacy>,
}

impl CategoryResult {
    /// A computed category; confidence is `combine()` over its metrics
    pub fn computed(kind: CategoryKind, metrics: Vec<Metric>, sample: Option<SampleAdequacy>) -> Self {
        let confidences: Vec<f64> = metrics.iter().map(|m| m.confidence).collect();
        Self {
            kind,
            status: CategoryStatus::Computed,
            confidence: combine(&confidences, 0.0),
            metrics,
            sample,
        }
    }

    /// An excluded category; carries no metrics and zero confidence
    pub fn excluded(kind: CategoryKind, status: CategoryStatus, sample: Option<SampleAdequacy>) -> Self {
        Self {
            kind,
            status,
            metrics: Vec::new(),
            confidence: 0.0,
            sample,
        }
    }

    /// Metric by name (only for computed categories)
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        if !self.status.is_computed() {
            return None;
        }
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Penalty this category imposes on the record-level confidence
    fn record_penalty(&self) -> f64 {
        match &self.status {
            CategoryStatus::InsufficientSample { observed, required } => {
                sample_penalty(*observed, *required)
            }
            CategoryStatus::Error { .. } => MAX_SAMPLE_PENALTY,
            _ => 0.0,
        }
    }
}

/// A headline number with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineValue {
    /// Value
    pub value: f64,
    /// Confidence of the source metric
    pub confidence: f64,
    /// `category.metric` path of the source
    pub source: String,
}

/// Headline statistics, populated only from computed categories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    /// Win rate over closed events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<HeadlineValue>,
    /// Confidence-weighted risk score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<HeadlineValue>,
    /// Probability-weighted scenario outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<HeadlineValue>,
}

/// Output of the analysis phase
///
/// References exactly one discovery record without owning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    id: RecordId,
    discovery: DiscoveryRef,
    created_at: DateTime<Utc>,
    categories: BTreeMap<CategoryKind, CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk_matrix: Option<RiskMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenarios: Option<ScenarioSet>,
    headline: Headline,
    overall_confidence: f64,
}

impl AnalysisRecord {
    /// Build an analysis record
    ///
    /// Headline values are taken only from computed categories, and the risk
    /// matrix and scenario set are dropped unless their category was computed.
    /// The overall confidence is `combine()` over the discovery confidence and
    /// every computed category, penalized by the worst exclusion.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTransition`] if a category is not terminal
    pub fn new(
        discovery: DiscoveryRef,
        discovery_confidence: f64,
        categories: Vec<CategoryResult>,
        risk_matrix: Option<RiskMatrix>,
        scenarios: Option<ScenarioSet>,
    ) -> Result<Self, DomainError> {
        let mut by_kind = BTreeMap::new();
        for category in categories {
            if !category.status.is_terminal() {
                return Err(DomainError::InvalidTransition {
                    from: category.status.name().to_string(),
                    to: "recorded".to_string(),
                });
            }
            by_kind.insert(category.kind, category);
        }

        let is_computed = |kind: CategoryKind| {
            by_kind
                .get(&kind)
                .is_some_and(|c: &CategoryResult| c.status.is_computed())
        };
        let risk_matrix = risk_matrix.filter(|_| is_computed(CategoryKind::RiskMatrix));
        let scenarios = scenarios.filter(|_| is_computed(CategoryKind::Scenarios));

        let headline_from = |kind: CategoryKind, metric: &str| {
            by_kind.get(&kind).and_then(|c| c.metric(metric)).map(|m| HeadlineValue {
                value: m.value,
                confidence: m.confidence,
                source: format!("{}.{}", kind, m.name),
            })
        };
        let headline = Headline {
            win_rate: headline_from(CategoryKind::ClosedPerformance, "win_rate"),
            risk_score: headline_from(CategoryKind::RiskMatrix, "aggregate_score"),
            expected_outcome: headline_from(CategoryKind::Scenarios, "expected_outcome"),
        };

        let mut parents = vec![discovery_confidence];
        parents.extend(
            by_kind
                .values()
                .filter(|c| c.status.is_computed())
                .map(|c| c.confidence),
        );
        let penalty = by_kind
            .values()
            .map(CategoryResult::record_penalty)
            .fold(0.0, f64::max);
        let overall_confidence = combine(&parents, penalty);

        Ok(Self {
            id: RecordId::new(),
            discovery,
            created_at: Utc::now(),
            categories: by_kind,
            risk_matrix,
            scenarios,
            headline,
            overall_confidence,
        })
    }

    /// Record id
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The discovery record this analysis was computed from
    pub fn discovery(&self) -> &DiscoveryRef {
        &self.discovery
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All categories, including excluded ones with their reasons
    pub fn categories(&self) -> &BTreeMap<CategoryKind, CategoryResult> {
        &self.categories
    }

    /// One category
    pub fn category(&self, kind: CategoryKind) -> Option<&CategoryResult> {
        self.categories.get(&kind)
    }

    /// Look up a computed metric by `category.metric` path
    pub fn metric(&self, path: &str) -> Option<&Metric> {
        let (category, metric) = path.split_once('.')?;
        self.categories
            .get(&CategoryKind::parse(category)?)?
            .metric(metric)
    }

    /// Every computed metric keyed by `category.metric`
    pub fn computed_metrics(&self) -> impl Iterator<Item = (String, &Metric)> {
        self.categories
            .values()
            .filter(|c| c.status.is_computed())
            .flat_map(|c| c.metrics.iter().map(move |m| (format!("{}.{}", c.kind, m.name), m)))
    }

    /// Risk matrix, if computed
    pub fn risk_matrix(&self) -> Option<&RiskMatrix> {
        self.risk_matrix.as_ref()
    }

    /// Scenario set, if computed
    pub fn scenarios(&self) -> Option<&ScenarioSet> {
        self.scenarios.as_ref()
    }

    /// Headline statistics
    pub fn headline(&self) -> &Headline {
        &self.headline
    }

    /// Record-level confidence
    pub fn overall_confidence(&self) -> f64 {
        self.overall_confidence
    }
}
