//! Findings: the merged, self-contained snapshot handed to rendering

use crate::analysis::CategoryKind;
use crate::discovery::DiscoveryRef;
use crate::observation::FieldValue;
use crate::propagation::clamp_unit;
use crate::review::ReviewFlag;
use crate::{RecordId, SubjectId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which upstream record a surfaced value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A reconciled discovery field
    Discovery,
    /// A computed analysis metric
    Analysis,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Discovery => write!(f, "discovery"),
            Origin::Analysis => write!(f, "analysis"),
        }
    }
}

/// Pointer from a surfaced value back to exactly one upstream field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRef {
    /// Record kind
    pub origin: Origin,
    /// Record id
    pub record_id: RecordId,
    /// Field name (discovery) or `category.metric` path (analysis)
    pub field: String,
}

/// A value surfaced in a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacedValue {
    /// Value copied from its source field
    pub value: FieldValue,
    /// Confidence copied from its source field
    pub confidence: f64,
}

/// An analysis category that was left out, with its reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    /// Excluded category
    pub category: CategoryKind,
    /// Why it was excluded
    pub reason: String,
}

/// Stated recommendation and how it relates to the valuation gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCheck {
    /// Recommendation as stated (normalized to lowercase)
    pub recommendation: String,
    /// `(fair_value - price) / price`, when both were available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    /// Whether the recommendation agrees in sign with the gap
    pub consistent: bool,
}

/// Output of the synthesis phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    id: RecordId,
    subject_id: SubjectId,
    as_of_date: NaiveDate,
    created_at: DateTime<Utc>,
    discovery: DiscoveryRef,
    analysis_id: RecordId,
    values: BTreeMap<String, SurfacedValue>,
    provenance: BTreeMap<String, ProvenanceRef>,
    exclusions: Vec<Exclusion>,
    review_flags: Vec<ReviewFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<RecommendationCheck>,
    synthesis_confidence: f64,
    needs_review: bool,
}

/// Parts of a finding, assembled by the composer
#[derive(Debug, Clone)]
pub struct FindingParts {
    /// Discovery record the finding was built from
    pub discovery: DiscoveryRef,
    /// Analysis record the finding was built from
    pub analysis_id: RecordId,
    /// Surfaced values with their provenance
    pub values: BTreeMap<String, (SurfacedValue, ProvenanceRef)>,
    /// Excluded categories
    pub exclusions: Vec<Exclusion>,
    /// Review flags carried forward or raised during synthesis
    pub review_flags: Vec<ReviewFlag>,
    /// Recommendation consistency result
    pub recommendation: Option<RecommendationCheck>,
    /// Top-level confidence
    pub synthesis_confidence: f64,
}

impl Finding {
    /// Assemble a finding; every value is stored together with its provenance
    pub fn new(parts: FindingParts) -> Self {
        let mut values = BTreeMap::new();
        let mut provenance = BTreeMap::new();
        for (name, (value, source)) in parts.values {
            values.insert(name.clone(), value);
            provenance.insert(name, source);
        }

        let needs_review = !parts.review_flags.is_empty()
            || parts
                .recommendation
                .as_ref()
                .is_some_and(|r| !r.consistent);

        Self {
            id: RecordId::new(),
            subject_id: parts.discovery.subject_id.clone(),
            as_of_date: parts.discovery.as_of_date,
            created_at: Utc::now(),
            discovery: parts.discovery,
            analysis_id: parts.analysis_id,
            values,
            provenance,
            exclusions: parts.exclusions,
            review_flags: parts.review_flags,
            recommendation: parts.recommendation,
            synthesis_confidence: clamp_unit(parts.synthesis_confidence),
            needs_review,
        }
    }

    /// Finding id
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Subject
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// As-of date
    pub fn as_of_date(&self) -> NaiveDate {
        self.as_of_date
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Discovery record reference
    pub fn discovery(&self) -> &DiscoveryRef {
        &self.discovery
    }

    /// Analysis record id
    pub fn analysis_id(&self) -> RecordId {
        self.analysis_id
    }

    /// Surfaced values
    pub fn values(&self) -> &BTreeMap<String, SurfacedValue> {
        &self.values
    }

    /// One surfaced value
    pub fn value(&self, name: &str) -> Option<&SurfacedValue> {
        self.values.get(name)
    }

    /// Provenance for every surfaced value
    pub fn provenance(&self) -> &BTreeMap<String, ProvenanceRef> {
        &self.provenance
    }

    /// Excluded analysis categories
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Review flags
    pub fn review_flags(&self) -> &[ReviewFlag] {
        &self.review_flags
    }

    /// Recommendation consistency, if a recommendation was stated
    pub fn recommendation(&self) -> Option<&RecommendationCheck> {
        self.recommendation.as_ref()
    }

    /// Top-level synthesis confidence
    pub fn synthesis_confidence(&self) -> f64 {
        self.synthesis_confidence
    }

    /// Whether anything in the finding is flagged for review
    pub fn needs_review(&self) -> bool {
        self.needs_review
    }

    /// Values present without a provenance entry
    pub fn orphan_values(&self) -> Vec<&str> {
        self.values
            .keys()
            .filter(|name| !self.provenance.contains_key(*name))
            .map(String::as_str)
            .collect()
    }
}
