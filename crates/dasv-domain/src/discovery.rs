//! Discovery records: reconciled fields for one subject and as-of date

use crate::event::{EventSet, EventStatus};
use crate::health::SourceStatus;
use crate::observation::FieldValue;
use crate::propagation::{aggregate, clamp_unit};
use crate::review::ReviewFlag;
use crate::{RecordId, SubjectId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a reconciled value was arrived at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Agreement {
    /// Several adapters agree within tolerance
    Agreed {
        /// Adapters corroborating the chosen value (excluding the chosen one)
        agreeing: usize,
        /// Adapters configured for the run
        of: usize,
    },
    /// Adapters disagree beyond tolerance
    Disagreed {
        /// Relative spread (numeric) or number of distinct values (categorical)
        spread: f64,
    },
    /// Only one adapter reported the field
    SingleSource,
}

/// One field after reconciliation across adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledField {
    /// Chosen value
    pub value: FieldValue,
    /// Field confidence in [0, 1]
    pub confidence: f64,
    /// Adapter the value was taken from
    pub source: String,
    /// Reconciliation outcome
    pub agreement: Agreement,
    /// Whether the field is flagged for review
    pub needs_review: bool,
}

impl ReconciledField {
    /// Create a reconciled field; confidence is clamped into [0, 1]
    pub fn new(
        value: FieldValue,
        confidence: f64,
        source: impl Into<String>,
        agreement: Agreement,
    ) -> Self {
        let needs_review = matches!(agreement, Agreement::Disagreed { .. });
        Self {
            value,
            confidence: clamp_unit(confidence),
            source: source.into(),
            agreement,
            needs_review,
        }
    }
}

/// Reference from a downstream record back to its discovery record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRef {
    /// Discovery record id
    pub record_id: RecordId,
    /// Subject of the discovery
    pub subject_id: SubjectId,
    /// As-of date of the discovery
    pub as_of_date: NaiveDate,
}

/// Output of the discovery phase
///
/// Created once per discovery run and never mutated. A correction is a new
/// record with a new id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    id: RecordId,
    subject_id: SubjectId,
    as_of_date: NaiveDate,
    created_at: DateTime<Utc>,
    fields: BTreeMap<String, ReconciledField>,
    observation_counts: BTreeMap<String, usize>,
    events: EventSet,
    source_health: BTreeMap<String, SourceStatus>,
    overall_confidence: f64,
    review_flags: Vec<ReviewFlag>,
}

impl DiscoveryRecord {
    /// Build a discovery record
    ///
    /// Observation counts are derived from the event partition and the overall
    /// confidence is the unweighted aggregate of field confidences.
    pub fn new(
        subject_id: SubjectId,
        as_of_date: NaiveDate,
        fields: BTreeMap<String, ReconciledField>,
        events: EventSet,
        source_health: BTreeMap<String, SourceStatus>,
        review_flags: Vec<ReviewFlag>,
    ) -> Self {
        let observation_counts = [EventStatus::Closed, EventStatus::Open]
            .into_iter()
            .map(|status| (status.as_str().to_string(), events.of(status).len()))
            .collect();

        let field_confidences: BTreeMap<String, f64> = fields
            .iter()
            .map(|(name, f)| (name.clone(), f.confidence))
            .collect();
        let overall_confidence = aggregate(&field_confidences, None);

        Self {
            id: RecordId::new(),
            subject_id,
            as_of_date,
            created_at: Utc::now(),
            fields,
            observation_counts,
            events,
            source_health,
            overall_confidence,
            review_flags,
        }
    }

    /// Record id
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Subject analyzed
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

    /// Reconciled fields by name
    pub fn fields(&self) -> &BTreeMap<String, ReconciledField> {
        &self.fields
    }

    /// A single reconciled field
    pub fn field(&self, name: &str) -> Option<&ReconciledField> {
        self.fields.get(name)
    }

    /// Raw observation counts per event category
    pub fn observation_counts(&self) -> &BTreeMap<String, usize> {
        &self.observation_counts
    }

    /// Observation count for one event category
    pub fn count(&self, status: EventStatus) -> usize {
        self.observation_counts
            .get(status.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Underlying events, partitioned by category
    pub fn events(&self) -> &EventSet {
        &self.events
    }

    /// Per-adapter health for this run
    pub fn source_health(&self) -> &BTreeMap<String, SourceStatus> {
        &self.source_health
    }

    /// Aggregate of field confidences, for display only
    pub fn overall_confidence(&self) -> f64 {
        self.overall_confidence
    }

    /// Recoverable issues found during discovery
    pub fn review_flags(&self) -> &[ReviewFlag] {
        &self.review_flags
    }

    /// Reference for downstream records
    pub fn reference(&self) -> DiscoveryRef {
        DiscoveryRef {
            record_id: self.id,
            subject_id: self.subject_id.clone(),
            as_of_date: self.as_of_date,
        }
    }

    /// Whether a downstream reference points at this record
    pub fn is_referenced_by(&self, reference: &DiscoveryRef) -> bool {
        reference.record_id == self.id
            && reference.subject_id == self.subject_id
            && reference.as_of_date == self.as_of_date
    }
}
