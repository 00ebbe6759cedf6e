//! DASV Domain Layer
//!
//! Core data model and confidence algebra for the Discover → Analyze →
//! Synthesize → Validate pipeline. Every other crate in the workspace depends
//! on the types defined here.
//!
//! ## Key Concepts
//!
//! - **Observation**: one value reported by one source adapter, with a confidence
//! - **DiscoveryRecord**: reconciled fields for one subject and as-of date
//! - **AnalysisRecord**: derived metrics per category, each with a confidence
//! - **Finding**: merged snapshot where every value traces back to one upstream field
//! - **ValidationVerdict**: gate result; certified only with no failing check
//!
//! ## Confidence
//!
//! Confidence is a scalar in [0, 1] propagated conservatively: a derived
//! value is never more confident than its weakest input
//! (see [`propagation::combine`]).
//!
//! ## Immutability
//!
//! Records are built once through their constructors and expose read-only
//! accessors. A correction is a new record.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod discovery;
pub mod error;
pub mod event;
pub mod finding;
pub mod health;
pub mod observation;
pub mod propagation;
pub mod record_id;
pub mod review;
pub mod risk;
pub mod sample;
pub mod scenario;
pub mod subject;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use analysis::{
    AnalysisRecord, CategoryKind, CategoryResult, CategoryState, CategoryStatus, Headline,
    HeadlineValue, Metric,
};
pub use discovery::{Agreement, DiscoveryRecord, DiscoveryRef, ReconciledField};
pub use error::DomainError;
pub use event::{Event, EventSet, EventStatus};
pub use finding::{
    Exclusion, Finding, FindingParts, Origin, ProvenanceRef, RecommendationCheck, SurfacedValue,
};
pub use health::{AdapterHealth, SourceStatus};
pub use observation::{FieldKind, FieldRequest, FieldValue, Observation};
pub use record_id::RecordId;
pub use review::{ReviewFlag, ReviewKind};
pub use risk::{Impact, RiskMatrix, RiskMatrixEntry};
pub use sample::{SampleAdequacy, SampleMinimums};
pub use scenario::{Scenario, ScenarioSet, SCENARIO_SUM_TOLERANCE};
pub use subject::SubjectId;
pub use traits::{Document, Renderer};
pub use verdict::{CheckOutcome, CheckResult, ValidationDepth, ValidationState, ValidationVerdict};
