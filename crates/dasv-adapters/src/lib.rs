//! DASV Source Adapter Layer
//!
//! Each adapter wraps one external data provider and reports observations
//! with a per-field confidence and a timestamp.
//!
//! # Adapters
//!
//! - `MockAdapter`: Deterministic adapter for testing
//! - `FixtureAdapter`: Adapter backed by a JSON fixture file
//! - `RateLimited`: Wraps any adapter behind a shared token bucket
//!
//! # Examples
//!
//! ```
//! use dasv_adapters::{MockAdapter, SourceAdapter};
//! use dasv_domain::{FieldKind, FieldRequest, SubjectId};
//!
//! # tokio_test_block(async {
//! let subject = SubjectId::new("AAPL").unwrap();
//! let adapter = MockAdapter::new("quotes", 0.95).with_field(&subject, "price", 100.0);
//!
//! let fields = [FieldRequest::new("price", FieldKind::PriceLike)];
//! let response = adapter.fetch(&subject, &fields).await.unwrap();
//! assert_eq!(response.observations.len(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

mod error;
pub mod fixture;
pub mod mock;
pub mod rate_limit;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dasv_domain::{AdapterHealth, Event, FieldRequest, FieldValue, Observation, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use error::AdapterError;
pub use fixture::{Fixture, FixtureAdapter};
pub use mock::MockAdapter;
pub use rate_limit::{RateLimitConfig, RateLimited, RateLimiter};

/// What one adapter returned for one subject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterResponse {
    /// Field observations
    pub observations: Vec<Observation>,
    /// Repeated events (e.g. trades), classified by the aggregator
    pub events: Vec<Event>,
}

impl AdapterResponse {
    /// Whether the adapter returned nothing at all
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty() && self.events.is_empty()
    }
}

/// Contract for one external data provider
///
/// Implementations report their own health independently of individual
/// field failures: a degraded adapter may still return some fields.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique adapter name
    fn name(&self) -> &str;

    /// Reliability estimate in [0, 1]
    fn reliability(&self) -> f64;

    /// Current operational status
    fn health(&self) -> AdapterHealth;

    /// Fetch the requested fields for one subject
    async fn fetch(
        &self,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> Result<AdapterResponse, AdapterError>;
}

#[async_trait]
impl<A: SourceAdapter + ?Sized> SourceAdapter for Arc<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reliability(&self) -> f64 {
        (**self).reliability()
    }

    fn health(&self) -> AdapterHealth {
        (**self).health()
    }

    async fn fetch(
        &self,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> Result<AdapterResponse, AdapterError> {
        (**self).fetch(subject, fields).await
    }
}

/// Data an in-memory adapter holds for one subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectData {
    /// Field values by name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Repeated events
    #[serde(default)]
    pub events: Vec<Event>,
}

impl SubjectData {
    /// Build the response for a field request, stamping every observation
    pub(crate) fn respond(
        &self,
        adapter: &str,
        fields: &[FieldRequest],
        observed_at: DateTime<Utc>,
        confidence: f64,
    ) -> AdapterResponse {
        let observations = self
            .fields
            .iter()
            .filter(|(name, _)| fields.iter().any(|request| request.matches(name)))
            .map(|(name, value)| {
                Observation::new(name.clone(), value.clone(), adapter, observed_at, confidence)
            })
            .collect();

        let events = self
            .events
            .iter()
            .cloned()
            .map(|mut event| {
                if event.source.is_empty() {
                    event.source = adapter.to_string();
                }
                event
            })
            .collect();

        AdapterResponse {
            observations,
            events,
        }
    }
}
