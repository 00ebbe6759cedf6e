//! Deterministic in-memory adapter for tests

use crate::{AdapterError, AdapterResponse, SourceAdapter, SubjectData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dasv_domain::{AdapterHealth, Event, FieldRequest, FieldValue, SubjectId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock adapter returning pre-configured data without any I/O
///
/// # Examples
///
/// ```
/// use dasv_adapters::{MockAdapter, SourceAdapter};
/// use dasv_domain::{AdapterHealth, SubjectId};
///
/// let subject = SubjectId::new("MSFT").unwrap();
/// let adapter = MockAdapter::new("fundamentals", 0.9)
///     .with_field(&subject, "fair_value", 420.0)
///     .with_health(AdapterHealth::Degraded);
///
/// assert_eq!(adapter.name(), "fundamentals");
/// assert_eq!(adapter.health(), AdapterHealth::Degraded);
/// assert_eq!(adapter.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: String,
    reliability: f64,
    health: AdapterHealth,
    subjects: HashMap<SubjectId, SubjectData>,
    observed_at: Option<DateTime<Utc>>,
    delay: Option<Duration>,
    error: Option<String>,
    call_count: Arc<AtomicUsize>,
}

impl MockAdapter {
    /// Create a healthy adapter with no data
    pub fn new(name: impl Into<String>, reliability: f64) -> Self {
        Self {
            name: name.into(),
            reliability: reliability.clamp(0.0, 1.0),
            health: AdapterHealth::Healthy,
            subjects: HashMap::new(),
            observed_at: None,
            delay: None,
            error: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a field value for a subject
    pub fn with_field(
        mut self,
        subject: &SubjectId,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.subjects
            .entry(subject.clone())
            .or_default()
            .fields
            .insert(field.into(), value.into());
        self
    }

    /// Add repeated events for a subject
    pub fn with_events(mut self, subject: &SubjectId, events: impl IntoIterator<Item = Event>) -> Self {
        self.subjects
            .entry(subject.clone())
            .or_default()
            .events
            .extend(events);
        self
    }

    /// Report the given health
    pub fn with_health(mut self, health: AdapterHealth) -> Self {
        self.health = health;
        self
    }

    /// Stamp every observation with a fixed time instead of the fetch time
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every fetch with the given reason
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.error = Some(reason.into());
        self
    }

    /// Number of times `fetch` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }

    fn health(&self) -> AdapterHealth {
        self.health
    }

    async fn fetch(
        &self,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> Result<AdapterResponse, AdapterError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.error {
            return Err(AdapterError::unavailable(&self.name, reason.clone()));
        }
        if self.health == AdapterHealth::Unavailable {
            return Err(AdapterError::unavailable(&self.name, "adapter reports unavailable"));
        }

        let observed_at = self.observed_at.unwrap_or_else(Utc::now);
        Ok(self
            .subjects
            .get(subject)
            .map(|data| data.respond(&self.name, fields, observed_at, self.reliability))
            .unwrap_or_default())
    }
}
