//! Discovery Aggregator
//!
//! Fans out to every adapter concurrently, waits for each one up to the
//! configured timeout, and reconciles whatever subset answered into a single
//! immutable [`DiscoveryRecord`].

use crate::reconcile::reconcile_field;
use crate::{DiscoveryConfig, DiscoveryError, SampleValidator};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use dasv_adapters::{AdapterError, AdapterResponse, SourceAdapter};
use dasv_domain::propagation::combine;
use dasv_domain::{
    AdapterHealth, DiscoveryRecord, Event, EventSet, FieldRequest, Observation, ReviewFlag,
    ReviewKind, SourceStatus, SubjectId,
};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why an adapter contributed nothing
#[derive(Debug)]
enum AdapterFailure {
    ReportedUnavailable,
    Timeout(u64),
    Error(AdapterError),
}

impl AdapterFailure {
    fn reason(&self) -> String {
        match self {
            AdapterFailure::ReportedUnavailable => "adapter reports unavailable".to_string(),
            AdapterFailure::Timeout(ms) => format!("timeout after {} ms", ms),
            AdapterFailure::Error(e) => e.to_string(),
        }
    }
}

struct AdapterOutcome {
    name: String,
    health: AdapterHealth,
    result: Result<AdapterResponse, AdapterFailure>,
}

/// Collects and reconciles observations for one subject
pub struct DiscoveryAggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    config: DiscoveryConfig,
    validator: SampleValidator,
}

impl DiscoveryAggregator {
    /// Create an aggregator
    ///
    /// # Errors
    /// - [`DiscoveryError::NoAdapters`] if `adapters` is empty
    /// - [`DiscoveryError::Config`] if the configuration is invalid
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        config: DiscoveryConfig,
        validator: SampleValidator,
    ) -> Result<Self, DiscoveryError> {
        if adapters.is_empty() {
            return Err(DiscoveryError::NoAdapters);
        }
        config.validate().map_err(DiscoveryError::Config)?;
        Ok(Self {
            adapters,
            config,
            validator,
        })
    }

    /// Configured adapters
    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Active configuration
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Sample validator used to classify events
    pub fn validator(&self) -> &SampleValidator {
        &self.validator
    }

    /// Run discovery for one subject
    ///
    /// Adapter failures and timeouts degrade confidence and are recorded in
    /// the record's source health; they never abort the run.
    ///
    /// # Errors
    /// - [`DiscoveryError::Cancelled`] if `cancel` fires before every adapter answered
    /// - [`DiscoveryError::AllSourcesUnavailable`] if no adapter returned any data
    pub async fn discover(
        &self,
        subject: &SubjectId,
        as_of: NaiveDate,
        fields: &[FieldRequest],
        cancel: &CancellationToken,
    ) -> Result<DiscoveryRecord, DiscoveryError> {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled(subject.to_string()));
        }

        info!(
            subject = %subject,
            adapters = self.adapters.len(),
            fields = fields.len(),
            "Starting discovery fan-out"
        );

        let calls = self.adapters.iter().map(|adapter| self.call(adapter, subject, fields));
        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(subject = %subject, "Discovery cancelled; discarding partial results");
                return Err(DiscoveryError::Cancelled(subject.to_string()));
            }
            outcomes = join_all(calls) => outcomes,
        };

        self.assemble(subject, as_of, fields, outcomes)
    }

    async fn call(
        &self,
        adapter: &Arc<dyn SourceAdapter>,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> AdapterOutcome {
        let name = adapter.name().to_string();
        let health = adapter.health();
        if health == AdapterHealth::Unavailable {
            return AdapterOutcome {
                name,
                health,
                result: Err(AdapterFailure::ReportedUnavailable),
            };
        }

        let result = match timeout(self.config.adapter_timeout(), adapter.fetch(subject, fields)).await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(AdapterFailure::Error(e)),
            Err(_) => Err(AdapterFailure::Timeout(self.config.adapter_timeout_ms)),
        };
        AdapterOutcome {
            name,
            health,
            result,
        }
    }

    fn assemble(
        &self,
        subject: &SubjectId,
        as_of: NaiveDate,
        fields: &[FieldRequest],
        outcomes: Vec<AdapterOutcome>,
    ) -> Result<DiscoveryRecord, DiscoveryError> {
        let cutoff = staleness_cutoff(as_of, self.config.max_staleness_hours);

        let mut source_health = BTreeMap::new();
        let mut review_flags = Vec::new();
        let mut by_field: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        let mut events: Vec<Event> = Vec::new();
        let mut failures = Vec::new();
        let mut contributed = 0usize;

        for outcome in outcomes {
            let response = match outcome.result {
                Ok(response) => response,
                Err(failure) => {
                    let reason = failure.reason();
                    warn!(subject = %subject, adapter = %outcome.name, reason = %reason, "Adapter unavailable");
                    review_flags.push(ReviewFlag::new(
                        outcome.name.clone(),
                        ReviewKind::SourceUnavailable,
                        reason.clone(),
                    ));
                    failures.push(format!("{}: {}", outcome.name, reason));
                    source_health.insert(
                        outcome.name,
                        SourceStatus::with_reason(AdapterHealth::Unavailable, reason),
                    );
                    continue;
                }
            };

            let degraded = outcome.health == AdapterHealth::Degraded;
            let status = if degraded {
                review_flags.push(ReviewFlag::new(
                    outcome.name.clone(),
                    ReviewKind::DegradedSource,
                    format!(
                        "observations discounted by {:.0}%",
                        self.config.degraded_penalty * 100.0
                    ),
                ));
                SourceStatus::with_reason(AdapterHealth::Degraded, "adapter reports degraded")
            } else {
                SourceStatus::healthy()
            };
            source_health.insert(outcome.name.clone(), status);

            if response.is_empty() {
                debug!(subject = %subject, adapter = %outcome.name, "Adapter returned no data");
                review_flags.push(ReviewFlag::new(
                    outcome.name.clone(),
                    ReviewKind::SourceUnavailable,
                    "no data for subject",
                ));
                failures.push(format!("{}: no data", outcome.name));
                continue;
            }
            contributed += 1;

            for observation in response.observations {
                if !fields.iter().any(|f| f.matches(observation.field())) {
                    continue;
                }
                let observation = self.hygiene(observation, degraded, cutoff, &mut review_flags);
                by_field
                    .entry(observation.field().to_string())
                    .or_default()
                    .push(observation);
            }
            events.extend(response.events);
        }

        if contributed == 0 {
            return Err(DiscoveryError::AllSourcesUnavailable {
                subject: subject.to_string(),
                reasons: failures.join("; "),
            });
        }

        let adapter_count = self.adapters.len();
        let mut reconciled = BTreeMap::new();
        for (name, observations) in &by_field {
            let Some(kind) = fields.iter().find(|f| f.matches(name)).map(|f| f.kind) else {
                continue;
            };
            let tolerance = self.config.tolerance_for(kind);
            if let Some(result) = reconcile_field(name, kind, observations, adapter_count, tolerance) {
                if let Some(flag) = result.flag {
                    warn!(subject = %subject, field = %name, reason = %flag.reason, "Field disagreement");
                    review_flags.push(flag);
                }
                reconciled.insert(name.clone(), result.field);
            }
        }

        for (id, statuses) in EventSet::status_conflicts(&events) {
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            warn!(subject = %subject, event = %id, statuses = ?statuses, "Conflicting event status");
            review_flags.push(ReviewFlag::new(
                id,
                ReviewKind::EventConflict,
                format!("reported as {}; first report kept", statuses.join(" and ")),
            ));
        }
        let events = self.validator.partition(events);
        let record = DiscoveryRecord::new(
            subject.clone(),
            as_of,
            reconciled,
            events,
            source_health,
            review_flags,
        );

        info!(
            subject = %subject,
            fields = record.fields().len(),
            closed = record.count(dasv_domain::EventStatus::Closed),
            open = record.count(dasv_domain::EventStatus::Open),
            overall_confidence = record.overall_confidence(),
            flags = record.review_flags().len(),
            "Discovery complete"
        );
        Ok(record)
    }

    /// Discount stale observations and observations from degraded adapters
    fn hygiene(
        &self,
        observation: Observation,
        degraded: bool,
        cutoff: Option<DateTime<Utc>>,
        review_flags: &mut Vec<ReviewFlag>,
    ) -> Observation {
        let mut confidence = observation.confidence();
        if cutoff.is_some_and(|cutoff| observation.observed_at() < cutoff) {
            confidence = combine(&[confidence], self.config.staleness_penalty);
            review_flags.push(ReviewFlag::new(
                observation.field(),
                ReviewKind::StaleObservation,
                format!(
                    "{} observed at {} is older than {} h",
                    observation.source(),
                    observation.observed_at().format("%Y-%m-%d %H:%M UTC"),
                    self.config.max_staleness_hours
                ),
            ));
        }
        if degraded {
            confidence = combine(&[confidence], self.config.degraded_penalty);
        }
        if confidence == observation.confidence() {
            observation
        } else {
            observation.with_confidence(confidence)
        }
    }
}

/// Oldest acceptable observation time; `None` disables the staleness check
fn staleness_cutoff(as_of: NaiveDate, max_staleness_hours: u64) -> Option<DateTime<Utc>> {
    let window = i64::try_from(max_staleness_hours).ok().and_then(TimeDelta::try_hours)?;
    date_start(as_of)
        .checked_add_signed(TimeDelta::days(1))?
        .checked_sub_signed(window)
}

fn date_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dasv_adapters::MockAdapter;
    use dasv_domain::{Agreement, EventStatus, FieldKind, FieldValue};
    use std::time::Duration;

    fn subject() -> SubjectId {
        SubjectId::new("AAPL").unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    fn fresh() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 16, 0, 0).unwrap()
    }

    fn price() -> Vec<FieldRequest> {
        vec![FieldRequest::new("price", FieldKind::PriceLike)]
    }

    fn aggregator(adapters: Vec<MockAdapter>, config: DiscoveryConfig) -> DiscoveryAggregator {
        let adapters: Vec<Arc<dyn SourceAdapter>> = adapters
            .into_iter()
            .map(|a| Arc::new(a) as Arc<dyn SourceAdapter>)
            .collect();
        DiscoveryAggregator::new(adapters, config, SampleValidator::default()).unwrap()
    }

    #[tokio::test]
    async fn test_two_adapters_agree() {
        let a = MockAdapter::new("a", 0.95).with_field(&subject(), "price", 100.0).observed_at(fresh());
        let b = MockAdapter::new("b", 0.9).with_field(&subject(), "price", 101.0).observed_at(fresh());
        let agg = aggregator(vec![a, b], DiscoveryConfig::default());

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();

        let field = record.field("price").unwrap();
        assert_eq!(field.value, FieldValue::Number(100.0));
        assert_eq!(field.source, "a");
        assert!((field.confidence - 0.95).abs() < 1e-12);
        assert!(record.review_flags().is_empty());
        assert!((record.overall_confidence() - 0.95).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_timeout_marks_unavailable_and_continues() {
        let a = MockAdapter::new("a", 0.95).with_field(&subject(), "price", 100.0).observed_at(fresh());
        let slow = MockAdapter::new("slow", 0.9)
            .with_field(&subject(), "price", 100.0)
            .with_delay(Duration::from_secs(10));
        let config = DiscoveryConfig {
            adapter_timeout_ms: 50,
            ..DiscoveryConfig::default()
        };
        let agg = aggregator(vec![a, slow], config);

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();

        let status = &record.source_health()["slow"];
        assert_eq!(status.health, AdapterHealth::Unavailable);
        assert!(status.reason.as_deref().unwrap().contains("timeout"));
        // Only one adapter answered: single-source discount
        let field = record.field("price").unwrap();
        assert_eq!(field.agreement, Agreement::SingleSource);
        assert!((field.confidence - 0.855).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_failed_adapter_is_recorded_not_fatal() {
        let a = MockAdapter::new("a", 0.95).with_field(&subject(), "price", 100.0).observed_at(fresh());
        let broken = MockAdapter::new("broken", 0.9).failing("HTTP 503");
        let agg = aggregator(vec![a, broken], DiscoveryConfig::default());

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!record.source_health()["broken"].contributed());
        assert!(record
            .review_flags()
            .iter()
            .any(|f| f.kind == ReviewKind::SourceUnavailable && f.reason.contains("HTTP 503")));
    }

    #[tokio::test]
    async fn test_all_sources_unavailable() {
        let a = MockAdapter::new("a", 0.95).failing("down");
        let b = MockAdapter::new("b", 0.9).with_health(AdapterHealth::Unavailable);
        let agg = aggregator(vec![a, b.clone()], DiscoveryConfig::default());

        let result = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(DiscoveryError::AllSourcesUnavailable { .. })));
        // A self-reported unavailable adapter is not called
        assert_eq!(b.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_discards_partial_run() {
        let fast = MockAdapter::new("fast", 0.95).with_field(&subject(), "price", 100.0);
        let slow = MockAdapter::new("slow", 0.9)
            .with_field(&subject(), "price", 100.0)
            .with_delay(Duration::from_secs(10));
        let agg = aggregator(vec![fast, slow], DiscoveryConfig::default());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = agg.discover(&subject(), as_of(), &price(), &cancel).await;

        assert!(matches!(result, Err(DiscoveryError::Cancelled(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stale_and_degraded_observations_discounted() {
        let stale_at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let stale = MockAdapter::new("stale", 1.0)
            .with_field(&subject(), "price", 100.0)
            .observed_at(stale_at);
        let agg = aggregator(vec![stale], DiscoveryConfig::default());
        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();
        // 1.0 × 0.8 staleness, then × 0.9 single source
        assert!((record.field("price").unwrap().confidence - 0.72).abs() < 1e-12);
        assert!(record.review_flags().iter().any(|f| f.kind == ReviewKind::StaleObservation));

        let degraded = MockAdapter::new("deg", 1.0)
            .with_field(&subject(), "price", 100.0)
            .observed_at(fresh())
            .with_health(AdapterHealth::Degraded);
        let agg = aggregator(vec![degraded], DiscoveryConfig::default());
        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();
        assert!((record.field("price").unwrap().confidence - 0.81).abs() < 1e-12);
        assert_eq!(record.source_health()["deg"].health, AdapterHealth::Degraded);
    }

    #[tokio::test]
    async fn test_unrequested_fields_ignored() {
        let a = MockAdapter::new("a", 0.9)
            .with_field(&subject(), "price", 100.0)
            .with_field(&subject(), "volume", 5.0)
            .observed_at(fresh());
        let agg = aggregator(vec![a], DiscoveryConfig::default());
        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(record.field("volume").is_none());
    }

    #[tokio::test]
    async fn test_empty_response_flagged_unavailable() {
        let a = MockAdapter::new("a", 0.95).with_field(&subject(), "price", 100.0).observed_at(fresh());
        let empty = MockAdapter::new("empty", 0.9);
        let agg = aggregator(vec![a, empty], DiscoveryConfig::default());

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();

        let flag = record
            .review_flags()
            .iter()
            .find(|f| f.subject == "empty")
            .unwrap();
        assert_eq!(flag.kind, ReviewKind::SourceUnavailable);
        assert_eq!(flag.reason, "no data for subject");
    }

    #[tokio::test]
    async fn test_conflicting_event_status_flagged() {
        let opened = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let closed = Event {
            id: "t1".to_string(),
            status: EventStatus::Closed,
            return_pct: 0.02,
            opened_at: opened,
            closed_at: Some(opened + TimeDelta::days(2)),
            source: "a".to_string(),
        };
        let open = Event {
            status: EventStatus::Open,
            closed_at: None,
            source: "b".to_string(),
            ..closed.clone()
        };
        let a = MockAdapter::new("a", 0.95)
            .with_field(&subject(), "price", 100.0)
            .with_events(&subject(), vec![closed])
            .observed_at(fresh());
        let b = MockAdapter::new("b", 0.9)
            .with_field(&subject(), "price", 100.0)
            .with_events(&subject(), vec![open])
            .observed_at(fresh());
        let agg = aggregator(vec![a, b], DiscoveryConfig::default());

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();

        let flag = record
            .review_flags()
            .iter()
            .find(|f| f.kind == ReviewKind::EventConflict)
            .unwrap();
        assert_eq!(flag.subject, "t1");
        assert!(flag.reason.contains("closed and open"));
        assert_eq!(record.count(EventStatus::Closed) + record.count(EventStatus::Open), 1);
    }

    #[test]
    fn test_staleness_cutoff_saturates_to_none() {
        let cutoff = staleness_cutoff(as_of(), 72).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap());
        assert!(staleness_cutoff(as_of(), 10_000_000_000).is_none());
        assert!(staleness_cutoff(as_of(), u64::MAX).is_none());
    }

    #[tokio::test]
    async fn test_widest_staleness_window_discovers() {
        let config = DiscoveryConfig {
            max_staleness_hours: crate::MAX_STALENESS_HOURS,
            ..DiscoveryConfig::default()
        };
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let a = MockAdapter::new("a", 0.95).with_field(&subject(), "price", 100.0).observed_at(old);
        let agg = aggregator(vec![a], config);

        let record = agg
            .discover(&subject(), as_of(), &price(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(record.review_flags().iter().all(|f| f.kind != ReviewKind::StaleObservation));
    }

    #[test]
    fn test_new_rejects_empty_and_invalid() {
        assert!(matches!(
            DiscoveryAggregator::new(Vec::new(), DiscoveryConfig::default(), SampleValidator::default()),
            Err(DiscoveryError::NoAdapters)
        ));
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(MockAdapter::new("a", 0.9))];
        let config = DiscoveryConfig {
            adapter_timeout_ms: 0,
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            DiscoveryAggregator::new(adapters, config, SampleValidator::default()),
            Err(DiscoveryError::Config(_))
        ));
    }
}
