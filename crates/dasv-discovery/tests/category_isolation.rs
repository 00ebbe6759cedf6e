//! Closed and open events are classified separately and never merged

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dasv_adapters::{MockAdapter, SourceAdapter};
use dasv_discovery::{DiscoveryAggregator, DiscoveryConfig, SampleValidator};
use dasv_domain::{Event, EventStatus, FieldKind, FieldRequest, SampleAdequacy, SubjectId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn events(prefix: &str, status: EventStatus, n: usize) -> Vec<Event> {
    let base = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| Event {
            id: format!("{}{}", prefix, i),
            status,
            return_pct: 0.01 * i as f64,
            opened_at: base + Duration::days(i as i64),
            closed_at: (status == EventStatus::Closed).then(|| base + Duration::days(i as i64 + 1)),
            source: String::new(),
        })
        .collect()
}

#[tokio::test]
async fn test_mixed_batch_counts_categories_separately() {
    let subject = SubjectId::new("TSLA").unwrap();
    let mut mixed = events("c", EventStatus::Closed, 4);
    mixed.extend(events("o", EventStatus::Open, 3));

    let trades = MockAdapter::new("trades", 0.95)
        .with_field(&subject, "price", 250.0)
        .with_events(&subject, mixed);
    // A second adapter repeating two of the same trades must not double count
    let mirror = MockAdapter::new("mirror", 0.9).with_events(&subject, events("c", EventStatus::Closed, 2));

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(trades), Arc::new(mirror)];
    let aggregator =
        DiscoveryAggregator::new(adapters, DiscoveryConfig::default(), SampleValidator::default()).unwrap();

    let record = aggregator
        .discover(
            &subject,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            &[FieldRequest::new("price", FieldKind::PriceLike)],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(record.count(EventStatus::Closed), 4);
    assert_eq!(record.count(EventStatus::Open), 3);
    assert_ne!(record.count(EventStatus::Closed), 7);
    assert!(record.events().closed().iter().all(|e| e.status == EventStatus::Closed));
    assert!(record.events().open().iter().all(|e| e.status == EventStatus::Open));

    let validator = aggregator.validator();
    assert_eq!(
        validator.assess_category(&record, EventStatus::Closed),
        SampleAdequacy::Insufficient { observed: 4, required: 5 }
    );
}
