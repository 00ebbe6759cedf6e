//! Categories below the sample minimum are excluded, at or above it they are computed

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dasv_analysis::{AnalysisConfig, AnalysisEngine};
use dasv_domain::{
    Agreement, CategoryKind, CategoryStatus, DiscoveryRecord, Event, EventSet, EventStatus,
    ReconciledField, SampleMinimums, SubjectId,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn discovery(closed: usize, open: usize) -> DiscoveryRecord {
    let base = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let event = |id: String, status: EventStatus, i: usize| Event {
        id,
        status,
        return_pct: if i % 3 == 0 { -0.02 } else { 0.03 },
        opened_at: base + Duration::hours(i as i64),
        closed_at: (status == EventStatus::Closed).then(|| base + Duration::hours(i as i64 + 1)),
        source: "trades".to_string(),
    };
    let events = (0..closed)
        .map(|i| event(format!("c{}", i), EventStatus::Closed, i))
        .chain((0..open).map(|i| event(format!("o{}", i), EventStatus::Open, i)));

    let mut fields = BTreeMap::new();
    fields.insert(
        "price".to_string(),
        ReconciledField::new(100.0.into(), 0.9, "quotes", Agreement::SingleSource),
    );
    DiscoveryRecord::new(
        SubjectId::new("SPY").unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        fields,
        EventSet::partition(events),
        BTreeMap::new(),
        Vec::new(),
    )
}

proptest! {
    /// Property: the closed category is computed iff its own count meets the basic minimum
    #[test]
    fn test_closed_category_gated_on_its_own_count(
        closed in 1usize..25,
        open in 0usize..25,
        basic in 1usize..10,
    ) {
        let config = AnalysisConfig {
            sample_minimums: SampleMinimums { basic, significant: basic + 10 },
            ..AnalysisConfig::default()
        };
        let engine = AnalysisEngine::new(config).unwrap();
        let record = engine.analyze(&discovery(closed, open)).unwrap();
        let category = record.category(CategoryKind::ClosedPerformance).unwrap();

        if closed >= basic {
            prop_assert!(category.status.is_computed());
            prop_assert!(record.headline().win_rate.is_some());
            let count = record.metric("closed_performance.trade_count").unwrap().value;
            // Never the merged count
            prop_assert_eq!(count, closed as f64);
        } else {
            prop_assert_eq!(
                &category.status,
                &CategoryStatus::InsufficientSample { observed: closed, required: basic }
            );
            prop_assert!(record.headline().win_rate.is_none());
        }
        prop_assert!((0.0..=1.0).contains(&record.overall_confidence()));
    }
}
