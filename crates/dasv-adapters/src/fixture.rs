//! Adapters backed by a JSON fixture file
//!
//! A fixture describes several adapters at once:
//!
//! ```json
//! {
//!   "adapters": [
//!     {
//!       "name": "quotes",
//!       "reliability": 0.95,
//!       "subjects": {
//!         "AAPL": { "fields": { "price": 100.0, "recommendation": "buy" } }
//!       }
//!     }
//!   ],
//!   "rate_limit": { "capacity": 10, "refill_per_sec": 2.0 }
//! }
//! ```
//!
//! When `rate_limit` is present every adapter draws on one shared bucket.

use crate::rate_limit::{RateLimitConfig, RateLimited};
use crate::{AdapterError, AdapterResponse, SourceAdapter, SubjectData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dasv_domain::{AdapterHealth, FieldRequest, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn default_health() -> AdapterHealth {
    AdapterHealth::Healthy
}

/// One adapter as described in a fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterFixture {
    /// Adapter name
    pub name: String,
    /// Reliability in [0, 1]
    pub reliability: f64,
    /// Reported health
    #[serde(default = "default_health")]
    pub health: AdapterHealth,
    /// Timestamp for every observation; the fetch time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
    /// Data per subject
    #[serde(default)]
    pub subjects: BTreeMap<SubjectId, SubjectData>,
}

/// A parsed fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Adapters in the fixture
    pub adapters: Vec<AdapterFixture>,
    /// Provider budget shared by every adapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Fixture {
    /// Parse and validate a fixture from JSON text
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Read, parse and validate a fixture file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading adapter fixture");
        let text = std::fs::read_to_string(path)
            .map_err(|e| AdapterError::Fixture(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Check adapter names are unique and reliabilities lie in [0, 1]
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.adapters.is_empty() {
            return Err(AdapterError::Fixture("fixture defines no adapters".to_string()));
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate().map_err(AdapterError::Fixture)?;
        }
        let mut seen = HashSet::new();
        for adapter in &self.adapters {
            if !seen.insert(adapter.name.as_str()) {
                return Err(AdapterError::Fixture(format!(
                    "duplicate adapter name '{}'",
                    adapter.name
                )));
            }
            if !(0.0..=1.0).contains(&adapter.reliability) {
                return Err(AdapterError::Fixture(format!(
                    "adapter '{}' reliability {} is outside [0.0, 1.0]",
                    adapter.name, adapter.reliability
                )));
            }
        }
        Ok(())
    }

    /// Every subject any adapter knows about
    pub fn subjects(&self) -> BTreeSet<SubjectId> {
        self.adapters
            .iter()
            .flat_map(|a| a.subjects.keys().cloned())
            .collect()
    }

    /// Build one adapter per fixture entry, behind the shared rate limit if any
    pub fn into_adapters(self) -> Vec<Arc<dyn SourceAdapter>> {
        let limiter = self.rate_limit.map(|config| {
            debug!(
                capacity = config.capacity,
                refill_per_sec = config.refill_per_sec,
                "Sharing rate limit across fixture adapters"
            );
            config.build()
        });
        self.adapters
            .into_iter()
            .map(FixtureAdapter::new)
            .map(|adapter| match &limiter {
                Some(limiter) => {
                    Arc::new(RateLimited::new(adapter, limiter.clone())) as Arc<dyn SourceAdapter>
                }
                None => Arc::new(adapter) as Arc<dyn SourceAdapter>,
            })
            .collect()
    }
}

/// Adapter serving data from a fixture entry
#[derive(Debug, Clone)]
pub struct FixtureAdapter {
    fixture: AdapterFixture,
}

impl FixtureAdapter {
    /// Wrap a fixture entry
    pub fn new(fixture: AdapterFixture) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    fn name(&self) -> &str {
        &self.fixture.name
    }

    fn reliability(&self) -> f64 {
        self.fixture.reliability
    }

    fn health(&self) -> AdapterHealth {
        self.fixture.health
    }

    async fn fetch(
        &self,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> Result<AdapterResponse, AdapterError> {
        if self.fixture.health == AdapterHealth::Unavailable {
            return Err(AdapterError::unavailable(
                &self.fixture.name,
                "fixture marks adapter unavailable",
            ));
        }
        let observed_at = self.fixture.observed_at.unwrap_or_else(Utc::now);
        Ok(self
            .fixture
            .subjects
            .get(subject)
            .map(|data| {
                data.respond(&self.fixture.name, fields, observed_at, self.fixture.reliability)
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dasv_domain::FieldKind;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "adapters": [
            {
                "name": "quotes",
                "reliability": 0.95,
                "subjects": {
                    "aapl": {
                        "fields": { "price": 100.0, "recommendation": "buy" },
                        "events": [
                            { "id": "t1", "status": "closed", "return_pct": 0.04,
                              "opened_at": "2025-01-02T00:00:00Z",
                              "closed_at": "2025-01-10T00:00:00Z" }
                        ]
                    }
                }
            },
            { "name": "backup", "reliability": 0.9, "health": "degraded" }
        ]
    }"#;

    #[tokio::test]
    async fn test_fixture_adapter_serves_fields() {
        let adapters = Fixture::from_json(FIXTURE).unwrap().into_adapters();
        let quotes = &adapters[0];
        let subject = SubjectId::new("AAPL").unwrap();
        let fields = [
            FieldRequest::new("price", FieldKind::PriceLike),
            FieldRequest::new("recommendation", FieldKind::Categorical),
        ];

        let response = quotes.fetch(&subject, &fields).await.unwrap();
        assert_eq!(response.observations.len(), 2);
        assert_eq!(response.events.len(), 1);
        assert_eq!(response.events[0].source, "quotes");
        assert_eq!(adapters[1].health(), AdapterHealth::Degraded);
    }

    #[test]
    fn test_fixture_subjects_normalized() {
        let fixture = Fixture::from_json(FIXTURE).unwrap();
        let subjects: Vec<String> = fixture.subjects().iter().map(|s| s.to_string()).collect();
        assert_eq!(subjects, vec!["AAPL"]);
    }

    #[test]
    fn test_fixture_rejects_duplicates_and_bad_reliability() {
        let dup = r#"{"adapters": [{"name": "a", "reliability": 0.9}, {"name": "a", "reliability": 0.8}]}"#;
        assert!(Fixture::from_json(dup).is_err());

        let bad = r#"{"adapters": [{"name": "a", "reliability": 1.5}]}"#;
        assert!(Fixture::from_json(bad).is_err());

        assert!(Fixture::from_json(r#"{"adapters": []}"#).is_err());
    }

    #[tokio::test]
    async fn test_fixture_rate_limit_shared_by_adapters() {
        let json = r#"{
            "adapters": [
                { "name": "a", "reliability": 0.9,
                  "subjects": { "AAPL": { "fields": { "price": 100.0 } } } },
                { "name": "b", "reliability": 0.8,
                  "subjects": { "AAPL": { "fields": { "price": 100.5 } } } }
            ],
            "rate_limit": { "capacity": 1, "refill_per_sec": 0.0 }
        }"#;
        let adapters = Fixture::from_json(json).unwrap().into_adapters();
        let subject = SubjectId::new("AAPL").unwrap();
        let fields = [FieldRequest::new("price", FieldKind::PriceLike)];

        assert!(adapters[0].fetch(&subject, &fields).await.is_ok());
        assert!(matches!(
            adapters[1].fetch(&subject, &fields).await,
            Err(AdapterError::RateLimited(name)) if name == "b"
        ));
        assert_eq!(adapters[1].name(), "b");
    }

    #[test]
    fn test_fixture_rejects_bad_rate_limit() {
        let json = r#"{
            "adapters": [{ "name": "a", "reliability": 0.9 }],
            "rate_limit": { "capacity": 0, "refill_per_sec": 1.0 }
        }"#;
        assert!(Fixture::from_json(json).is_err());
    }

    #[test]
    fn test_fixture_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let fixture = Fixture::load(file.path()).unwrap();
        assert_eq!(fixture.adapters.len(), 2);

        assert!(Fixture::load("/nonexistent/fixture.json").is_err());
    }
}
