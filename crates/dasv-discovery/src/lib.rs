//! DASV Discovery
//!
//! Collects observations for one subject from every configured source
//! adapter, reconciles them field by field, and classifies repeated events
//! into separate status categories.
//!
//! # Reconciliation
//!
//! | Situation | Field confidence |
//! |-----------|------------------|
//! | All adapters within tolerance | `min(1.0, 0.9 + 0.1 × agreeing / adapters)`, capped by the chosen adapter |
//! | Disagreement beyond tolerance | at most 0.5, flagged `needs_review` |
//! | Single adapter | reliability × 0.9 |
//!
//! # Examples
//!
//! ```no_run
//! use dasv_adapters::{MockAdapter, SourceAdapter};
//! use dasv_discovery::{DiscoveryAggregator, DiscoveryConfig, SampleValidator};
//! use dasv_domain::{FieldKind, FieldRequest, SubjectId};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let subject = SubjectId::new("AAPL")?;
//! let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
//!     Arc::new(MockAdapter::new("a", 0.95).with_field(&subject, "price", 100.0)),
//!     Arc::new(MockAdapter::new("b", 0.90).with_field(&subject, "price", 101.0)),
//! ];
//! let aggregator =
//!     DiscoveryAggregator::new(adapters, DiscoveryConfig::default(), SampleValidator::default())?;
//!
//! let fields = [FieldRequest::new("price", FieldKind::PriceLike)];
//! let as_of = chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
//! let record = aggregator
//!     .discover(&subject, as_of, &fields, &CancellationToken::new())
//!     .await?;
//! println!("price confidence: {:.2}", record.field("price").unwrap().confidence);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
pub mod reconcile;
mod sample;

pub use aggregator::DiscoveryAggregator;
pub use config::{DiscoveryConfig, MAX_STALENESS_HOURS};
pub use error::DiscoveryError;
pub use reconcile::{reconcile_field, Reconciliation};
pub use sample::SampleValidator;
