//! DASV Pipeline
//!
//! Orchestrates Discovery → Analysis → Synthesis → Validation. Within one
//! subject the phases run strictly in sequence; across subjects a bounded
//! worker pool runs pipelines concurrently, and one subject's failure never
//! aborts its siblings.
//!
//! # Run status
//!
//! | Status | Exit code | Meaning |
//! |--------|-----------|---------|
//! | `success_certified` | 0 | every subject certified |
//! | `success_rejected` | 1 | ran to completion, at least one rejected |
//! | `partial_failure` | 2 | at least one subject could not complete |
//! | `config_error` | 3 | invalid threshold or sample configuration |
//!
//! # Examples
//!
//! ```no_run
//! use dasv_adapters::{MockAdapter, SourceAdapter};
//! use dasv_domain::SubjectId;
//! use dasv_pipeline::{InvocationConfig, Pipeline, PipelineConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), dasv_pipeline::PipelineError> {
//! let config = PipelineConfig::from_invocation(InvocationConfig::default())?;
//! let subject = SubjectId::new("AAPL").map_err(|e| dasv_pipeline::PipelineError::Config(e.to_string()))?;
//! let adapters: Vec<Arc<dyn SourceAdapter>> =
//!     vec![Arc::new(MockAdapter::new("quotes", 0.95).with_field(&subject, "price", 100.0))];
//!
//! let pipeline = Pipeline::new(config, adapters)?;
//! let as_of = chrono::Utc::now().date_naive();
//! let batch = pipeline.run_batch(&[subject], as_of, &CancellationToken::new()).await;
//! std::process::exit(batch.status().exit_code());
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod pipeline;
mod status;

pub use config::{InvocationConfig, PipelineConfig};
pub use error::PipelineError;
pub use metrics::PipelineMetrics;
pub use pipeline::{BatchReport, Pipeline, SubjectFailure, SubjectReport};
pub use status::RunStatus;
