//! DASV Analysis Engine
//!
//! Derives statistics from a discovery record. Every category moves through
//! `pending → computing → {computed | insufficient_sample | error}`, and only
//! computed categories feed headline figures. Excluded categories stay in the
//! record with their reason.
//!
//! # Categories
//!
//! - `closed_performance`: win rate, average return, drawdown over closed events
//! - `open_exposure`: unrealized statistics over open events
//! - `growth`: `growth.<component>` decomposition with residual
//! - `risk_matrix`: `risk.<category>.{probability,impact}` entries
//! - `scenarios`: `scenario.<name>.{probability,outcome}` partition
//!
//! # Examples
//!
//! ```no_run
//! use dasv_analysis::{AnalysisConfig, AnalysisEngine};
//! # fn run(discovery: &dasv_domain::DiscoveryRecord) -> Result<(), dasv_analysis::AnalysisError> {
//! let engine = AnalysisEngine::new(AnalysisConfig::default())?;
//! let analysis = engine.analyze(discovery)?;
//! if let Some(win_rate) = &analysis.headline().win_rate {
//!     println!("win rate {:.1}% (confidence {:.2})", win_rate.value * 100.0, win_rate.confidence);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
pub mod growth;
pub mod performance;
pub mod plan;
pub mod risk;
pub mod scenarios;

pub use config::AnalysisConfig;
pub use engine::{AnalysisEngine, Outcome};
pub use error::AnalysisError;
pub use plan::AnalysisPlan;
