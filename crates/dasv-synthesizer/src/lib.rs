//! DASV Synthesis Composer
//!
//! Merges a discovery record and the analysis computed from it into a
//! [`Finding`](dasv_domain::Finding). The merge is deterministic:
//!
//! 1. A computed analysis metric, surfaced as `category.metric`
//! 2. Otherwise the reconciled discovery field
//! 3. Otherwise nothing; values are never defaulted
//!
//! Every surfaced value carries a provenance reference back to the field or
//! metric it was copied from. Excluded analysis categories and discovery
//! review flags are carried into the finding with their reasons.
//!
//! A stated recommendation that contradicts the price / fair value gap is a
//! consistency violation: the finding is still produced, flagged for review,
//! and its confidence is penalized.
//!
//! # Examples
//!
//! ```no_run
//! use dasv_synthesizer::{verify_provenance, Composer, SynthesisConfig};
//! # fn run(
//! #     discovery: &dasv_domain::DiscoveryRecord,
//! #     analysis: &dasv_domain::AnalysisRecord,
//! # ) -> Result<(), dasv_synthesizer::SynthesisError> {
//! let composer = Composer::new(SynthesisConfig::default())?;
//! let finding = composer.compose(discovery, analysis)?;
//! assert!(verify_provenance(&finding, discovery, analysis).is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod composer;
mod config;
mod error;

pub use composer::{verify_provenance, Composer};
pub use config::SynthesisConfig;
pub use error::SynthesisError;
