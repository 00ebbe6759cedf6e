//! DASV Gatekeeper
//!
//! Certifies findings for publication. The gate runs a fixed checklist of
//! independent re-derivations, each yielding `pass`, `flag` (non-blocking)
//! or `fail` (blocking):
//!
//! - `required_fields`: required values are surfaced
//! - `disclosures`: required disclosures are surfaced
//! - `provenance`: every value resolves to its source
//! - `recommendation_consistency`: the stated recommendation agrees with the
//!   re-derived valuation gap
//! - `statistical_significance`: surfaced sample counts meet the minimums
//! - `price_consistency`: the price re-fetched from a re-check source matches
//! - `synthesis_confidence`: the finding's confidence meets the threshold
//!
//! A finding is certified only with zero failures and an aggregate
//! reliability at or above the threshold. Validation never mutates the
//! finding; resubmission takes a fresh one.
//!
//! # Examples
//!
//! ```no_run
//! use dasv_gatekeeper::{Gatekeeper, ValidationConfig};
//! # async fn run(finding: &dasv_domain::Finding) -> Result<(), dasv_gatekeeper::GatekeeperError> {
//! let gatekeeper = Gatekeeper::new(ValidationConfig::institutional())?;
//! let verdict = gatekeeper.validate(finding, None).await?;
//! for reason in verdict.rejection_reasons() {
//!     println!("{}", reason);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod run;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use run::ValidationRun;
pub use validator::{Evidence, Gatekeeper};
