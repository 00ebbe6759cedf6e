//! Finding validation logic

use crate::{GatekeeperError, ValidationConfig, ValidationRun};
use dasv_adapters::SourceAdapter;
use dasv_domain::{
    AnalysisRecord, CategoryKind, CheckOutcome, CheckResult, DiscoveryRecord, FieldKind,
    FieldRequest, Finding, Origin, ValidationDepth, ValidationVerdict,
};
use dasv_synthesizer::verify_provenance;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upstream records a finding was composed from
///
/// When supplied, provenance is resolved against the records themselves
/// instead of only against the ids the finding carries.
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    /// Discovery record
    pub discovery: &'a DiscoveryRecord,
    /// Analysis record
    pub analysis: &'a AnalysisRecord,
}

/// The Gatekeeper certifies findings for publication
pub struct Gatekeeper {
    config: ValidationConfig,
    recheck: Option<Arc<dyn SourceAdapter>>,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    ///
    /// # Errors
    /// Returns [`GatekeeperError::Config`] if the configuration is invalid
    pub fn new(config: ValidationConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self {
            config,
            recheck: None,
        })
    }

    /// Create a Gatekeeper with the standard configuration
    pub fn default_config() -> Self {
        Self {
            config: ValidationConfig::default(),
            recheck: None,
        }
    }

    /// Re-fetch prices through this adapter
    pub fn with_recheck(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.recheck = Some(adapter);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a finding against the checklist
    ///
    /// Every check runs at every depth; depth only tunes severity. The
    /// aggregate reliability is `min(synthesis_confidence, (passes +
    /// flag_weight × flags) / checks)`.
    ///
    /// # Errors
    /// Returns [`GatekeeperError::EvidenceMismatch`] if `evidence` does not
    /// belong to the finding
    pub async fn validate(
        &self,
        finding: &Finding,
        evidence: Option<Evidence<'_>>,
    ) -> Result<ValidationVerdict, GatekeeperError> {
        if let Some(evidence) = evidence {
            Self::check_evidence(finding, evidence)?;
        }

        let mut run = ValidationRun::new(finding);
        run.begin()?;
        debug!(subject = %finding.subject_id(), depth = %self.config.depth, "Validation started");

        let checks = vec![
            self.check_required_fields(finding),
            self.check_disclosures(finding),
            self.check_provenance(finding, evidence),
            self.check_recommendation(finding),
            self.check_significance(finding),
            self.check_price(finding).await,
            self.check_synthesis_confidence(finding),
        ];

        for check in &checks {
            match check.result {
                CheckResult::Fail => {
                    warn!(subject = %finding.subject_id(), check = %check.name, reason = %check.reason, "Check failed")
                }
                CheckResult::Flag => {
                    debug!(subject = %finding.subject_id(), check = %check.name, reason = %check.reason, "Check flagged")
                }
                CheckResult::Pass => {}
            }
        }

        let aggregate = self.aggregate_reliability(finding, &checks);
        let verdict = ValidationVerdict::new(
            finding.id(),
            checks,
            aggregate,
            self.config.confidence_threshold,
        );
        let state = run.conclude(&verdict)?;

        info!(
            subject = %finding.subject_id(),
            state = state.as_str(),
            aggregate_reliability = verdict.aggregate_reliability(),
            threshold = verdict.threshold(),
            fails = verdict.count(CheckResult::Fail),
            flags = verdict.count(CheckResult::Flag),
            "Validation complete"
        );
        Ok(verdict)
    }

    fn aggregate_reliability(&self, finding: &Finding, checks: &[CheckOutcome]) -> f64 {
        if checks.is_empty() {
            return 0.0;
        }
        let passes = checks.iter().filter(|c| c.result == CheckResult::Pass).count() as f64;
        let flags = checks.iter().filter(|c| c.result == CheckResult::Flag).count() as f64;
        let score = (passes + self.config.flag_weight * flags) / checks.len() as f64;
        finding.synthesis_confidence().min(score)
    }

    fn check_evidence(finding: &Finding, evidence: Evidence<'_>) -> Result<(), GatekeeperError> {
        if !evidence.discovery.is_referenced_by(finding.discovery()) {
            return Err(GatekeeperError::EvidenceMismatch(format!(
                "discovery record {} is not the one finding {} was composed from",
                evidence.discovery.id(),
                finding.id()
            )));
        }
        if evidence.analysis.id() != finding.analysis_id() {
            return Err(GatekeeperError::EvidenceMismatch(format!(
                "analysis record {} is not the one finding {} was composed from",
                evidence.analysis.id(),
                finding.id()
            )));
        }
        Ok(())
    }

    fn check_required_fields(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "required_fields";
        let missing: Vec<&str> = self
            .config
            .required_fields
            .iter()
            .filter(|name| finding.value(name).is_none())
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            CheckOutcome::pass(
                NAME,
                format!("{} required field(s) present", self.config.required_fields.len()),
            )
        } else {
            CheckOutcome::fail(NAME, format!("missing required field(s): {}", missing.join(", ")))
        }
    }

    fn check_disclosures(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "disclosures";
        let missing: Vec<&str> = self
            .config
            .required_disclosures
            .iter()
            .filter(|name| {
                finding
                    .value(name)
                    .map_or(true, |v| v.value.as_text().is_some_and(|t| t.trim().is_empty()))
            })
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            return CheckOutcome::pass(
                NAME,
                format!("{} required disclosure(s) present", self.config.required_disclosures.len()),
            );
        }
        let reason = format!("missing disclosure(s): {}", missing.join(", "));
        match self.config.depth {
            ValidationDepth::Institutional => CheckOutcome::fail(NAME, reason),
            _ => CheckOutcome::flag(NAME, reason),
        }
    }

    fn check_provenance(&self, finding: &Finding, evidence: Option<Evidence<'_>>) -> CheckOutcome {
        const NAME: &str = "provenance";
        let mut orphans: BTreeSet<String> = finding
            .orphan_values()
            .into_iter()
            .map(str::to_string)
            .collect();

        for (name, source) in finding.provenance() {
            let expected = match source.origin {
                Origin::Discovery => finding.discovery().record_id,
                Origin::Analysis => finding.analysis_id(),
            };
            if source.record_id != expected {
                orphans.insert(name.clone());
            }
        }
        if let Some(evidence) = evidence {
            orphans.extend(verify_provenance(finding, evidence.discovery, evidence.analysis));
        }

        if orphans.is_empty() {
            CheckOutcome::pass(NAME, format!("all {} value(s) resolve to a source", finding.values().len()))
        } else {
            let names: Vec<&str> = orphans.iter().map(String::as_str).collect();
            CheckOutcome::fail(NAME, format!("unresolved provenance: {}", names.join(", ")))
        }
    }

    /// Re-derives the valuation gap from the surfaced values
    fn check_recommendation(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "recommendation_consistency";
        let number = |name: &str| finding.value(name).and_then(|v| v.value.as_number());

        let Some(stated) = finding
            .value(&self.config.recommendation_field)
            .and_then(|v| v.value.as_text())
        else {
            return CheckOutcome::pass(NAME, "no recommendation stated");
        };
        let direction = stated.trim().to_lowercase();
        if !matches!(direction.as_str(), "buy" | "hold" | "sell") {
            return CheckOutcome::flag(NAME, format!("unrecognized recommendation '{}'", stated));
        }

        let (Some(price), Some(fair_value)) = (
            number(&self.config.price_field),
            number(&self.config.fair_value_field),
        ) else {
            return CheckOutcome::flag(
                NAME,
                format!("recommendation '{}' stated without price and fair value", direction),
            );
        };
        if price == 0.0 {
            return CheckOutcome::flag(NAME, "price is zero; valuation gap undefined");
        }

        let gap = (fair_value - price) / price;
        let band = self.config.neutral_band;
        let consistent = match direction.as_str() {
            "buy" => gap >= -band,
            "sell" => gap <= band,
            _ => true,
        };
        if !consistent {
            return CheckOutcome::fail(
                NAME,
                format!("recommendation '{}' contradicts valuation gap {:+.2}%", direction, gap * 100.0),
            );
        }
        if finding.recommendation().is_some_and(|c| !c.consistent) {
            return CheckOutcome::flag(
                NAME,
                "synthesis marked the recommendation inconsistent; re-derivation disagrees",
            );
        }
        CheckOutcome::pass(
            NAME,
            format!("recommendation '{}' agrees with valuation gap {:+.2}%", direction, gap * 100.0),
        )
    }

    /// Re-checks surfaced sample counts against the minimums
    fn check_significance(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "statistical_significance";
        let minimums = self.config.sample_minimums;
        let counts: Vec<(String, usize)> = [
            (CategoryKind::ClosedPerformance, "trade_count"),
            (CategoryKind::OpenExposure, "open_count"),
        ]
        .into_iter()
        .filter_map(|(kind, metric)| {
            let path = format!("{}.{}", kind, metric);
            let n = finding.value(&path)?.value.as_number()?;
            Some((path, n.max(0.0) as usize))
        })
        .collect();

        if counts.is_empty() {
            return CheckOutcome::pass(NAME, "no sample-based statistics surfaced");
        }

        let below: Vec<String> = counts
            .iter()
            .filter(|(_, n)| *n < minimums.basic)
            .map(|(path, n)| format!("{} = {}", path, n))
            .collect();
        if !below.is_empty() {
            return CheckOutcome::fail(
                NAME,
                format!(
                    "statistics computed below the basic minimum of {}: {}",
                    minimums.basic,
                    below.join(", ")
                ),
            );
        }

        let basic_only: Vec<String> = counts
            .iter()
            .filter(|(_, n)| *n < minimums.significant)
            .map(|(path, n)| format!("{} = {}", path, n))
            .collect();
        if basic_only.is_empty() {
            return CheckOutcome::pass(
                NAME,
                format!("all samples meet the significance minimum of {}", minimums.significant),
            );
        }
        let reason = format!(
            "below the significance minimum of {}: {}",
            minimums.significant,
            basic_only.join(", ")
        );
        match self.config.depth {
            ValidationDepth::Standard => CheckOutcome::pass(NAME, reason),
            _ => CheckOutcome::flag(NAME, reason),
        }
    }

    /// Re-fetches the price and compares it to the surfaced one
    async fn check_price(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "price_consistency";
        let field = &self.config.price_field;

        let Some(adapter) = &self.recheck else {
            return CheckOutcome::flag(NAME, "no re-check source configured");
        };
        let Some(stated) = finding.value(field).and_then(|v| v.value.as_number()) else {
            return CheckOutcome::flag(NAME, format!("finding has no numeric '{}'", field));
        };

        let request = [FieldRequest::new(field.clone(), FieldKind::PriceLike)];
        let response = match tokio::time::timeout(
            self.config.recheck_timeout(),
            adapter.fetch(finding.subject_id(), &request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return CheckOutcome::flag(NAME, format!("re-check via {} failed: {}", adapter.name(), e))
            }
            Err(_) => {
                return CheckOutcome::flag(
                    NAME,
                    format!(
                        "re-check via {} timed out after {} ms",
                        adapter.name(),
                        self.config.recheck_timeout_ms
                    ),
                )
            }
        };

        let Some(refetched) = response
            .observations
            .iter()
            .filter(|o| o.field() == field.as_str())
            .filter_map(|o| o.value().as_number())
            .last()
        else {
            return CheckOutcome::flag(NAME, format!("{} returned no '{}'", adapter.name(), field));
        };

        let difference = if stated == 0.0 {
            if refetched == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            (refetched - stated).abs() / stated.abs()
        };
        let reason = format!(
            "stated {} vs re-fetched {} from {} ({:.2}% apart, tolerance {:.2}%)",
            stated,
            refetched,
            adapter.name(),
            difference * 100.0,
            self.config.price_tolerance * 100.0
        );
        if difference <= self.config.price_tolerance {
            CheckOutcome::pass(NAME, reason)
        } else {
            CheckOutcome::fail(NAME, reason)
        }
    }

    fn check_synthesis_confidence(&self, finding: &Finding) -> CheckOutcome {
        const NAME: &str = "synthesis_confidence";
        let confidence = finding.synthesis_confidence();
        let threshold = self.config.confidence_threshold;
        if confidence >= threshold {
            CheckOutcome::pass(
                NAME,
                format!("synthesis confidence {:.3} meets threshold {:.3}", confidence, threshold),
            )
        } else {
            CheckOutcome::fail(
                NAME,
                format!("low synthesis confidence {:.3} below threshold {:.3}", confidence, threshold),
            )
        }
    }
}
