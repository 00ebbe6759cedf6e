//! Finding composition

use crate::{SynthesisConfig, SynthesisError};
use dasv_domain::propagation::combine;
use dasv_domain::{
    AnalysisRecord, DiscoveryRecord, Exclusion, FieldValue, Finding, FindingParts, Origin,
    ProvenanceRef, RecommendationCheck, ReviewFlag, ReviewKind, SurfacedValue,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Stated direction of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Some(Recommendation::Buy),
            "hold" => Some(Recommendation::Hold),
            "sell" => Some(Recommendation::Sell),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "buy",
            Recommendation::Hold => "hold",
            Recommendation::Sell => "sell",
        }
    }

    /// Whether the recommendation agrees in sign with the valuation gap
    fn agrees_with(&self, gap: f64, band: f64) -> bool {
        match self {
            Recommendation::Buy => gap >= -band,
            Recommendation::Sell => gap <= band,
            Recommendation::Hold => true,
        }
    }
}

type Surfaced = BTreeMap<String, (SurfacedValue, ProvenanceRef)>;

/// Merges a discovery record and its analysis into a finding
pub struct Composer {
    config: SynthesisConfig,
}

impl Composer {
    /// Create a composer
    ///
    /// # Errors
    /// Returns [`SynthesisError::Config`] if the configuration is invalid
    pub fn new(config: SynthesisConfig) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Config)?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Compose a finding
    ///
    /// Each surfaced name resolves to the computed analysis metric first, then
    /// the reconciled discovery field, and is omitted otherwise. Nothing is
    /// defaulted.
    ///
    /// # Errors
    /// Returns [`SynthesisError::RecordMismatch`] if `analysis` was not
    /// computed from `discovery`
    pub fn compose(
        &self,
        discovery: &DiscoveryRecord,
        analysis: &AnalysisRecord,
    ) -> Result<Finding, SynthesisError> {
        if !discovery.is_referenced_by(analysis.discovery()) {
            return Err(SynthesisError::RecordMismatch {
                discovery: discovery.id(),
                referenced: analysis.discovery().record_id,
            });
        }

        let values = self.surface(discovery, analysis);

        let exclusions: Vec<Exclusion> = analysis
            .categories()
            .values()
            .filter_map(|c| {
                c.status.exclusion_reason().map(|reason| Exclusion {
                    category: c.kind,
                    reason,
                })
            })
            .collect();

        let mut review_flags = discovery.review_flags().to_vec();
        let recommendation = self.check_recommendation(&values);
        let mut penalty = 0.0;
        if let Some(check) = recommendation.as_ref().filter(|c| !c.consistent) {
            let reason = format!(
                "recommendation '{}' contradicts valuation gap {:+.2}%",
                check.recommendation,
                check.gap.unwrap_or_default() * 100.0
            );
            warn!(subject = %discovery.subject_id(), reason = %reason, "Consistency violation");
            review_flags.push(ReviewFlag::new(
                self.config.recommendation_field.clone(),
                ReviewKind::ConsistencyViolation,
                reason,
            ));
            penalty = self.config.structural_mismatch_penalty;
        }

        let synthesis_confidence = combine(
            &[discovery.overall_confidence(), analysis.overall_confidence()],
            penalty,
        );

        let finding = Finding::new(FindingParts {
            discovery: discovery.reference(),
            analysis_id: analysis.id(),
            values,
            exclusions,
            review_flags,
            recommendation,
            synthesis_confidence,
        });

        info!(
            subject = %finding.subject_id(),
            values = finding.values().len(),
            exclusions = finding.exclusions().len(),
            synthesis_confidence = finding.synthesis_confidence(),
            needs_review = finding.needs_review(),
            "Finding composed"
        );
        Ok(finding)
    }

    fn surface(&self, discovery: &DiscoveryRecord, analysis: &AnalysisRecord) -> Surfaced {
        let mut values = Surfaced::new();

        for (path, metric) in analysis.computed_metrics() {
            if !self.config.surfaces(&path) {
                continue;
            }
            let provenance = ProvenanceRef {
                origin: Origin::Analysis,
                record_id: analysis.id(),
                field: path.clone(),
            };
            let value = SurfacedValue {
                value: FieldValue::Number(metric.value),
                confidence: metric.confidence,
            };
            values.insert(path, (value, provenance));
        }

        for (name, field) in discovery.fields() {
            if values.contains_key(name) || !self.config.surfaces(name) {
                continue;
            }
            let provenance = ProvenanceRef {
                origin: Origin::Discovery,
                record_id: discovery.id(),
                field: name.clone(),
            };
            let value = SurfacedValue {
                value: field.value.clone(),
                confidence: field.confidence,
            };
            values.insert(name.clone(), (value, provenance));
        }

        if let Some(allowed) = &self.config.surfaced_fields {
            for name in allowed.iter().filter(|n| !n.ends_with(".*")) {
                if !values.contains_key(name) {
                    debug!(field = %name, "Requested value unavailable; omitted");
                }
            }
        }
        values
    }

    fn check_recommendation(&self, values: &Surfaced) -> Option<RecommendationCheck> {
        let number = |name: &str| values.get(name).and_then(|(v, _)| v.value.as_number());

        let stated = values
            .get(&self.config.recommendation_field)?
            .0
            .value
            .as_text()?;
        let Some(recommendation) = Recommendation::parse(stated) else {
            debug!(recommendation = %stated, "Unrecognized recommendation; not checked");
            return None;
        };

        let gap = match (
            number(&self.config.price_field),
            number(&self.config.fair_value_field),
        ) {
            (Some(price), Some(fair_value)) if price != 0.0 => Some((fair_value - price) / price),
            _ => None,
        };
        let consistent = gap.map_or(true, |g| recommendation.agrees_with(g, self.config.neutral_band));

        Some(RecommendationCheck {
            recommendation: recommendation.as_str().to_string(),
            gap,
            consistent,
        })
    }
}

/// Surfaced values whose provenance does not resolve
///
/// A value is an orphan when it has no provenance entry, or when the entry
/// names a record other than the two given, or a field or computed metric
/// that does not exist there.
pub fn verify_provenance(
    finding: &Finding,
    discovery: &DiscoveryRecord,
    analysis: &AnalysisRecord,
) -> Vec<String> {
    finding
        .values()
        .keys()
        .filter(|name| {
            let Some(source) = finding.provenance().get(*name) else {
                return true;
            };
            let resolves = match source.origin {
                Origin::Discovery => {
                    source.record_id == discovery.id() && discovery.field(&source.field).is_some()
                }
                Origin::Analysis => {
                    source.record_id == analysis.id() && analysis.metric(&source.field).is_some()
                }
            };
            !resolves
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dasv_domain::{
        Agreement, CategoryKind, CategoryResult, CategoryStatus, EventSet, Metric, RecordId,
        ReconciledField, SubjectId,
    };

    fn discovery(fields: &[(&str, FieldValue, f64)]) -> DiscoveryRecord {
        let fields = fields
            .iter()
            .map(|(name, value, c)| {
                (name.to_string(), ReconciledField::new(value.clone(), *c, "a", Agreement::SingleSource))
            })
            .collect();
        DiscoveryRecord::new(
            SubjectId::new("AAPL").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            fields,
            EventSet::default(),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    fn analysis(discovery: &DiscoveryRecord, categories: Vec<CategoryResult>) -> AnalysisRecord {
        AnalysisRecord::new(
            discovery.reference(),
            discovery.overall_confidence(),
            categories,
            None,
            None,
        )
        .unwrap()
    }

    fn composer() -> Composer {
        Composer::new(SynthesisConfig::default()).unwrap()
    }

    fn priced(recommendation: &str, fair_value: f64) -> DiscoveryRecord {
        discovery(&[
            ("price", 100.0.into(), 0.95),
            ("fair_value", fair_value.into(), 0.95),
            ("recommendation", recommendation.into(), 0.95),
        ])
    }

    #[test]
    fn test_insufficient_category_lowers_synthesis_confidence() {
        let disc = discovery(&[("price", 100.0.into(), 0.95)]);
        let excluded = CategoryResult::excluded(
            CategoryKind::ClosedPerformance,
            CategoryStatus::InsufficientSample { observed: 3, required: 5 },
            None,
        );
        let anal = analysis(&disc, vec![excluded]);
        let finding = composer().compose(&disc, &anal).unwrap();

        assert!((anal.overall_confidence() - 0.57).abs() < 1e-9);
        assert!((finding.synthesis_confidence() - 0.57).abs() < 1e-9);
        assert_eq!(finding.exclusions().len(), 1);
        assert!(finding.exclusions()[0].reason.contains("3"));
        assert!(finding.value("closed_performance.win_rate").is_none());
    }

    #[test]
    fn test_analysis_metric_takes_precedence() {
        let disc = discovery(&[("price", 100.0.into(), 0.95)]);
        let growth = CategoryResult::computed(
            CategoryKind::Growth,
            vec![Metric::new("volume", 0.04, 0.9, vec!["growth.volume".to_string()])],
            None,
        );
        let anal = analysis(&disc, vec![growth]);
        let finding = composer().compose(&disc, &anal).unwrap();

        let source = &finding.provenance()["growth.volume"];
        assert_eq!(source.origin, Origin::Analysis);
        assert_eq!(source.record_id, anal.id());
        assert_eq!(finding.provenance()["price"].origin, Origin::Discovery);
        assert!(verify_provenance(&finding, &disc, &anal).is_empty());
    }

    #[test]
    fn test_consistent_recommendation() {
        let disc = priced("Buy", 120.0);
        let finding = composer().compose(&disc, &analysis(&disc, Vec::new())).unwrap();
        let check = finding.recommendation().unwrap();
        assert!(check.consistent);
        assert_eq!(check.recommendation, "buy");
        assert!((check.gap.unwrap() - 0.2).abs() < 1e-12);
        assert!(!finding.needs_review());
    }

    #[test]
    fn test_contradictory_recommendation_is_flagged_and_penalized() {
        let disc = priced("buy", 80.0);
        let anal = analysis(&disc, Vec::new());
        let finding = composer().compose(&disc, &anal).unwrap();

        assert!(!finding.recommendation().unwrap().consistent);
        assert!(finding.needs_review());
        assert!(finding
            .review_flags()
            .iter()
            .any(|f| f.kind == ReviewKind::ConsistencyViolation));
        // 0.95 × (1 - 0.25)
        assert!((finding.synthesis_confidence() - 0.7125).abs() < 1e-9);
    }

    #[test]
    fn test_gap_inside_neutral_band_accepted() {
        let disc = priced("sell", 101.0);
        let finding = composer().compose(&disc, &analysis(&disc, Vec::new())).unwrap();
        assert!(finding.recommendation().unwrap().consistent);
    }

    #[test]
    fn test_record_mismatch() {
        let disc = discovery(&[("price", 100.0.into(), 0.95)]);
        let other = discovery(&[("price", 100.0.into(), 0.95)]);
        let anal = analysis(&other, Vec::new());
        let err = composer().compose(&disc, &anal).unwrap_err();
        assert!(matches!(err, SynthesisError::RecordMismatch { .. }));
    }

    #[test]
    fn test_allow_list_omits_rather_than_defaults() {
        let disc = discovery(&[("price", 100.0.into(), 0.95), ("volume", 5e6.into(), 0.9)]);
        let composer = Composer::new(SynthesisConfig {
            surfaced_fields: Some(vec!["price".to_string(), "fair_value".to_string()]),
            ..SynthesisConfig::default()
        })
        .unwrap();
        let finding = composer.compose(&disc, &analysis(&disc, Vec::new())).unwrap();
        assert_eq!(finding.values().len(), 1);
        assert!(finding.value("fair_value").is_none());
    }

    #[test]
    fn test_verify_provenance_reports_orphans() {
        let disc = discovery(&[("price", 100.0.into(), 0.95)]);
        let anal = analysis(&disc, Vec::new());

        let mut values = BTreeMap::new();
        values.insert(
            "ghost".to_string(),
            (
                SurfacedValue { value: 1.0.into(), confidence: 0.9 },
                ProvenanceRef {
                    origin: Origin::Discovery,
                    record_id: disc.id(),
                    field: "ghost".to_string(),
                },
            ),
        );
        values.insert(
            "price".to_string(),
            (
                SurfacedValue { value: 100.0.into(), confidence: 0.95 },
                ProvenanceRef {
                    origin: Origin::Discovery,
                    record_id: RecordId::new(),
                    field: "price".to_string(),
                },
            ),
        );
        let finding = Finding::new(FindingParts {
            discovery: disc.reference(),
            analysis_id: anal.id(),
            values,
            exclusions: Vec::new(),
            review_flags: Vec::new(),
            recommendation: None,
            synthesis_confidence: 0.9,
        });

        assert_eq!(
            verify_provenance(&finding, &disc, &anal),
            vec!["ghost".to_string(), "price".to_string()]
        );
    }
}
