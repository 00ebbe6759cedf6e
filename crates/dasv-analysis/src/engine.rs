//! Core Analysis Engine implementation

use crate::plan::AnalysisPlan;
use crate::{growth, performance, risk, scenarios, AnalysisConfig, AnalysisError};
use dasv_discovery::SampleValidator;
use dasv_domain::{
    AnalysisRecord, CategoryKind, CategoryResult, CategoryState, DiscoveryRecord, Metric,
    RiskMatrix, SampleAdequacy, ScenarioSet,
};
use tracing::{debug, info, warn};

/// What a category computation produced, before it is recorded
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Metrics computed
    Computed {
        /// Derived metrics
        metrics: Vec<Metric>,
        /// Sample adequacy, for counted categories
        sample: Option<SampleAdequacy>,
    },
    /// Too few observations
    Insufficient {
        /// Observations available
        observed: usize,
        /// Minimum required
        required: usize,
    },
    /// Structurally invalid input
    Failed(String),
}

/// Computes derived statistics from a discovery record
///
/// The discovery record is only borrowed; the resulting analysis record
/// refers back to it by id, subject and as-of date.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    validator: SampleValidator,
}

impl AnalysisEngine {
    /// Create an engine
    ///
    /// # Errors
    /// Returns [`AnalysisError::Config`] if the configuration is invalid
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate().map_err(AnalysisError::Config)?;
        let validator = SampleValidator::new(config.sample_minimums)?;
        Ok(Self { config, validator })
    }

    /// Active configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every category whose inputs are present
    pub fn analyze(&self, discovery: &DiscoveryRecord) -> Result<AnalysisRecord, AnalysisError> {
        self.analyze_with_plan(discovery, &AnalysisPlan::infer(discovery))
    }

    /// Analyze exactly the planned categories
    ///
    /// Each category runs through `pending → computing → {computed |
    /// insufficient_sample | error}`. A failing category never aborts its
    /// siblings.
    pub fn analyze_with_plan(
        &self,
        discovery: &DiscoveryRecord,
        plan: &AnalysisPlan,
    ) -> Result<AnalysisRecord, AnalysisError> {
        info!(
            subject = %discovery.subject_id(),
            categories = plan.categories().count(),
            "Starting analysis"
        );

        let parent = discovery.overall_confidence();
        let mut results = Vec::new();
        let mut risk_matrix: Option<RiskMatrix> = None;
        let mut scenario_set: Option<ScenarioSet> = None;

        for kind in plan.categories() {
            let mut state = CategoryState::new(kind);
            state.begin()?;
            debug!(subject = %discovery.subject_id(), category = %kind, "Category computing");

            let outcome = match kind {
                CategoryKind::ClosedPerformance => performance::closed_performance(
                    discovery.events().closed(),
                    parent,
                    &self.validator,
                ),
                CategoryKind::OpenExposure => {
                    performance::open_exposure(discovery.events().open(), parent, &self.validator)
                }
                CategoryKind::Growth => growth::decompose(discovery),
                CategoryKind::RiskMatrix => {
                    let (outcome, matrix) = risk::analyze(discovery, self.config.risk_top_n);
                    risk_matrix = matrix;
                    outcome
                }
                CategoryKind::Scenarios => {
                    let (outcome, set) = scenarios::analyze(discovery, self.config.scenario_tolerance);
                    scenario_set = set;
                    outcome
                }
            };

            results.push(self.record_outcome(discovery, &mut state, outcome)?);
        }

        let record = AnalysisRecord::new(
            discovery.reference(),
            parent,
            results,
            risk_matrix,
            scenario_set,
        )?;

        info!(
            subject = %discovery.subject_id(),
            overall_confidence = record.overall_confidence(),
            "Analysis complete"
        );
        Ok(record)
    }

    fn record_outcome(
        &self,
        discovery: &DiscoveryRecord,
        state: &mut CategoryState,
        outcome: Outcome,
    ) -> Result<CategoryResult, AnalysisError> {
        let kind = state.kind();
        let subject = discovery.subject_id();
        let result = match outcome {
            Outcome::Computed { metrics, sample } => {
                state.complete()?;
                debug!(subject = %subject, category = %kind, metrics = metrics.len(), "Category computed");
                CategoryResult::computed(kind, metrics, sample)
            }
            Outcome::Insufficient { observed, required } => {
                state.insufficient(observed, required)?;
                info!(
                    subject = %subject,
                    category = %kind,
                    observed,
                    required,
                    "Insufficient sample; category excluded"
                );
                let sample = Some(SampleAdequacy::Insufficient { observed, required });
                CategoryResult::excluded(kind, state.status().clone(), sample)
            }
            Outcome::Failed(reason) => {
                warn!(subject = %subject, category = %kind, reason = %reason, "Category failed");
                state.fail(reason)?;
                CategoryResult::excluded(kind, state.status().clone(), None)
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use dasv_domain::{
        Agreement, CategoryStatus, Event, EventSet, EventStatus, FieldValue, ReconciledField,
        SampleMinimums, SubjectId,
    };
    use std::collections::BTreeMap;

    fn closed_events(n: usize) -> Vec<Event> {
        (0..n)
            .map(|i| Event {
                id: format!("c{}", i),
                status: EventStatus::Closed,
                return_pct: if i % 2 == 0 { 0.05 } else { -0.02 },
                opened_at: Utc::now(),
                closed_at: Some(Utc::now()),
                source: "a".to_string(),
            })
            .collect()
    }

    fn discovery(fields: &[(&str, FieldValue)], events: Vec<Event>) -> DiscoveryRecord {
        let mut map: BTreeMap<String, ReconciledField> = fields
            .iter()
            .map(|(name, value)| {
                (name.to_string(), ReconciledField::new(value.clone(), 0.95, "a", Agreement::SingleSource))
            })
            .collect();
        if map.is_empty() {
            map.insert(
                "price".to_string(),
                ReconciledField::new(100.0.into(), 0.95, "a", Agreement::SingleSource),
            );
        }
        DiscoveryRecord::new(
            SubjectId::new("AAPL").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            map,
            EventSet::partition(events),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_three_closed_events_insufficient() {
        let engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
        let record = engine.analyze(&discovery(&[], closed_events(3))).unwrap();

        let category = record.category(CategoryKind::ClosedPerformance).unwrap();
        assert_eq!(
            category.status,
            CategoryStatus::InsufficientSample { observed: 3, required: 5 }
        );
        assert!(record.headline().win_rate.is_none());
        // 0.95 × (1 - 0.4)
        assert!((record.overall_confidence() - 0.57).abs() < 1e-12);
    }

    #[test]
    fn test_adequate_sample_feeds_headline() {
        let engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
        let record = engine.analyze(&discovery(&[], closed_events(20))).unwrap();

        let win_rate = record.headline().win_rate.as_ref().unwrap();
        assert_eq!(win_rate.value, 0.5);
        assert_eq!(win_rate.confidence, 0.95);
        assert!(record.metric("closed_performance.trade_count").is_some());
    }

    #[test]
    fn test_bad_scenarios_do_not_abort_siblings() {
        let engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
        let record = engine
            .analyze(&discovery(
                &[
                    ("scenario.bear.probability", 0.3.into()),
                    ("scenario.bear.outcome", (-0.1).into()),
                    ("scenario.bull.probability", 0.5.into()),
                    ("scenario.bull.outcome", 0.2.into()),
                    ("growth.volume", 0.04.into()),
                ],
                Vec::new(),
            ))
            .unwrap();

        let scenarios = record.category(CategoryKind::Scenarios).unwrap();
        assert!(matches!(scenarios.status, CategoryStatus::Error { .. }));
        assert!(record.scenarios().is_none());
        assert!(record.headline().expected_outcome.is_none());
        assert!(record.category(CategoryKind::Growth).unwrap().status.is_computed());
        assert!((record.overall_confidence() - 0.95 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_plan_reports_missing_inputs() {
        let engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
        let record = engine
            .analyze_with_plan(&discovery(&[], Vec::new()), &AnalysisPlan::only([CategoryKind::RiskMatrix]))
            .unwrap();
        assert_eq!(
            record.category(CategoryKind::RiskMatrix).unwrap().status,
            CategoryStatus::InsufficientSample { observed: 0, required: 1 }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            sample_minimums: SampleMinimums { basic: 0, significant: 15 },
            ..AnalysisConfig::default()
        };
        assert!(matches!(AnalysisEngine::new(config), Err(AnalysisError::Config(_))));
    }
}
