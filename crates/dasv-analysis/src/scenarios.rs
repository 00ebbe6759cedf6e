//! Scenario analysis
//!
//! Scenarios come from `scenario.<name>.probability` and
//! `scenario.<name>.outcome` fields. A set whose probabilities miss 1.0 by
//! more than the tolerance fails closed; it is never renormalized.

use crate::engine::Outcome;
use crate::plan::SCENARIO_PREFIX;
use dasv_domain::propagation::combine;
use dasv_domain::{DiscoveryRecord, Metric, Scenario, ScenarioSet};
use std::collections::BTreeMap;

#[derive(Default)]
struct Parts {
    probability: Option<f64>,
    outcome: Option<f64>,
    inputs: Vec<String>,
    confidences: Vec<f64>,
}

/// Validate the scenario set and compute its expected outcome
pub fn analyze(record: &DiscoveryRecord, tolerance: f64) -> (Outcome, Option<ScenarioSet>) {
    let mut parts: BTreeMap<&str, Parts> = BTreeMap::new();
    for (name, field) in record.fields() {
        let Some(rest) = name.strip_prefix(SCENARIO_PREFIX) else {
            continue;
        };
        let Some(value) = field.value.as_number() else {
            return (
                Outcome::Failed(format!("scenario field '{}' is not numeric", name)),
                None,
            );
        };
        let (scenario, slot) = match rest.rsplit_once('.') {
            Some((scenario, "probability")) if !scenario.is_empty() => (scenario, true),
            Some((scenario, "outcome")) if !scenario.is_empty() => (scenario, false),
            _ => {
                return (
                    Outcome::Failed(format!("unrecognized scenario field '{}'", name)),
                    None,
                )
            }
        };
        let entry = parts.entry(scenario).or_default();
        if slot {
            entry.probability = Some(value);
        } else {
            entry.outcome = Some(value);
        }
        entry.inputs.push(name.clone());
        entry.confidences.push(field.confidence);
    }

    if parts.is_empty() {
        return (
            Outcome::Insufficient {
                observed: 0,
                required: 1,
            },
            None,
        );
    }

    let mut scenarios = Vec::with_capacity(parts.len());
    let mut inputs = Vec::new();
    let mut confidences = Vec::new();
    for (name, part) in parts {
        let (Some(probability), Some(outcome)) = (part.probability, part.outcome) else {
            return (
                Outcome::Failed(format!(
                    "scenario '{}' needs both a probability and an outcome",
                    name
                )),
                None,
            );
        };
        scenarios.push(Scenario {
            name: name.to_string(),
            probability,
            outcome,
        });
        inputs.extend(part.inputs);
        confidences.extend(part.confidences);
    }

    let set = match ScenarioSet::new(scenarios, tolerance) {
        Ok(set) => set,
        Err(e) => return (Outcome::Failed(e.to_string()), None),
    };

    let confidence = combine(&confidences, 0.0);
    let metrics = vec![
        Metric::new("expected_outcome", set.expected_outcome(), confidence, inputs.clone()),
        Metric::new("probability_sum", set.probability_sum(), confidence, inputs),
        Metric::new("scenario_count", set.scenarios().len() as f64, confidence, Vec::new()),
    ];
    (
        Outcome::Computed {
            metrics,
            sample: None,
        },
        Some(set),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dasv_domain::{Agreement, EventSet, ReconciledField, SubjectId};

    fn record(fields: &[(&str, f64)]) -> DiscoveryRecord {
        let fields = fields
            .iter()
            .map(|(name, value)| {
                (name.to_string(), ReconciledField::new((*value).into(), 0.9, "a", Agreement::SingleSource))
            })
            .collect::<BTreeMap<_, _>>();
        DiscoveryRecord::new(
            SubjectId::new("AAPL").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            fields,
            EventSet::default(),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    fn three_way(bear: f64, base: f64, bull: f64) -> DiscoveryRecord {
        record(&[
            ("scenario.bear.probability", bear),
            ("scenario.bear.outcome", -0.2),
            ("scenario.base.probability", base),
            ("scenario.base.outcome", 0.05),
            ("scenario.bull.probability", bull),
            ("scenario.bull.outcome", 0.3),
        ])
    }

    #[test]
    fn test_sum_within_tolerance_computes() {
        // Sums to 1.003
        let (outcome, set) = analyze(&three_way(0.25, 0.503, 0.25), 0.005);
        let set = set.unwrap();
        assert!((set.probability_sum() - 1.003).abs() < 1e-9);
        match outcome {
            Outcome::Computed { metrics, .. } => {
                let expected = metrics.iter().find(|m| m.name == "expected_outcome").unwrap();
                let manual = 0.25 * -0.2 + 0.503 * 0.05 + 0.25 * 0.3;
                assert!((expected.value - manual).abs() < 1e-12);
                assert_eq!(expected.inputs.len(), 6);
            }
            other => panic!("expected computed, got {:?}", other),
        }
    }

    #[test]
    fn test_sum_outside_tolerance_fails_closed() {
        // Sums to 0.80
        let (outcome, set) = analyze(&three_way(0.2, 0.4, 0.2), 0.005);
        assert!(set.is_none());
        match outcome {
            Outcome::Failed(reason) => assert!(reason.contains("0.8000")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_scenario_fails() {
        let (outcome, _) = analyze(&record(&[("scenario.bear.probability", 1.0)]), 0.005);
        assert!(matches!(outcome, Outcome::Failed(ref r) if r.contains("bear")));
    }
}
