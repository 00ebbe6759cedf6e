//! Field reconciliation across adapters
//!
//! Observations for one field are compared against the value of the most
//! reliable adapter:
//!
//! - all within tolerance: take that value, confidence from corroboration
//! - any beyond tolerance: take that value, confidence capped at 0.5, flag for review
//! - one adapter only: single-source discount

use dasv_domain::propagation::{
    agreement_confidence, disagreement_confidence, single_source_confidence,
};
use dasv_domain::{Agreement, FieldKind, FieldValue, Observation, ReconciledField, ReviewFlag, ReviewKind};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of reconciling one field
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Reconciled value and confidence
    pub field: ReconciledField,
    /// Review flag raised for a disagreement
    pub flag: Option<ReviewFlag>,
}

/// Order by confidence (descending), then adapter name, so ties are stable
fn by_reliability(a: &Observation, b: &Observation) -> Ordering {
    b.confidence()
        .partial_cmp(&a.confidence())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.source().cmp(b.source()))
}

/// Keep one observation per adapter, the most recent
fn latest_per_source(observations: &[Observation]) -> Vec<&Observation> {
    let mut latest: BTreeMap<&str, &Observation> = BTreeMap::new();
    for obs in observations {
        latest
            .entry(obs.source())
            .and_modify(|current| {
                if obs.observed_at() > current.observed_at() {
                    *current = obs;
                }
            })
            .or_insert(obs);
    }
    latest.into_values().collect()
}

/// How far the candidate values are apart
enum Spread {
    Within,
    Beyond(f64),
}

fn numeric_spread(reference: f64, values: &[&FieldValue], tolerance: f64) -> Spread {
    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.as_number()).collect();
    let Some(numbers) = numbers else {
        // Mixed text and numbers never agree
        return Spread::Beyond(f64::INFINITY);
    };
    let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let spread = if reference == 0.0 {
        if max == min {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (max - min) / reference.abs()
    };
    if spread <= tolerance {
        Spread::Within
    } else {
        Spread::Beyond(spread)
    }
}

fn categorical_spread(values: &[&FieldValue]) -> Spread {
    let mut distinct: Vec<&FieldValue> = Vec::new();
    for value in values {
        if !distinct.contains(value) {
            distinct.push(value);
        }
    }
    if distinct.len() <= 1 {
        Spread::Within
    } else {
        Spread::Beyond(distinct.len() as f64)
    }
}

/// Reconcile all observations of one field
///
/// `adapter_count` is the number of adapters configured for the run, so a
/// missing adapter lowers corroboration. `tolerance` is `None` for an
/// exact-match comparison. Returns `None` when there are no observations.
pub fn reconcile_field(
    field: &str,
    kind: FieldKind,
    observations: &[Observation],
    adapter_count: usize,
    tolerance: Option<f64>,
) -> Option<Reconciliation> {
    let mut candidates = latest_per_source(observations);
    candidates.sort_by(|a, b| by_reliability(a, b));
    let chosen = *candidates.first()?;

    if candidates.len() == 1 {
        let reconciled = ReconciledField::new(
            chosen.value().clone(),
            single_source_confidence(chosen.confidence()),
            chosen.source(),
            Agreement::SingleSource,
        );
        return Some(Reconciliation {
            field: reconciled,
            flag: None,
        });
    }

    let values: Vec<&FieldValue> = candidates.iter().map(|o| o.value()).collect();
    let spread = match (kind, tolerance, chosen.value().as_number()) {
        (FieldKind::Categorical, _, _) | (_, None, _) => categorical_spread(&values),
        (_, Some(tolerance), Some(reference)) => numeric_spread(reference, &values, tolerance),
        (_, Some(_), None) => Spread::Beyond(f64::INFINITY),
    };

    let reconciliation = match spread {
        Spread::Within => {
            let agreeing = candidates.len() - 1;
            let confidence =
                agreement_confidence(agreeing, adapter_count).min(chosen.confidence());
            Reconciliation {
                field: ReconciledField::new(
                    chosen.value().clone(),
                    confidence,
                    chosen.source(),
                    Agreement::Agreed {
                        agreeing,
                        of: adapter_count,
                    },
                ),
                flag: None,
            }
        }
        Spread::Beyond(spread) => {
            let sources: Vec<String> = candidates
                .iter()
                .map(|o| format!("{}={}", o.source(), o.value()))
                .collect();
            let reason = match tolerance {
                Some(tolerance) if kind != FieldKind::Categorical => format!(
                    "sources disagree ({}): spread {:.2}% exceeds tolerance {:.2}%",
                    sources.join(", "),
                    spread * 100.0,
                    tolerance * 100.0
                ),
                _ => format!("sources disagree ({})", sources.join(", ")),
            };
            Reconciliation {
                field: ReconciledField::new(
                    chosen.value().clone(),
                    disagreement_confidence(chosen.confidence()),
                    chosen.source(),
                    Agreement::Disagreed { spread },
                ),
                flag: Some(ReviewFlag::new(field, ReviewKind::FieldDisagreement, reason)),
            }
        }
    };
    Some(reconciliation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn obs(source: &str, value: impl Into<FieldValue>, confidence: f64) -> Observation {
        Observation::new("price", value, source, Utc::now(), confidence)
    }

    #[test]
    fn test_agreement_takes_most_reliable_value() {
        let observations = vec![obs("b", 101.0, 0.9), obs("a", 100.0, 0.95)];
        let r = reconcile_field("price", FieldKind::PriceLike, &observations, 2, Some(0.02)).unwrap();

        assert_eq!(r.field.value, FieldValue::Number(100.0));
        assert_eq!(r.field.source, "a");
        assert!((r.field.confidence - 0.95).abs() < 1e-12);
        assert_eq!(r.field.agreement, Agreement::Agreed { agreeing: 1, of: 2 });
        assert!(r.flag.is_none());
    }

    #[test]
    fn test_agreement_capped_by_chosen_reliability() {
        let observations = vec![obs("a", 100.0, 0.7), obs("b", 100.5, 0.6), obs("c", 100.2, 0.5)];
        let r = reconcile_field("price", FieldKind::PriceLike, &observations, 3, Some(0.02)).unwrap();
        assert_eq!(r.field.confidence, 0.7);
    }

    #[test]
    fn test_disagreement_caps_and_flags() {
        let observations = vec![obs("a", 100.0, 0.95), obs("b", 110.0, 0.9)];
        let r = reconcile_field("price", FieldKind::PriceLike, &observations, 2, Some(0.02)).unwrap();

        assert_eq!(r.field.confidence, 0.5);
        assert!(r.field.needs_review);
        let flag = r.flag.unwrap();
        assert_eq!(flag.kind, ReviewKind::FieldDisagreement);
        assert!(flag.reason.contains("10.00%"));
    }

    #[test]
    fn test_single_source_discount() {
        let r = reconcile_field("price", FieldKind::PriceLike, &[obs("a", 100.0, 0.8)], 3, Some(0.02))
            .unwrap();
        assert!((r.field.confidence - 0.72).abs() < 1e-12);
        assert_eq!(r.field.agreement, Agreement::SingleSource);
    }

    #[test]
    fn test_categorical_exact_match() {
        let agree = vec![obs("a", "buy", 0.9), obs("b", "buy", 0.8)];
        let r = reconcile_field("rec", FieldKind::Categorical, &agree, 2, None).unwrap();
        assert!(r.flag.is_none());

        let disagree = vec![obs("a", "buy", 0.9), obs("b", "hold", 0.8)];
        let r = reconcile_field("rec", FieldKind::Categorical, &disagree, 2, None).unwrap();
        assert_eq!(r.field.agreement, Agreement::Disagreed { spread: 2.0 });
        assert_eq!(r.field.value, FieldValue::Text("buy".to_string()));
    }

    #[test]
    fn test_categorical_most_reliable_beats_majority() {
        let observations = vec![obs("a", "buy", 0.95), obs("b", "hold", 0.9), obs("c", "hold", 0.8)];
        let r = reconcile_field("rec", FieldKind::Categorical, &observations, 3, None).unwrap();
        assert_eq!(r.field.value, FieldValue::Text("buy".to_string()));
        assert_eq!(r.field.source, "a");
        assert!(r.flag.is_some());
    }

    #[test]
    fn test_type_mismatch_is_disagreement() {
        let observations = vec![obs("a", 100.0, 0.9), obs("b", "n/a", 0.8)];
        let r = reconcile_field("price", FieldKind::PriceLike, &observations, 2, Some(0.02)).unwrap();
        assert!(r.field.needs_review);
    }

    #[test]
    fn test_zero_reference() {
        let same = vec![obs("a", 0.0, 0.9), obs("b", 0.0, 0.8)];
        assert!(reconcile_field("x", FieldKind::Numeric, &same, 2, Some(0.02)).unwrap().flag.is_none());

        let apart = vec![obs("a", 0.0, 0.9), obs("b", 0.1, 0.8)];
        assert!(reconcile_field("x", FieldKind::Numeric, &apart, 2, Some(0.02)).unwrap().flag.is_some());
    }

    #[test]
    fn test_latest_observation_per_source_wins() {
        let now = Utc::now();
        let old = Observation::new("price", 90.0, "a", now - Duration::hours(2), 0.9);
        let new = Observation::new("price", 100.0, "a", now, 0.9);
        let r = reconcile_field("price", FieldKind::PriceLike, &[old, new], 1, Some(0.02)).unwrap();
        assert_eq!(r.field.value, FieldValue::Number(100.0));
        assert_eq!(r.field.agreement, Agreement::SingleSource);
    }

    #[test]
    fn test_no_observations() {
        assert!(reconcile_field("price", FieldKind::PriceLike, &[], 2, Some(0.02)).is_none());
    }
}
