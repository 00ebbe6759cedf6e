//! Confidence propagation engine
//!
//! Pure functions applied at every phase boundary. A derived value's confidence
//! is always `combine()` over its direct dependencies, so a weak input degrades
//! every conclusion built on top of it. `aggregate()` exists for record-level
//! display only and is never used for gating.

use std::collections::BTreeMap;

/// Discount applied when only one adapter reported a field
pub const SINGLE_SOURCE_DISCOUNT: f64 = 0.9;

/// Ceiling for a field whose sources disagree beyond tolerance
pub const DISAGREEMENT_CAP: f64 = 0.5;

/// Base confidence for a field on which adapters agree
pub const AGREEMENT_BASE: f64 = 0.9;

/// Largest penalty an under-sampled statistic can receive
pub const MAX_SAMPLE_PENALTY: f64 = 0.5;

/// Clamp a value into [0.0, 1.0], mapping NaN to 0.0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Combine parent confidences into the confidence of a derived value
///
/// `max(0, min(parents) × (1 - penalty))`. An empty parent list carries no
/// evidence and yields 0.0.
///
/// # Examples
///
/// ```
/// use dasv_domain::propagation::combine;
///
/// assert_eq!(combine(&[0.9, 0.6, 0.95], 0.0), 0.6);
/// assert!((combine(&[0.8], 0.25) - 0.6).abs() < 1e-12);
/// ```
pub fn combine(parents: &[f64], penalty: f64) -> f64 {
    let Some(weakest) = parents
        .iter()
        .map(|&c| clamp_unit(c))
        .reduce(f64::min)
    else {
        return 0.0;
    };

    clamp_unit(weakest * (1.0 - clamp_unit(penalty)))
}

/// Penalty for a statistic computed over too few observations
///
/// 0 when `n >= minimum_required`, otherwise the relative shortfall capped at
/// [`MAX_SAMPLE_PENALTY`].
pub fn sample_penalty(n_observations: usize, minimum_required: usize) -> f64 {
    if n_observations >= minimum_required {
        return 0.0;
    }
    let shortfall = (minimum_required - n_observations) as f64 / minimum_required as f64;
    shortfall.min(MAX_SAMPLE_PENALTY)
}

/// Weighted (or unweighted) mean of field confidences
///
/// Fields missing from `weights` count with weight 1.0. Weight entries for
/// unknown fields are ignored. Returns 0.0 for an empty map or a zero total
/// weight.
pub fn aggregate(
    field_confidences: &BTreeMap<String, f64>,
    weights: Option<&BTreeMap<String, f64>>,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (field, &confidence) in field_confidences {
        let weight = weights
            .and_then(|w| w.get(field).copied())
            .unwrap_or(1.0)
            .max(0.0);
        weighted_sum += clamp_unit(confidence) * weight;
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return 0.0;
    }
    clamp_unit(weighted_sum / total_weight)
}

/// Confidence for a field whose sources agree within tolerance
///
/// `min(1.0, 0.9 + 0.1 × agreeing / adapter_count)`, where `agreeing` counts
/// the adapters corroborating the chosen value.
pub fn agreement_confidence(agreeing: usize, adapter_count: usize) -> f64 {
    if adapter_count == 0 {
        return 0.0;
    }
    let ratio = agreeing as f64 / adapter_count as f64;
    (AGREEMENT_BASE + (1.0 - AGREEMENT_BASE) * ratio).min(1.0)
}

/// Confidence for a field reported by exactly one adapter
pub fn single_source_confidence(reliability: f64) -> f64 {
    clamp_unit(reliability) * SINGLE_SOURCE_DISCOUNT
}

/// Confidence for a field whose sources disagree beyond tolerance
pub fn disagreement_confidence(reliability: f64) -> f64 {
    clamp_unit(reliability).min(DISAGREEMENT_CAP)
}
