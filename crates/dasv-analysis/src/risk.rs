//! Risk matrix construction
//!
//! Each category needs both `risk.<category>.probability` and
//! `risk.<category>.impact`. The two are read independently; neither is
//! derived from the other.

use crate::engine::Outcome;
use crate::plan::RISK_PREFIX;
use dasv_domain::propagation::combine;
use dasv_domain::{DiscoveryRecord, Impact, Metric, ReconciledField, RiskMatrix, RiskMatrixEntry};
use std::collections::BTreeMap;

#[derive(Default)]
struct Estimate<'a> {
    probability: Option<(&'a str, &'a ReconciledField)>,
    impact: Option<(&'a str, &'a ReconciledField)>,
}

fn number(name: &str, field: &ReconciledField) -> Result<f64, String> {
    field
        .value
        .as_number()
        .ok_or_else(|| format!("risk field '{}' is not numeric", name))
}

fn impact(name: &str, field: &ReconciledField) -> Result<Impact, String> {
    let value = number(name, field)?;
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return Err(format!("risk field '{}' must be an integer from 1 to 5, got {}", name, value));
    }
    Impact::new(value as u8).map_err(|e| e.to_string())
}

fn build(record: &DiscoveryRecord) -> Result<Option<RiskMatrix>, String> {
    let mut estimates: BTreeMap<&str, Estimate> = BTreeMap::new();
    for (name, field) in record.fields() {
        let Some(rest) = name.strip_prefix(RISK_PREFIX) else {
            continue;
        };
        match rest.rsplit_once('.') {
            Some((category, "probability")) if !category.is_empty() => {
                estimates.entry(category).or_default().probability = Some((name.as_str(), field));
            }
            Some((category, "impact")) if !category.is_empty() => {
                estimates.entry(category).or_default().impact = Some((name.as_str(), field));
            }
            _ => return Err(format!("unrecognized risk field '{}'", name)),
        }
    }

    if estimates.is_empty() {
        return Ok(None);
    }

    let mut matrix = RiskMatrix::new();
    for (category, estimate) in estimates {
        let (Some((p_name, p_field)), Some((i_name, i_field))) = (estimate.probability, estimate.impact)
        else {
            return Err(format!(
                "risk category '{}' needs both a probability and an impact",
                category
            ));
        };
        let entry = RiskMatrixEntry::new(
            category,
            number(p_name, p_field)?,
            impact(i_name, i_field)?,
            format!("{}, {}", p_name, i_name),
            combine(&[p_field.confidence, i_field.confidence], 0.0),
        )
        .map_err(|e| e.to_string())?;
        matrix.insert(entry).map_err(|e| e.to_string())?;
    }
    Ok(Some(matrix))
}

/// Build the risk matrix and its summary metrics
///
/// Returns the outcome together with the matrix when it was computed.
pub fn analyze(record: &DiscoveryRecord, top_n: usize) -> (Outcome, Option<RiskMatrix>) {
    let matrix = match build(record) {
        Ok(Some(matrix)) => matrix,
        Ok(None) => {
            return (
                Outcome::Insufficient {
                    observed: 0,
                    required: 1,
                },
                None,
            )
        }
        Err(reason) => return (Outcome::Failed(reason), None),
    };

    let evidence: Vec<String> = matrix
        .entries()
        .iter()
        .flat_map(|e| e.evidence.split(", ").map(str::to_string))
        .collect();
    let confidences: Vec<f64> = matrix.entries().iter().map(|e| e.confidence).collect();
    let confidence = combine(&confidences, 0.0);

    let mut metrics = vec![
        Metric::new("aggregate_score", matrix.aggregate_score(), confidence, evidence.clone()),
        Metric::new("unweighted_score", matrix.unweighted_score(), confidence, evidence),
        Metric::new("entry_count", matrix.len() as f64, confidence, Vec::new()),
    ];
    for entry in matrix.top_contributors(top_n) {
        metrics.push(Metric::new(
            format!("top_contributor.{}", entry.category),
            entry.weighted_score(),
            entry.confidence,
            entry.evidence.split(", ").map(str::to_string).collect(),
        ));
    }

    (
        Outcome::Computed {
            metrics,
            sample: None,
        },
        Some(matrix),
    )
}
