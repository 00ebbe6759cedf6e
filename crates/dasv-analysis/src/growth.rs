//! Growth decomposition
//!
//! Components are read from `growth.<component>` fields. When the source
//! also reports `growth.total`, the unexplained remainder is reported as
//! `residual` instead of being spread over the components.

use crate::engine::Outcome;
use crate::plan::GROWTH_PREFIX;
use dasv_domain::propagation::combine;
use dasv_domain::{DiscoveryRecord, Metric};

const TOTAL: &str = "total";

/// Decompose growth into its reported components
pub fn decompose(record: &DiscoveryRecord) -> Outcome {
    let mut components = Vec::new();
    let mut total = None;

    for (name, field) in record.fields().range(GROWTH_PREFIX.to_string()..) {
        let Some(component) = name.strip_prefix(GROWTH_PREFIX) else {
            break;
        };
        let Some(value) = field.value.as_number() else {
            return Outcome::Failed(format!("growth field '{}' is not numeric", name));
        };
        if component == TOTAL {
            total = Some((name.clone(), value, field.confidence));
        } else {
            components.push((name.clone(), component.to_string(), value, field.confidence));
        }
    }

    if components.is_empty() {
        return Outcome::Insufficient {
            observed: 0,
            required: 1,
        };
    }

    let mut metrics: Vec<Metric> = components
        .iter()
        .map(|(field, component, value, confidence)| {
            Metric::new(component.clone(), *value, combine(&[*confidence], 0.0), vec![field.clone()])
        })
        .collect();

    let all_inputs: Vec<String> = components.iter().map(|(field, ..)| field.clone()).collect();
    let all_confidences: Vec<f64> = components.iter().map(|(.., c)| *c).collect();
    let explained: f64 = components.iter().map(|(_, _, v, _)| *v).sum();
    metrics.push(Metric::new(
        "explained",
        explained,
        combine(&all_confidences, 0.0),
        all_inputs.clone(),
    ));

    if let Some((field, value, confidence)) = total {
        let mut inputs = all_inputs;
        inputs.push(field.clone());
        let mut confidences = all_confidences;
        confidences.push(confidence);
        metrics.push(Metric::new(TOTAL, value, combine(&[confidence], 0.0), vec![field]));
        metrics.push(Metric::new(
            "residual",
            value - explained,
            combine(&confidences, 0.0),
            inputs,
        ));
    }

    Outcome::Computed {
        metrics,
        sample: None,
    }
}
