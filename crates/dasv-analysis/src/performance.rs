//! Event statistics: closed performance and open exposure
//!
//! Each function sees a single event category. Closed and open events are
//! never combined into one statistic.

use crate::engine::Outcome;
use dasv_discovery::SampleValidator;
use dasv_domain::propagation::combine;
use dasv_domain::{Event, EventStatus, Metric};

fn inputs(status: EventStatus) -> Vec<String> {
    vec![format!("events.{}", status)]
}

/// Gate a category on its count, returning the penalty to apply when computed
fn gate(events: &[Event], validator: &SampleValidator) -> Result<f64, Outcome> {
    let adequacy = validator.assess(events.len());
    if !adequacy.is_sufficient() {
        return Err(Outcome::Insufficient {
            observed: events.len(),
            required: validator.minimums().basic,
        });
    }
    if let Some(bad) = events.iter().find(|e| !e.return_pct.is_finite()) {
        return Err(Outcome::Failed(format!(
            "event '{}' has a non-finite return",
            bad.id
        )));
    }
    Ok(validator.penalty(events.len()))
}

/// Largest peak-to-trough decline of the compounded equity curve
fn max_drawdown(returns: impl IntoIterator<Item = f64>) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        if peak > 0.0 {
            worst = worst.max((peak - equity) / peak);
        }
    }
    worst
}

/// Statistics over closed events only
///
/// `events` must already be the closed category, ordered by close time.
pub fn closed_performance(events: &[Event], parent: f64, validator: &SampleValidator) -> Outcome {
    let penalty = match gate(events, validator) {
        Ok(penalty) => penalty,
        Err(outcome) => return outcome,
    };
    let confidence = combine(&[parent], penalty);
    let metric = |name: &str, value: f64| {
        Metric::new(name, value, confidence, inputs(EventStatus::Closed))
    };

    let n = events.len() as f64;
    let returns: Vec<f64> = events.iter().map(|e| e.return_pct).collect();
    let gains: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r <= 0.0).collect();

    let win_rate = gains.len() as f64 / n;
    let average_return = returns.iter().sum::<f64>() / n;
    let average_win = if gains.is_empty() { 0.0 } else { gains.iter().sum::<f64>() / gains.len() as f64 };
    let average_loss = if losses.is_empty() {
        0.0
    } else {
        losses.iter().map(|l| l.abs()).sum::<f64>() / losses.len() as f64
    };
    let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();

    let mut metrics = vec![
        metric("trade_count", n),
        metric("win_rate", win_rate),
        metric("average_return", average_return),
        metric("max_drawdown", max_drawdown(returns.iter().copied())),
        metric("expectancy", win_rate * average_win - (1.0 - win_rate) * average_loss),
    ];
    // Undefined without losses; omitted rather than reported as infinite
    if gross_loss > 0.0 {
        metrics.push(metric("profit_factor", gains.iter().sum::<f64>() / gross_loss));
    }

    Outcome::Computed {
        metrics,
        sample: Some(validator.assess(events.len())),
    }
}

/// Statistics over open events only
pub fn open_exposure(events: &[Event], parent: f64, validator: &SampleValidator) -> Outcome {
    let penalty = match gate(events, validator) {
        Ok(penalty) => penalty,
        Err(outcome) => return outcome,
    };
    let confidence = combine(&[parent], penalty);
    let metric = |name: &str, value: f64| Metric::new(name, value, confidence, inputs(EventStatus::Open));

    let n = events.len() as f64;
    let total: f64 = events.iter().map(|e| e.return_pct).sum();
    let worst = events
        .iter()
        .map(|e| e.return_pct)
        .fold(f64::INFINITY, f64::min);

    Outcome::Computed {
        metrics: vec![
            metric("open_count", n),
            metric("average_unrealized_return", total / n),
            metric("worst_unrealized_return", worst),
        ],
        sample: Some(validator.assess(events.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dasv_domain::{SampleAdequacy, SampleMinimums};

    fn closed(returns: &[f64]) -> Vec<Event> {
        returns
            .iter()
            .enumerate()
            .map(|(i, r)| Event {
                id: format!("t{}", i),
                status: EventStatus::Closed,
                return_pct: *r,
                opened_at: Utc::now(),
                closed_at: Some(Utc::now()),
                source: "a".to_string(),
            })
            .collect()
    }

    fn metric<'a>(outcome: &'a Outcome, name: &str) -> &'a Metric {
        match outcome {
            Outcome::Computed { metrics, .. } => metrics.iter().find(|m| m.name == name).unwrap(),
            other => panic!("expected computed, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_below_basic() {
        let outcome = closed_performance(&closed(&[0.1, -0.05, 0.02]), 0.95, &SampleValidator::default());
        assert_eq!(outcome, Outcome::Insufficient { observed: 3, required: 5 });
    }

    #[test]
    fn test_closed_statistics() {
        let events = closed(&[0.10, -0.05, 0.20, -0.10, 0.05]);
        let outcome = closed_performance(&events, 1.0, &SampleValidator::default());

        assert_eq!(metric(&outcome, "trade_count").value, 5.0);
        assert!((metric(&outcome, "win_rate").value - 0.6).abs() < 1e-12);
        assert!((metric(&outcome, "average_return").value - 0.04).abs() < 1e-12);
        // gains 0.35 / losses 0.15
        assert!((metric(&outcome, "profit_factor").value - 0.35 / 0.15).abs() < 1e-12);
        assert!((metric(&outcome, "expectancy").value - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_basic_only_sample_is_penalized() {
        let events = closed(&[0.1; 10]);
        let outcome = closed_performance(&events, 1.0, &SampleValidator::default());
        // 10 of 15 toward significance: penalty 1/3
        assert!((metric(&outcome, "win_rate").confidence - 2.0 / 3.0).abs() < 1e-12);
        match outcome {
            Outcome::Computed { sample, .. } => assert_eq!(sample, Some(SampleAdequacy::Basic)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_significant_sample_keeps_parent_confidence() {
        let validator = SampleValidator::new(SampleMinimums { basic: 2, significant: 3 }).unwrap();
        let outcome = closed_performance(&closed(&[0.1, 0.2, -0.1]), 0.9, &validator);
        assert_eq!(metric(&outcome, "win_rate").confidence, 0.9);
    }

    #[test]
    fn test_no_losses_omits_profit_factor() {
        let outcome = closed_performance(&closed(&[0.1; 5]), 1.0, &SampleValidator::default());
        match outcome {
            Outcome::Computed { metrics, .. } => {
                assert!(metrics.iter().all(|m| m.name != "profit_factor"))
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_max_drawdown() {
        // 1.0 → 1.1 → 0.88 → 0.968
        let dd = max_drawdown([0.1, -0.2, 0.1]);
        assert!((dd - 0.2).abs() < 1e-12);
        assert_eq!(max_drawdown([0.1, 0.1]), 0.0);
    }

    #[test]
    fn test_non_finite_return_is_error() {
        let outcome = closed_performance(&closed(&[0.1, f64::NAN, 0.1, 0.1, 0.1]), 1.0, &SampleValidator::default());
        assert!(matches!(outcome, Outcome::Failed(_)));
    }

    #[test]
    fn test_open_exposure() {
        let events: Vec<Event> = closed(&[0.02, -0.04, 0.05, 0.01, -0.01])
            .into_iter()
            .map(|mut e| {
                e.status = EventStatus::Open;
                e.closed_at = None;
                e
            })
            .collect();
        let outcome = open_exposure(&events, 0.8, &SampleValidator::default());
        assert_eq!(metric(&outcome, "open_count").value, 5.0);
        assert!((metric(&outcome, "average_unrealized_return").value - 0.006).abs() < 1e-12);
        assert_eq!(metric(&outcome, "worst_unrealized_return").value, -0.04);
        assert_eq!(metric(&outcome, "open_count").inputs, vec!["events.open".to_string()]);
    }
}
