//! Calibration loop: drift detection over stored samples, built fresh,
//! grounded on `CalibrationSample`/`CalibrationConfig` already established
//! in `types.rs`.

pub mod experiment;
pub mod optimizer;

use crate::types::{Answerability, CalibrationSample, ObservedOutcome};

#[derive(Debug, Clone)]
pub struct DriftAlert {
    pub accuracy_drop_pct: f64,
    pub bias_pct: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyReport {
    pub accuracy: f64,
    /// Positive = system over-predicts answerability (optimistic bias).
    pub bias_pct: f64,
    pub sample_count: usize,
}

pub fn compute_accuracy(samples: &[CalibrationSample]) -> AccuracyReport {
    if samples.is_empty() {
        return AccuracyReport::default();
    }
    let correct = samples.iter().filter(|s| s.observed_outcome == ObservedOutcome::Correct).count();
    let optimistic = samples.iter().filter(|s| s.observed_outcome == ObservedOutcome::Optimistic).count();
    let pessimistic = samples.iter().filter(|s| s.observed_outcome == ObservedOutcome::Pessimistic).count();
    let total = samples.len() as f64;

    AccuracyReport {
        accuracy: 100.0 * correct as f64 / total,
        bias_pct: 100.0 * (optimistic as f64 - pessimistic as f64) / total,
        sample_count: samples.len(),
    }
}

pub fn per_category_accuracy(samples: &[CalibrationSample]) -> std::collections::HashMap<String, AccuracyReport> {
    let mut by_category: std::collections::HashMap<String, Vec<CalibrationSample>> = std::collections::HashMap::new();
    for sample in samples {
        by_category.entry(sample.category.clone()).or_default().push(sample.clone());
    }
    by_category
        .into_iter()
        .map(|(category, samples)| (category, compute_accuracy(&samples)))
        .collect()
}

/// Daily scheduled check: alert if accuracy drops ≥10% or bias exceeds ±20%
/// against `baseline`.
pub fn check_drift(current: AccuracyReport, baseline: AccuracyReport) -> Option<DriftAlert> {
    let accuracy_drop_pct = baseline.accuracy - current.accuracy;
    let bias_exceeded = current.bias_pct.abs() > 20.0;
    let accuracy_dropped = accuracy_drop_pct >= 10.0;

    if !bias_exceeded && !accuracy_dropped {
        return None;
    }

    let reason = match (accuracy_dropped, bias_exceeded) {
        (true, true) => "accuracy dropped and bias exceeded threshold".to_string(),
        (true, false) => "accuracy dropped by 10% or more versus baseline".to_string(),
        (false, true) => "optimism/pessimism bias exceeded ±20%".to_string(),
        (false, false) => unreachable!(),
    };

    Some(DriftAlert {
        accuracy_drop_pct,
        bias_pct: current.bias_pct,
        reason,
    })
}

/// Maps a prediction + observed outcome pair into the `ObservedOutcome`
/// bucket a fresh observation result should be recorded as.
pub fn classify_outcome(predicted: Answerability, observed_citable: bool) -> ObservedOutcome {
    match (predicted, observed_citable) {
        (Answerability::FullyAnswerable, true) | (Answerability::Unanswered, false) => ObservedOutcome::Correct,
        (Answerability::Unanswered, true) | (Answerability::PartiallyAnswerable, true) => ObservedOutcome::Pessimistic,
        _ => ObservedOutcome::Optimistic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_alert_fires_on_large_accuracy_drop() {
        let baseline = AccuracyReport { accuracy: 80.0, bias_pct: 0.0, sample_count: 100 };
        let current = AccuracyReport { accuracy: 65.0, bias_pct: 0.0, sample_count: 100 };
        assert!(check_drift(current, baseline).is_some());
    }

    #[test]
    fn no_alert_within_tolerance() {
        let baseline = AccuracyReport { accuracy: 80.0, bias_pct: 0.0, sample_count: 100 };
        let current = AccuracyReport { accuracy: 78.0, bias_pct: 5.0, sample_count: 100 };
        assert!(check_drift(current, baseline).is_none());
    }
}
