//! Score Calculator v2: weighted pillar points → Findability
//! Level, built fresh, grounded on the already-established
//! `CalibrationConfig`/`PillarScore` types and the `FindabilityLevel`
//! threshold table fixed in `types.rs`.

use crate::types::{CalibrationConfig, FindabilityLevel, MathLine, Pillar, PillarScore};

/// Applies the active CalibrationConfig's weights to raw pillar scores,
/// producing `weighted_points` on each `PillarScore` and the Run totals.
pub struct ScoreResult {
    pub pillar_scores: Vec<PillarScore>,
    pub total_score: f64,
    /// `Some` only when some pillars were skipped (step 2).
    pub evaluated_max: Option<f64>,
    pub level: FindabilityLevel,
    pub points_to_milestone: Option<f64>,
    pub show_the_math: Vec<MathLine>,
}

/// `evaluated_pillars` lists every pillar with a real score this Run, in the
/// order they should appear in `show_the_math`. Pillars present in
/// `calibration.weights` but absent from `pillar_scores` are treated as
/// skipped (observation not run, entity pillar disabled, etc).
pub fn calculate(calibration: &CalibrationConfig, mut pillar_scores: Vec<PillarScore>) -> ScoreResult {
    let mut show_the_math = Vec::new();
    let mut total_score = 0.0;
    let mut evaluated_weight_sum = 0.0;
    let mut full_weight_sum = 0.0;

    for weight in calibration.weights.values() {
        full_weight_sum += weight;
    }

    for score in &mut pillar_scores {
        let weight = calibration.weights.get(&score.pillar).copied().unwrap_or(0.0);
        let points = score.raw * (weight / 100.0);
        score.weighted_points = points;
        total_score += points;
        evaluated_weight_sum += weight;
        show_the_math.push(MathLine {
            pillar: score.pillar,
            raw: score.raw,
            weight_pct: weight,
            contribution: points,
        });
    }

    show_the_math.sort_by(|a, b| pillar_order(a.pillar).cmp(&pillar_order(b.pillar)));

    let evaluated_max = if (evaluated_weight_sum - full_weight_sum).abs() > 0.01 {
        Some(evaluated_weight_sum)
    } else {
        None
    };

    // Findability Level and milestones are always computed against the raw
    // 0-100 total, never against the evaluated-max-rescaled percentage —
    // the rescaled number is a secondary display figure only.
    let level = FindabilityLevel::from_score(total_score);
    let points_to_milestone = level.next_milestone().map(|m| (m - total_score).max(0.0));

    ScoreResult {
        pillar_scores,
        total_score,
        evaluated_max,
        level,
        points_to_milestone,
        show_the_math,
    }
}

fn pillar_order(pillar: Pillar) -> u8 {
    match pillar {
        Pillar::Technical => 0,
        Pillar::Structure => 1,
        Pillar::Schema => 2,
        Pillar::Authority => 3,
        Pillar::EntityRecognition => 4,
        Pillar::Retrieval => 5,
        Pillar::Coverage => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RunId;
    use crate::types::{ComponentScore, ProgressLevel};

    fn pillar_score(pillar: Pillar, raw: f64) -> PillarScore {
        PillarScore {
            run_id: RunId::new(),
            pillar,
            raw,
            weighted_points: 0.0,
            level: ProgressLevel::from_raw(raw),
            components: vec![ComponentScore { name: "x".to_string(), weight_pct: 100.0, raw }],
            issues: vec![],
        }
    }

    #[test]
    fn evaluated_max_present_when_pillar_skipped() {
        let calibration = CalibrationConfig::default_active();
        let scores = vec![
            pillar_score(Pillar::Technical, 90.0),
            pillar_score(Pillar::Structure, 90.0),
            pillar_score(Pillar::Schema, 90.0),
            pillar_score(Pillar::Authority, 90.0),
            // Retrieval/Coverage omitted — observation not run.
        ];
        let result = calculate(&calibration, scores);
        assert!(result.evaluated_max.is_some());
        assert!(result.evaluated_max.unwrap() < 100.0);
    }

    #[test]
    fn full_pillar_set_yields_no_evaluated_max() {
        let calibration = CalibrationConfig::default_active();
        let scores = vec![
            pillar_score(Pillar::Technical, 80.0),
            pillar_score(Pillar::Structure, 80.0),
            pillar_score(Pillar::Schema, 80.0),
            pillar_score(Pillar::Authority, 80.0),
            pillar_score(Pillar::Retrieval, 80.0),
            pillar_score(Pillar::Coverage, 80.0),
        ];
        let result = calculate(&calibration, scores);
        assert!(result.evaluated_max.is_none());
        assert!((result.total_score - 80.0).abs() < 0.01);
    }

    #[test]
    fn weighted_points_sum_never_exceeds_hundred() {
        let calibration = CalibrationConfig::default_active();
        let scores = vec![
            pillar_score(Pillar::Technical, 100.0),
            pillar_score(Pillar::Structure, 100.0),
            pillar_score(Pillar::Schema, 100.0),
            pillar_score(Pillar::Authority, 100.0),
            pillar_score(Pillar::Retrieval, 100.0),
            pillar_score(Pillar::Coverage, 100.0),
        ];
        let result = calculate(&calibration, scores);
        assert!(result.total_score <= 100.01);
    }
}
