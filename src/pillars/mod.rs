//! Seven pillar analyzers. Each reads disjoint aspects of the
//! same immutable Run artifacts and emits an independent `PillarScore` —
//! independent functions producing a common record, no base class needed,
//! mirrored here as a plain function per pillar rather than a trait
//! hierarchy.

pub mod authority;
pub mod coverage;
pub mod entity_recognition;
pub mod retrieval;
pub mod schema;
pub mod structure;
pub mod technical;

use crate::robots::RobotsResult;
use crate::types::{Page, PillarScore, SimResult};

/// Shared read-only view over one Run's artifacts. Analyzers take only the
/// slice of this they need.
pub struct PillarInput<'a> {
    pub pages: &'a [Page],
    pub robots_result: Option<&'a RobotsResult>,
    pub llms_txt_present: bool,
    pub sim_results: &'a [SimResult],
    pub total_questions: usize,
}

pub fn component(name: &str, weight_pct: f64, raw: f64) -> crate::types::ComponentScore {
    crate::types::ComponentScore {
        name: name.to_string(),
        weight_pct,
        raw: raw.clamp(0.0, 100.0),
    }
}

pub fn weighted_raw(components: &[crate::types::ComponentScore]) -> f64 {
    components.iter().map(|c| c.raw * c.weight_pct / 100.0).sum()
}

pub fn finalize(
    run_id: crate::ids::RunId,
    pillar: crate::types::Pillar,
    components: Vec<crate::types::ComponentScore>,
    issues: Vec<crate::types::Issue>,
) -> PillarScore {
    let raw = weighted_raw(&components).clamp(0.0, 100.0);
    PillarScore {
        run_id,
        pillar,
        raw,
        // `weighted_points` is filled in by the Score Calculator, which knows
        // the active CalibrationConfig weight; pillar analyzers only know raw.
        weighted_points: 0.0,
        level: crate::types::ProgressLevel::from_raw(raw),
        components,
        issues,
    }
}

/// Runs every enabled analyzer. Entity Recognition only runs when
/// `entity_recognition_enabled` is set (disabled by default).
pub fn run_all(
    run_id: crate::ids::RunId,
    input: &PillarInput,
    entity_recognition_enabled: bool,
) -> Vec<PillarScore> {
    let mut scores = vec![
        technical::analyze(run_id, input),
        structure::analyze(run_id, input),
        schema::analyze(run_id, input),
        authority::analyze(run_id, input),
        retrieval::analyze(run_id, input),
        coverage::analyze(run_id, input),
    ];
    if entity_recognition_enabled {
        scores.push(entity_recognition::analyze(run_id, input));
    }
    scores
}
