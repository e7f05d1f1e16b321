//! Coverage pillar: `100 · (fully + 0.5·partial) / total_questions`.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Answerability, Pillar, PillarScore};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let raw = coverage_raw(input);
    let components = vec![component("answerability_coverage", 100.0, raw)];
    finalize(run_id, Pillar::Coverage, components, vec![])
}

fn coverage_raw(input: &PillarInput) -> f64 {
    if input.total_questions == 0 {
        return 0.0;
    }
    let fully = input
        .sim_results
        .iter()
        .filter(|r| r.answerability == Answerability::FullyAnswerable)
        .count() as f64;
    let partial = input
        .sim_results
        .iter()
        .filter(|r| r.answerability == Answerability::PartiallyAnswerable)
        .count() as f64;
    100.0 * (fully + 0.5 * partial) / input.total_questions as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::QuestionId;
    use crate::types::SimResult;

    fn result(answerability: Answerability) -> SimResult {
        SimResult {
            question_id: QuestionId::new(),
            run_id: RunId::new(),
            retrieved: vec![],
            signals_found: 0,
            signals_total: 0,
            answerability,
            confidence: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn half_credit_for_partial_answers() {
        let sim_results = vec![result(Answerability::FullyAnswerable), result(Answerability::PartiallyAnswerable)];
        let input = PillarInput {
            pages: &[],
            robots_result: None,
            llms_txt_present: false,
            sim_results: &sim_results,
            total_questions: 2,
        };
        assert_eq!(coverage_raw(&input), 75.0);
    }
}
