//! Per-question simulation: retrieve, score, classify answerability.
//! The scoring formula is built fresh, grounded on the retriever's
//! already-established normalization contract.

use crate::error::SimError;
use crate::ids::ChunkId;
use crate::retriever::{normalize_relevance, Retriever};
use crate::signals::evaluate_signal;
use crate::types::{
    Answerability, CalibrationThresholds, Chunk, Question, RetrievedChunk as SimRetrievedChunk, SimResult,
};
use std::collections::{HashMap, HashSet};

pub const TOP_N_RETRIEVED: usize = 7;

/// Runs one question against the retriever and scores the result.
///
/// `chunk_text` must map every chunk id the retriever can return to its
/// text (for signal evaluation) and page id.
pub async fn simulate_question(
    question: &Question,
    retriever: &Retriever,
    chunks_by_id: &HashMap<crate::ids::ChunkId, &Chunk>,
    thresholds: &CalibrationThresholds,
    run_id: crate::ids::RunId,
) -> Result<SimResult, SimError> {
    let retrieved = retriever
        .retrieve(&question.text, TOP_N_RETRIEVED)
        .await
        .map_err(|_| SimError::RetrievalEmpty {
            question_id: question.question_id,
        })?;

    if retrieved.is_empty() {
        return Ok(unanswered_result(question, run_id));
    }

    let avg_relevance_raw = retrieved.iter().map(|r| r.rrf_score).sum::<f64>() / retrieved.len() as f64;
    let relevance_norm = normalize_relevance(avg_relevance_raw);

    // Evaluate each expected signal chunk by chunk (not against one
    // flattened blob) so we know exactly which retrieved chunks supplied
    // the evidence — that set is what `confidence` is computed over.
    let mut matched_chunk_ids: HashSet<ChunkId> = HashSet::new();
    let signals_total = question.expected_signals.len();
    let signals_found = question
        .expected_signals
        .iter()
        .filter(|name| {
            let mut any = false;
            for r in &retrieved {
                if let Some(chunk) = chunks_by_id.get(&r.chunk_id) {
                    if evaluate_signal(name, &chunk.text).found {
                        matched_chunk_ids.insert(r.chunk_id);
                        any = true;
                    }
                }
            }
            any
        })
        .count();

    // Neutral 0.5 when a question carries no expected signals at all — the
    // absence of a signal requirement must not penalize the question.
    let signal_score = if signals_total == 0 {
        0.5
    } else {
        signals_found as f64 / signals_total as f64
    };

    let confidence = estimate_confidence(&retrieved, &matched_chunk_ids);

    let score = 0.4 * relevance_norm + 0.4 * signal_score + 0.2 * confidence;

    let answerability = classify_answerability(score, thresholds);

    let sim_retrieved: Vec<SimRetrievedChunk> = retrieved
        .iter()
        .map(|r| SimRetrievedChunk {
            chunk_id: r.chunk_id,
            rrf_score: r.rrf_score,
        })
        .collect();

    Ok(SimResult {
        question_id: question.question_id,
        run_id,
        retrieved: sim_retrieved,
        signals_found,
        signals_total,
        answerability,
        confidence,
        score,
    })
}

fn unanswered_result(question: &Question, run_id: crate::ids::RunId) -> SimResult {
    SimResult {
        question_id: question.question_id,
        run_id,
        retrieved: vec![],
        signals_found: 0,
        signals_total: question.expected_signals.len(),
        answerability: Answerability::Unanswered,
        confidence: 0.0,
        score: 0.0,
    }
}

/// Mean of the retrieval-normalized relevance of chunks that actually
/// matched an expected signal — i.e. the chunks the signal score is
/// grounded on. Neutral 0.5 when no chunk matched anything (including
/// questions with no expected signals at all), mirroring the neutral
/// treatment of `signal_score` in the same case.
fn estimate_confidence(retrieved: &[crate::retriever::RetrievedChunk], matched_chunk_ids: &HashSet<ChunkId>) -> f64 {
    let matched_scores: Vec<f64> = retrieved
        .iter()
        .filter(|r| matched_chunk_ids.contains(&r.chunk_id))
        .map(|r| normalize_relevance(r.rrf_score))
        .collect();
    if matched_scores.is_empty() {
        0.5
    } else {
        matched_scores.iter().sum::<f64>() / matched_scores.len() as f64
    }
}

fn classify_answerability(score: f64, thresholds: &CalibrationThresholds) -> Answerability {
    if score >= thresholds.fully_answerable {
        Answerability::FullyAnswerable
    } else if score >= thresholds.partially_answerable {
        Answerability::PartiallyAnswerable
    } else {
        Answerability::Unanswered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_signal_score_is_half_when_no_signals_expected() {
        let score = 0.4 * 0.0 + 0.4 * 0.5 + 0.2 * 0.0;
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn classify_answerability_uses_default_thresholds() {
        let thresholds = CalibrationThresholds::default();
        assert_eq!(classify_answerability(0.6, &thresholds), Answerability::FullyAnswerable);
        assert_eq!(classify_answerability(0.2, &thresholds), Answerability::PartiallyAnswerable);
        assert_eq!(classify_answerability(0.05, &thresholds), Answerability::Unanswered);
    }

    #[test]
    fn confidence_is_neutral_when_no_chunk_matched_a_signal() {
        let page = crate::ids::PageId::new();
        let retrieved = vec![
            crate::retriever::RetrievedChunk { chunk_id: ChunkId::new(), page_id: page, rrf_score: 0.1 },
            crate::retriever::RetrievedChunk { chunk_id: ChunkId::new(), page_id: page, rrf_score: 0.05 },
        ];
        assert_eq!(estimate_confidence(&retrieved, &HashSet::new()), 0.5);
    }

    #[test]
    fn confidence_averages_normalized_relevance_of_matched_chunks_only() {
        let page = crate::ids::PageId::new();
        let matched = ChunkId::new();
        let unmatched = ChunkId::new();
        let retrieved = vec![
            crate::retriever::RetrievedChunk { chunk_id: matched, page_id: page, rrf_score: 0.02 },
            crate::retriever::RetrievedChunk { chunk_id: unmatched, page_id: page, rrf_score: 0.0 },
        ];
        let mut matched_ids = HashSet::new();
        matched_ids.insert(matched);
        assert_eq!(estimate_confidence(&retrieved, &matched_ids), 1.0);
    }
}
