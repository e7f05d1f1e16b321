//! Retrieval pillar: average per-question `relevance_norm` from simulation,
//! plus a source-diversity component so answers aren't all drawn from a
//! single crawled page when the site has more than one.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::retriever::normalize_relevance;
use crate::types::{Pillar, PillarScore};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let components = vec![
        component("avg_relevance_norm", 80.0, avg_relevance_norm(input)),
        component("source_diversity", 20.0, source_diversity(input)),
    ];
    finalize(run_id, Pillar::Retrieval, components, vec![])
}

fn avg_relevance_norm(input: &PillarInput) -> f64 {
    if input.sim_results.is_empty() {
        return 0.0;
    }
    let sum: f64 = input
        .sim_results
        .iter()
        .map(|r| {
            if r.retrieved.is_empty() {
                0.0
            } else {
                let avg_raw = r.retrieved.iter().map(|c| c.rrf_score).sum::<f64>() / r.retrieved.len() as f64;
                normalize_relevance(avg_raw) * 100.0
            }
        })
        .sum();
    sum / input.sim_results.len() as f64
}

/// Fraction of crawled pages that actually carry extractable content.
/// A single-page site has nothing to diversify across, so it is floored at
/// full credit rather than punished for having only one source; a site with
/// zero pages has no source at all and gets none.
fn source_diversity(input: &PillarInput) -> f64 {
    if input.pages.is_empty() {
        return 0.0;
    }
    if input.pages.len() == 1 {
        return 100.0;
    }
    let with_content = input.pages.iter().filter(|p| !p.extracted_text.trim().is_empty()).count();
    100.0 * with_content as f64 / input.pages.len() as f64
}
