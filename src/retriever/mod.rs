//! Hybrid retrieval: BM25 + vector search fused by Reciprocal Rank Fusion,
//! with per-page diversity. The fusion function signature
//! (`rank_vec`/`rank_bm25` as `Option<usize>`, explicit `k`/weights) follows
//! `arclabs561-rank-rank`'s standalone `rrf`/`rrf_k` functions, grafted
//! in since no prior module here had retrieval-fusion code.

use crate::embedder::Embedder;
use crate::ids::{ChunkId, PageId};
use crate::index::{Bm25Index, VectorIndex};
use crate::types::Chunk;
use std::collections::HashMap;
use std::sync::Arc;

pub const RRF_K: f64 = 60.0;

/// Raw RRF scores lie in roughly `[0, 0.03]`; downstream scoring must
/// normalize to `[0,1]` via this exact divisor.
pub const RRF_NORMALIZATION_DIVISOR: f64 = 0.02;

pub fn normalize_relevance(raw_rrf: f64) -> f64 {
    (raw_rrf / RRF_NORMALIZATION_DIVISOR).min(1.0)
}

/// `rrf(item) = w_vec · 1/(k + rank_vec) + w_bm25 · 1/(k + rank_bm25)`.
/// A `None` rank means the item was absent from that ranked list and
/// contributes 0 from it.
pub fn rrf(rank_vec: Option<usize>, rank_bm25: Option<usize>, k: f64, w_vec: f64, w_bm25: f64) -> f64 {
    let vec_term = rank_vec.map(|r| w_vec * 1.0 / (k + r as f64)).unwrap_or(0.0);
    let bm25_term = rank_bm25.map(|r| w_bm25 * 1.0 / (k + r as f64)).unwrap_or(0.0);
    vec_term + bm25_term
}

pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub page_id: PageId,
    pub rrf_score: f64,
}

pub struct Retriever {
    bm25: Bm25Index,
    vector: VectorIndex,
    chunk_pages: HashMap<ChunkId, PageId>,
    embedder: Arc<dyn Embedder>,
    index_model_id: String,
}

impl Retriever {
    /// Builds both indexes over `chunks`. `embedder` must be the exact
    /// instance used to build `embeddings` — a mismatch between query-side
    /// and document-side embedding spaces silently produces near-random
    /// retrieval, so it is a construction-time panic here, never silent.
    pub fn new(
        chunks: &[Chunk],
        embeddings: &[(ChunkId, Vec<f32>, String)],
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        for (_, _, model_id) in embeddings {
            assert_eq!(
                model_id,
                embedder.model_id(),
                "embedder/query-space mismatch: index was built with model `{model_id}` but the \
                 retriever's query embedder is `{}`",
                embedder.model_id()
            );
        }

        let documents: Vec<(ChunkId, String)> = chunks
            .iter()
            .map(|c| (c.chunk_id, c.text.clone()))
            .collect();
        let bm25 = Bm25Index::build(&documents);

        let vector_entries: Vec<(ChunkId, Vec<f32>)> = embeddings
            .iter()
            .map(|(id, vec, _)| (*id, vec.clone()))
            .collect();
        let vector = VectorIndex::build(vector_entries);

        let chunk_pages = chunks.iter().map(|c| (c.chunk_id, c.page_id)).collect();
        let index_model_id = embedder.model_id().to_string();

        Self {
            bm25,
            vector,
            chunk_pages,
            embedder,
            index_model_id,
        }
    }

    /// Retrieves the top-N chunks for `query_text`, fused via RRF with a
    /// per-page diversity cap of 2 chunks; overflow demoted to the tail.
    pub async fn retrieve(&self, query_text: &str, top_n: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        assert_eq!(
            self.embedder.model_id(),
            self.index_model_id,
            "embedder/query-space mismatch detected at query time"
        );

        let candidate_pool = (top_n * 4).max(40);
        let bm25_ranked = self.bm25.search(query_text, candidate_pool);
        let query_vector = self.embedder.embed_query(query_text).await?;
        let vector_ranked = self.vector.search(&query_vector, candidate_pool);

        let bm25_rank: HashMap<ChunkId, usize> = bm25_ranked
            .iter()
            .enumerate()
            .map(|(rank, (id, _))| (*id, rank))
            .collect();
        let vector_rank: HashMap<ChunkId, usize> = vector_ranked
            .iter()
            .enumerate()
            .map(|(rank, (id, _))| (*id, rank))
            .collect();

        let mut all_ids: Vec<ChunkId> = bm25_rank.keys().chain(vector_rank.keys()).copied().collect();
        all_ids.sort_by_key(|id| id.0);
        all_ids.dedup();

        let mut fused: Vec<RetrievedChunk> = all_ids
            .into_iter()
            .filter_map(|chunk_id| {
                let page_id = *self.chunk_pages.get(&chunk_id)?;
                let score = rrf(
                    vector_rank.get(&chunk_id).copied(),
                    bm25_rank.get(&chunk_id).copied(),
                    RRF_K,
                    0.5,
                    0.5,
                );
                Some(RetrievedChunk {
                    chunk_id,
                    page_id,
                    rrf_score: score,
                })
            })
            .collect();

        fused.sort_by(|a, b| b.rrf_score.partial_cmp(&a.rrf_score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(apply_page_diversity(fused, top_n, 2))
    }
}

/// Caps the final top-N at `max_per_page` chunks per page; overflow is
/// demoted to the tail rather than dropped (diversity constraint).
fn apply_page_diversity(ranked: Vec<RetrievedChunk>, top_n: usize, max_per_page: usize) -> Vec<RetrievedChunk> {
    let mut per_page_count: HashMap<PageId, usize> = HashMap::new();
    let mut head = Vec::new();
    let mut tail = Vec::new();

    for item in ranked {
        let count = per_page_count.entry(item.page_id).or_insert(0);
        if *count < max_per_page {
            *count += 1;
            head.push(item);
        } else {
            tail.push(item);
        }
    }

    head.extend(tail);
    head.truncate(top_n);
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrf_is_monotonic_in_rank() {
        let best = rrf(Some(0), Some(0), 60.0, 0.5, 0.5);
        let worse = rrf(Some(5), Some(5), 60.0, 0.5, 0.5);
        assert!(best > worse);
    }

    #[test]
    fn absent_from_one_list_still_contributes_from_the_other() {
        let both = rrf(Some(0), Some(0), 60.0, 0.5, 0.5);
        let vec_only = rrf(Some(0), None, 60.0, 0.5, 0.5);
        assert!(vec_only > 0.0);
        assert!(vec_only < both);
    }

    #[test]
    fn normalization_maps_typical_raw_range_into_unit_interval() {
        assert!((normalize_relevance(0.0) - 0.0).abs() < 1e-9);
        assert!((normalize_relevance(0.02) - 1.0).abs() < 1e-9);
        assert_eq!(normalize_relevance(0.05), 1.0);
        let lower = normalize_relevance(0.005);
        let higher = normalize_relevance(0.015);
        assert!(higher > lower);
    }

    #[test]
    fn diversity_cap_demotes_overflow_to_tail() {
        let page_a = PageId::new();
        let page_b = PageId::new();
        let ranked = vec![
            RetrievedChunk { chunk_id: ChunkId::new(), page_id: page_a, rrf_score: 0.9 },
            RetrievedChunk { chunk_id: ChunkId::new(), page_id: page_a, rrf_score: 0.8 },
            RetrievedChunk { chunk_id: ChunkId::new(), page_id: page_a, rrf_score: 0.7 },
            RetrievedChunk { chunk_id: ChunkId::new(), page_id: page_b, rrf_score: 0.6 },
        ];
        let capped = apply_page_diversity(ranked, 4, 2);
        let page_a_count = capped.iter().filter(|c| c.page_id == page_a).count();
        assert_eq!(page_a_count, 2);
        assert_eq!(capped.last().unwrap().page_id, page_a);
    }
}
