//! Flat in-memory vector index, cosine similarity over unit-normalized
//! embeddings. A Run's chunk count is bounded (at most a few
//! hundred pages × a few chunks each), so no ANN structure is warranted —
//! this is a scope decision, not a missing feature (see `DESIGN.md`).

use crate::ids::ChunkId;

pub struct VectorIndex {
    entries: Vec<(ChunkId, Vec<f32>)>,
}

impl VectorIndex {
    pub fn build(entries: Vec<(ChunkId, Vec<f32>)>) -> Self {
        Self { entries }
    }

    /// Returns the top-K chunk ids by cosine similarity, highest first.
    /// Embeddings are assumed unit-normalized so cosine reduces to dot
    /// product (invariant).
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Vec<(ChunkId, f64)> {
        let mut scored: Vec<(ChunkId, f64)> = self
            .entries
            .iter()
            .map(|(chunk_id, vector)| (*chunk_id, dot(query_vector, vector) as f64))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_identical_vector_highest() {
        let a = ChunkId::new();
        let b = ChunkId::new();
        let index = VectorIndex::build(vec![
            (a, vec![1.0, 0.0, 0.0]),
            (b, vec![0.0, 1.0, 0.0]),
        ]);
        let results = index.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(results[0].0, a);
    }
}
