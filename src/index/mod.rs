//! Two parallel indexes over a Run's chunks: an inverted BM25
//! index and a flat cosine-similarity vector index, built fresh and
//! loosely informed by `nlp/rerank.rs`'s tokenize-then-score shape. Both
//! indexes are built once and read-only thereafter — no locks needed after
//! the build barrier.

mod bm25;
mod vector;

pub use bm25::Bm25Index;
pub use vector::VectorIndex;

pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.len() >= 3)
        .map(str::to_string)
        .collect()
}
