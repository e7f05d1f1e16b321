//! Inverted BM25 index, `k1=1.5`, `b=0.75`, minimum token length 3,
//! lowercased.

use super::tokenize;
use crate::ids::ChunkId;
use std::collections::HashMap;

pub struct Bm25Index {
    k1: f64,
    b: f64,
    doc_lengths: HashMap<ChunkId, usize>,
    avg_doc_length: f64,
    postings: HashMap<String, Vec<(ChunkId, usize)>>,
    doc_count: usize,
}

impl Bm25Index {
    pub fn build(documents: &[(ChunkId, String)]) -> Self {
        let mut postings: HashMap<String, Vec<(ChunkId, usize)>> = HashMap::new();
        let mut doc_lengths = HashMap::new();
        let mut total_length = 0usize;

        for (chunk_id, text) in documents {
            let tokens = tokenize(text);
            doc_lengths.insert(*chunk_id, tokens.len());
            total_length += tokens.len();

            let mut term_freqs: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *term_freqs.entry(token).or_insert(0) += 1;
            }
            for (term, freq) in term_freqs {
                postings.entry(term).or_default().push((*chunk_id, freq));
            }
        }

        let doc_count = documents.len();
        let avg_doc_length = if doc_count > 0 {
            total_length as f64 / doc_count as f64
        } else {
            0.0
        };

        Self {
            k1: 1.5,
            b: 0.75,
            doc_lengths,
            avg_doc_length,
            postings,
            doc_count,
        }
    }

    fn idf(&self, term: &str) -> f64 {
        let n_q = self.postings.get(term).map(|p| p.len()).unwrap_or(0) as f64;
        let n = self.doc_count as f64;
        ((n - n_q + 0.5) / (n_q + 0.5) + 1.0).ln()
    }

    /// Returns the top-K chunk ids by BM25 score, highest first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(ChunkId, f64)> {
        let query_terms = tokenize(query);
        let mut scores: HashMap<ChunkId, f64> = HashMap::new();

        for term in &query_terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);
            for (chunk_id, freq) in postings {
                let doc_len = *self.doc_lengths.get(chunk_id).unwrap_or(&0) as f64;
                let freq = *freq as f64;
                let denom = freq + self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_doc_length.max(1.0));
                let score = idf * (freq * (self.k1 + 1.0)) / denom.max(1e-9);
                *scores.entry(*chunk_id).or_insert(0.0) += score;
            }
        }

        let mut ranked: Vec<(ChunkId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ChunkId;

    #[test]
    fn ranks_exact_term_match_above_unrelated_document() {
        let a = ChunkId::new();
        let b = ChunkId::new();
        let docs = vec![
            (a, "our pricing plans start at ten dollars per month".to_string()),
            (b, "we bake fresh bread every single morning".to_string()),
        ];
        let index = Bm25Index::build(&docs);
        let results = index.search("pricing plans", 2);
        assert_eq!(results[0].0, a);
    }
}
