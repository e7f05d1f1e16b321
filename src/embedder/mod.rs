//! Pluggable text→vector embedding. `Embedder` is a capability
//! trait, not a class hierarchy, matching the `SearchService`
//! pattern in `tools/search/service.rs`.

#[cfg(feature = "model-embedder")]
pub mod model;

use crate::types::ContentHash;
use async_trait::async_trait;
use moka::future::Cache;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::sync::Arc;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;
    fn dimension(&self) -> usize;
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embeds a single query string. Models that distinguish query vs.
    /// document embedding spaces (e.g. BGE's `"query: "` prefix) override
    /// this; the default routes through `embed` unprefixed, which is
    /// correct for any embedder with one shared space (the mock included).
    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.embed(&[text.to_string()]).await?.remove(0))
    }
}

pub(crate) fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    vector
}

/// Deterministic mock: the vector is a seeded hash of content, stable across
/// runs — always available, default for tests and for any Run that doesn't
/// opt into the `model-embedder` feature.
pub struct MockEmbedder {
    model_id: String,
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_id: "mock-deterministic-v1".to_string(),
            dimension,
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let hash = ContentHash::of(text.as_bytes());
        let seed: [u8; 32] = hash.0;
        let mut rng = StdRng::from_seed(seed);
        let vector: Vec<f32> = (0..self.dimension)
            .map(|_| rng.random_range(-1.0f32..1.0f32))
            .collect();
        normalize(vector)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Content-hash cache wrapper, keyed `(model_id, content_hash)` — matches the
/// cache-by-key idiom in `core/app_state.rs` (two `moka::future::Cache`s).
pub struct CachedEmbedder<E: Embedder> {
    inner: E,
    cache: Cache<(String, ContentHash), Vec<f32>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(100_000).build(),
        }
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        let mut misses: Vec<(usize, String)> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let key = (self.model_id().to_string(), ContentHash::of(text.as_bytes()));
            match self.cache.get(&key).await {
                Some(vector) => out.push(Some(vector)),
                None => {
                    out.push(None);
                    misses.push((i, text.clone()));
                }
            }
        }
        if !misses.is_empty() {
            let miss_texts: Vec<String> = misses.iter().map(|(_, t)| t.clone()).collect();
            let computed = self.inner.embed(&miss_texts).await?;
            for ((i, text), vector) in misses.into_iter().zip(computed.into_iter()) {
                let key = (self.model_id().to_string(), ContentHash::of(text.as_bytes()));
                self.cache.insert(key, vector.clone()).await;
                out[i] = Some(vector);
            }
        }
        Ok(out.into_iter().map(|v| v.expect("filled above")).collect())
    }

    /// Not cached: queries are rarely repeated verbatim across a run, and
    /// forwarding to `inner` (rather than `self.embed`) preserves any
    /// query/document prefix distinction the wrapped embedder applies.
    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.inner.embed_query(text).await
    }
}

pub type SharedEmbedder = Arc<dyn Embedder>;
