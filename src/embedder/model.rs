//! Model-backed embedder (BGE-family, 384/768 dim) behind the
//! `model-embedder` feature — off by default; the deterministic mock is
//! sufficient for the pipeline's own tests. `fastembed` is pulled in fresh
//! for this (the prior embedding story wired to `model2vec-rs` + LanceDB
//! is dropped here — see `DESIGN.md`).

use super::{normalize, Embedder};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

pub struct ModelEmbedder {
    model_id: String,
    dimension: usize,
    inner: Mutex<TextEmbedding>,
}

impl ModelEmbedder {
    pub fn new() -> anyhow::Result<Self> {
        let inner = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )?;
        Ok(Self {
            model_id: "bge-small-en-v1.5".to_string(),
            dimension: 384,
            inner: Mutex::new(inner),
        })
    }

}

#[async_trait]
impl Embedder for ModelEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut inner = self.inner.lock().await;
        let vectors = inner.embed(texts.to_vec(), None)?;
        Ok(vectors.into_iter().map(normalize).collect())
    }

    /// BGE models distinguish query vs document embeddings via a prefix on
    /// the query side; applying the wrong prefix mismatches the embedding
    /// space, which is the exact failure mode `Retriever::new` treats as a
    /// construction-time error.
    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let prefixed = format!("query: {text}");
        let mut inner = self.inner.lock().await;
        let mut vectors = inner.embed(vec![prefixed], None)?;
        Ok(normalize(vectors.remove(0)))
    }
}
