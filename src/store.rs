//! The `Store` collaborator — persistence is an external concern;
//! the core only consumes this trait. Mirrors the capability-trait
//! idiom in `tools/search/service.rs`'s `SearchService`: a plain
//! `#[async_trait]`, no base class.

use crate::ids::{ChunkId, PageId, QuestionId, RunId, SiteId};
use crate::types::{
    CalibrationConfig, CalibrationSample, Chunk, Embedding, Page, PillarScore, Report,
    RunProgress, RunStatus, Site, SimResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin_run(&self, site: &Site, config: CalibrationConfig) -> anyhow::Result<RunId>;
    async fn update_run_status(
        &self,
        run_id: RunId,
        status: RunStatus,
        progress: RunProgress,
    ) -> anyhow::Result<()>;
    async fn put_page(&self, page: Page) -> anyhow::Result<()>;
    async fn put_chunk(&self, chunk: Chunk) -> anyhow::Result<()>;
    async fn put_embedding(&self, embedding: Embedding) -> anyhow::Result<()>;
    async fn put_sim_result(&self, result: SimResult) -> anyhow::Result<()>;
    async fn put_pillar_score(&self, score: PillarScore) -> anyhow::Result<()>;
    async fn put_report(&self, report: Report) -> anyhow::Result<()>;
    async fn get_active_calibration_config(&self) -> anyhow::Result<CalibrationConfig>;
    async fn put_calibration_sample(&self, sample: CalibrationSample) -> anyhow::Result<()>;

    async fn get_pages(&self, run_id: RunId) -> anyhow::Result<Vec<Page>>;
    async fn get_chunks(&self, run_id: RunId) -> anyhow::Result<Vec<Chunk>>;
    async fn get_embeddings(&self, run_id: RunId) -> anyhow::Result<Vec<Embedding>>;
}

/// Reference implementation sufficient to drive the pipeline standalone and
/// in tests — not a production persistence layer.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<InMemoryInner>,
}

#[derive(Default)]
struct InMemoryInner {
    runs: HashMap<RunId, (RunStatus, RunProgress)>,
    pages: HashMap<RunId, Vec<Page>>,
    chunks: HashMap<RunId, Vec<Chunk>>,
    embeddings: HashMap<RunId, Vec<Embedding>>,
    sim_results: Vec<SimResult>,
    pillar_scores: Vec<PillarScore>,
    reports: Vec<Report>,
    calibration_samples: Vec<CalibrationSample>,
    active_config: Option<CalibrationConfig>,
    page_to_run: HashMap<PageId, RunId>,
    chunk_to_run: HashMap<ChunkId, RunId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active_config(config: CalibrationConfig) -> Self {
        let store = Self::new();
        store.inner.blocking_write().active_config = Some(config);
        store
    }

    #[allow(dead_code)]
    fn lookup_run_for_question(&self, _question_id: QuestionId) -> Option<RunId> {
        None
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin_run(&self, _site: &Site, config: CalibrationConfig) -> anyhow::Result<RunId> {
        let run_id = RunId::new();
        let mut inner = self.inner.write().await;
        inner
            .runs
            .insert(run_id, (RunStatus::Queued, RunProgress::default()));
        if inner.active_config.is_none() {
            inner.active_config = Some(config);
        }
        Ok(run_id)
    }

    async fn update_run_status(
        &self,
        run_id: RunId,
        status: RunStatus,
        progress: RunProgress,
    ) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.runs.insert(run_id, (status, progress));
        Ok(())
    }

    async fn put_page(&self, page: Page) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.page_to_run.insert(page.page_id, page.run_id);
        inner.pages.entry(page.run_id).or_default().push(page);
        Ok(())
    }

    async fn put_chunk(&self, chunk: Chunk) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        let run_id = *inner
            .page_to_run
            .get(&chunk.page_id)
            .expect("chunk references an unknown page");
        inner.chunk_to_run.insert(chunk.chunk_id, run_id);
        inner.chunks.entry(run_id).or_default().push(chunk);
        Ok(())
    }

    async fn put_embedding(&self, embedding: Embedding) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        let run_id = *inner
            .chunk_to_run
            .get(&embedding.chunk_id)
            .expect("embedding references an unknown chunk");
        inner.embeddings.entry(run_id).or_default().push(embedding);
        Ok(())
    }

    async fn put_sim_result(&self, result: SimResult) -> anyhow::Result<()> {
        self.inner.write().await.sim_results.push(result);
        Ok(())
    }

    async fn put_pillar_score(&self, score: PillarScore) -> anyhow::Result<()> {
        self.inner.write().await.pillar_scores.push(score);
        Ok(())
    }

    async fn put_report(&self, report: Report) -> anyhow::Result<()> {
        self.inner.write().await.reports.push(report);
        Ok(())
    }

    async fn get_active_calibration_config(&self) -> anyhow::Result<CalibrationConfig> {
        let inner = self.inner.read().await;
        Ok(inner
            .active_config
            .clone()
            .unwrap_or_else(CalibrationConfig::default_active))
    }

    async fn put_calibration_sample(&self, sample: CalibrationSample) -> anyhow::Result<()> {
        self.inner.write().await.calibration_samples.push(sample);
        Ok(())
    }

    async fn get_pages(&self, run_id: RunId) -> anyhow::Result<Vec<Page>> {
        Ok(self
            .inner
            .read()
            .await
            .pages
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_chunks(&self, run_id: RunId) -> anyhow::Result<Vec<Chunk>> {
        Ok(self
            .inner
            .read()
            .await
            .chunks
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_embeddings(&self, run_id: RunId) -> anyhow::Result<Vec<Embedding>> {
        Ok(self
            .inner
            .read()
            .await
            .embeddings
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }
}
