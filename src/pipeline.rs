//! Top-level Run orchestrator: sequences every stage and
//! persists artifacts via `Store` as each one completes. The sequence
//! itself is built fresh, grounded on the `AppState`-driven request
//! lifecycle for the persistence-after-each-step idiom and
//! `tokio::time::timeout` deadline handling.

use crate::calibration::classify_outcome;
use crate::chunker::chunk_page;
use crate::config::FindableConfig;
use crate::crawler::{crawl_site, CrawlConfig};
use crate::embedder::{CachedEmbedder, Embedder, MockEmbedder, SharedEmbedder};
use crate::error::{CrawlError, FindableError};
use crate::fetcher::{Fetcher, FetcherConfig, SharedFetcher};
use crate::fixes::{build_action_center, generate_fixes};
use crate::ids::{ChunkId, PageId, RunId};
use crate::observer::{NullObserver, Observer};
use crate::pillars::{run_all, PillarInput};
use crate::questions::build_question_suite;
use crate::retriever::Retriever;
use crate::robots::{RobotsCache, RobotsResult};
use crate::score::calculate;
use crate::simulator::simulate_question;
use crate::store::Store;
use crate::types::{Chunk, Embedding, Fix, Page, Report, RunProgress, RunStatus, Site};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct PipelineDeps {
    pub store: Arc<dyn Store>,
    pub embedder: SharedEmbedder,
    pub observer: Arc<dyn Observer>,
}

impl PipelineDeps {
    /// Wires an `InMemoryStore` + content-hash-cached `MockEmbedder` +
    /// `NullObserver` — the default standalone configuration (no
    /// `model-embedder` feature, no live observation).
    pub fn standalone() -> Self {
        Self {
            store: Arc::new(crate::store::InMemoryStore::new()),
            embedder: Arc::new(CachedEmbedder::new(MockEmbedder::default())),
            observer: Arc::new(NullObserver),
        }
    }
}

/// Runs one full audit for `site` starting at `start_url`, returning the
/// final `Report`. Every stage persists through `deps.store` as it
/// completes, so a caller inspecting the store mid-run sees partial
/// progress.
pub async fn run_pipeline(
    deps: &PipelineDeps,
    site: &Site,
    start_url: &str,
    config: &FindableConfig,
) -> Result<Report, FindableError> {
    let calibration = deps
        .store
        .get_active_calibration_config()
        .await
        .map_err(FindableError::Other)?;
    calibration.validate()?;

    let run_id = deps
        .store
        .begin_run(site, calibration.clone())
        .await
        .map_err(FindableError::Other)?;

    let deadline = Duration::from_secs(config.run_deadline_secs);
    let result = tokio::time::timeout(deadline, execute_stages(deps, run_id, site, start_url, config, &calibration)).await;

    match result {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(err)) => {
            deps.store
                .update_run_status(run_id, RunStatus::Failed, RunProgress { step: "failed".into(), ..Default::default() })
                .await
                .ok();
            Err(err)
        }
        Err(_elapsed) => {
            warn!(%run_id, "run deadline exceeded, marking partial");
            deps.store
                .update_run_status(run_id, RunStatus::Canceled, RunProgress { step: "deadline_exceeded".into(), ..Default::default() })
                .await
                .ok();
            Err(FindableError::Other(anyhow::anyhow!("run {run_id} exceeded its deadline")))
        }
    }
}

async fn execute_stages(
    deps: &PipelineDeps,
    run_id: RunId,
    site: &Site,
    start_url: &str,
    config: &FindableConfig,
    calibration: &crate::types::CalibrationConfig,
) -> Result<Report, FindableError> {
    deps.store
        .update_run_status(run_id, RunStatus::Running, RunProgress { step: "crawling".into(), ..Default::default() })
        .await
        .ok();

    // --- Crawl ---
    let fetcher: SharedFetcher = Arc::new(Fetcher::new(FetcherConfig {
        total_timeout: Duration::from_secs(config.fetch_timeout_secs),
        max_content_length: config.max_content_length_bytes,
        ..FetcherConfig::default()
    }));
    let robots_cache = RobotsCache::new();

    let crawl_outcome = crawl_site(
        &fetcher,
        &robots_cache,
        "FindableScoreBot",
        start_url,
        CrawlConfig {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            concurrency: config.concurrency,
            ..CrawlConfig::default()
        },
    )
    .await;

    let crawl_outcome = match crawl_outcome {
        Ok(outcome) => outcome,
        Err(CrawlError::ZeroPagesCrawled) => {
            let report = zero_pages_report(run_id);
            deps.store.put_report(report.clone()).await.map_err(FindableError::Other)?;
            deps.store
                .update_run_status(run_id, RunStatus::Failed, RunProgress { step: "zero_pages".into(), ..Default::default() })
                .await
                .ok();
            return Ok(report);
        }
        Err(other) => return Err(FindableError::Crawl(other)),
    };

    let robots_result = robots_result_for(&robots_cache, start_url).await;
    let urls_blocked = crawl_outcome.urls_blocked;
    let urls_failed = crawl_outcome.urls_failed;

    let mut pages: Vec<Page> = Vec::with_capacity(crawl_outcome.pages.len());
    for extracted in crawl_outcome.pages {
        let page = extracted.into_page(PageId::new(), run_id);
        deps.store.put_page(page.clone()).await.map_err(FindableError::Other)?;
        pages.push(page);
    }

    deps.store
        .update_run_status(
            run_id,
            RunStatus::Running,
            RunProgress { step: "chunking".into(), pages: pages.len(), chunks: 0, questions: 0 },
        )
        .await
        .ok();

    // --- Chunk ---
    let mut chunks: Vec<Chunk> = Vec::new();
    for page in &pages {
        let page_chunks = chunk_page(page.page_id, &page.extracted_text, &page.headings);
        for chunk in page_chunks {
            deps.store.put_chunk(chunk.clone()).await.map_err(FindableError::Other)?;
            chunks.push(chunk);
        }
    }

    deps.store
        .update_run_status(
            run_id,
            RunStatus::Running,
            RunProgress { step: "embedding".into(), pages: pages.len(), chunks: chunks.len(), questions: 0 },
        )
        .await
        .ok();

    // --- Embed ---
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = deps.embedder.embed(&texts).await.map_err(FindableError::Other)?;
    let mut embeddings: Vec<Embedding> = Vec::with_capacity(chunks.len());
    for (chunk, vector) in chunks.iter().zip(vectors.into_iter()) {
        let embedding = Embedding {
            chunk_id: chunk.chunk_id,
            model_id: deps.embedder.model_id().to_string(),
            vector,
        };
        deps.store.put_embedding(embedding.clone()).await.map_err(FindableError::Other)?;
        embeddings.push(embedding);
    }

    // --- Index + Retrieve ---
    let embedding_tuples: Vec<(ChunkId, Vec<f32>, String)> = embeddings
        .iter()
        .map(|e| (e.chunk_id, e.vector.clone(), e.model_id.clone()))
        .collect();
    let retriever = Retriever::new(&chunks, &embedding_tuples, Arc::clone(&deps.embedder));
    let chunks_by_id: HashMap<ChunkId, &Chunk> = chunks.iter().map(|c| (c.chunk_id, c)).collect();

    // --- Question Suite + Simulation ---
    let questions = build_question_suite(site, &[]);
    deps.store
        .update_run_status(
            run_id,
            RunStatus::Running,
            RunProgress { step: "simulating".into(), pages: pages.len(), chunks: chunks.len(), questions: questions.len() },
        )
        .await
        .ok();

    let mut sim_results = Vec::with_capacity(questions.len());
    for question in &questions {
        let sim_result = match simulate_question(question, &retriever, &chunks_by_id, &calibration.thresholds, run_id).await {
            Ok(result) => result,
            Err(_) => crate::types::SimResult {
                question_id: question.question_id,
                run_id,
                retrieved: vec![],
                signals_found: 0,
                signals_total: question.expected_signals.len(),
                answerability: crate::types::Answerability::Unanswered,
                confidence: 0.0,
                score: 0.0,
            },
        };
        deps.store.put_sim_result(sim_result.clone()).await.map_err(FindableError::Other)?;
        sim_results.push(sim_result);
    }

    // --- Observation (optional) ---
    let observation_cap_exceeded = if config.include_observation {
        run_observation(deps, run_id, &questions, &sim_results, config).await
    } else {
        false
    };

    // --- Pillar Analyzers ---
    let llms_txt_present = has_llms_txt(&pages);
    let pillar_input = PillarInput {
        pages: &pages,
        robots_result: robots_result.as_ref(),
        llms_txt_present,
        sim_results: &sim_results,
        total_questions: questions.len(),
    };
    let entity_recognition_enabled = calibration.weights.contains_key(&crate::types::Pillar::EntityRecognition);
    let pillar_scores = run_all(run_id, &pillar_input, entity_recognition_enabled);
    for score in &pillar_scores {
        deps.store.put_pillar_score(score.clone()).await.map_err(FindableError::Other)?;
    }

    // --- Score Calculator + Fix Generator ---
    let score_result = calculate(calibration, pillar_scores);
    let fixes: Vec<Fix> = generate_fixes(&score_result.pillar_scores, &sim_results, &questions);
    let action_center = build_action_center(fixes.clone());

    let report = Report {
        run_id,
        total_score: score_result.total_score,
        evaluated_max: score_result.evaluated_max,
        level: score_result.level,
        points_to_milestone: score_result.points_to_milestone,
        pillar_scores: score_result.pillar_scores,
        fixes,
        action_center,
        show_the_math: score_result.show_the_math,
    };
    deps.store.put_report(report.clone()).await.map_err(FindableError::Other)?;

    let final_status = if observation_cap_exceeded || (urls_failed > 0 && urls_blocked + urls_failed >= pages.len()) {
        RunStatus::Partial
    } else {
        RunStatus::Completed
    };
    deps.store
        .update_run_status(
            run_id,
            final_status,
            RunProgress { step: "completed".into(), pages: pages.len(), chunks: chunks.len(), questions: questions.len() },
        )
        .await
        .ok();

    info!(%run_id, total_score = report.total_score, level = ?report.level, "run complete");
    Ok(report)
}

async fn robots_result_for(robots_cache: &RobotsCache, start_url: &str) -> Option<RobotsResult> {
    let host = url::Url::parse(start_url).ok()?.host_str()?.to_string();
    let robots = robots_cache.get_or_parse(&host, || None).await;
    Some(RobotsResult::from_robots(&robots))
}

fn has_llms_txt(_pages: &[Page]) -> bool {
    // No dedicated fetch for llms.txt in this pipeline pass; treated as
    // absent unless a future stage populates it. See DESIGN.md.
    false
}

/// Queries the observer one question at a time so spend can be checked
/// against `config.observation_cost_cap_usd` before each request; stops
/// early (returning `true`) the moment the running total would exceed the
/// cap, leaving later questions with no `CalibrationSample` for this run.
async fn run_observation(
    deps: &PipelineDeps,
    run_id: RunId,
    questions: &[crate::types::Question],
    sim_results: &[crate::types::SimResult],
    config: &FindableConfig,
) -> bool {
    let mut spent_usd = 0.0;

    for (question, sim_result) in questions.iter().zip(sim_results.iter()) {
        if let Some(cap) = config.observation_cost_cap_usd {
            if spent_usd >= cap {
                warn!(%run_id, spent_usd, cap, "observation cost cap reached, stopping early");
                return true;
            }
        }

        let request = crate::observer::ObservationRequest {
            provider: "default".to_string(),
            model: "default".to_string(),
            prompt: question.text.clone(),
        };
        let Ok(responses) = deps.observer.query_ai(vec![request]).await else {
            continue;
        };
        let Some(response) = responses.into_iter().next() else {
            continue;
        };
        spent_usd += response.estimated_cost_usd;

        let observed_citable = !response.text.is_empty() && response.text.to_lowercase().contains(&question.category);
        let outcome = classify_outcome(sim_result.answerability, observed_citable);
        let sample = crate::types::CalibrationSample {
            run_id,
            question_id: question.question_id,
            sim_prediction: sim_result.answerability,
            score: sim_result.score,
            observed_outcome: outcome,
            category: question.category.clone(),
            pillar_scores_snapshot: vec![],
            created_at: chrono::Utc::now(),
        };
        deps.store.put_calibration_sample(sample).await.ok();
    }

    false
}

fn zero_pages_report(run_id: RunId) -> Report {
    Report {
        run_id,
        total_score: 0.0,
        evaluated_max: None,
        level: crate::types::FindabilityLevel::NotYetFindable,
        points_to_milestone: Some(40.0),
        pillar_scores: vec![],
        fixes: vec![Fix {
            reason_code: "site_inaccessible_to_crawlers".to_string(),
            title: "Site appears inaccessible to crawlers".to_string(),
            explanation: "Zero pages could be fetched; check robots.txt, DNS, and server availability.".to_string(),
            scaffold: "[REVIEW_SERVER_AND_ROBOTS_TXT]".to_string(),
            target_url: None,
            priority: 1,
            effort: crate::types::Effort::High,
            estimated_impact_points: 0.0,
            affected_pillar: crate::types::Pillar::Technical,
        }],
        action_center: crate::types::ActionCenter {
            quick_wins: vec![],
            high_priority: vec![],
            by_category: HashMap::new(),
            total_capped_impact_points: 0.0,
        },
        show_the_math: vec![],
    }
}
