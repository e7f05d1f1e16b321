//! Full-pipeline scenarios built from synthetic `Page`/`SimResult` data
//! (no live network fetch), driving chunking, retrieval, pillar analysis,
//! and scoring the same way `pipeline::run_pipeline` wires them together.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use findable_score::embedder::{CachedEmbedder, Embedder, MockEmbedder};
use findable_score::fixes::generate_fixes;
use findable_score::ids::{PageId, QuestionId, RunId, SiteId};
use findable_score::pillars::{run_all, PillarInput};
use findable_score::questions::build_question_suite;
use findable_score::retriever::Retriever;
use findable_score::robots::{RobotsResult, RobotsTxt};
use findable_score::score::calculate;
use findable_score::simulator::simulate_question;
use findable_score::types::{
    Answerability, CalibrationConfig, ContentHash, FindabilityLevel, Heading, Page, PageLinks,
    QuestionSource, RetrievedChunk, SchemaObject, SchemaType, Site, Timing,
};

fn blank_page(extracted_text: &str) -> Page {
    Page {
        page_id: PageId::new(),
        run_id: RunId::new(),
        url: "https://acme.example/".to_string(),
        depth: 0,
        status_code: 200,
        raw_html_ref: None,
        extracted_text: extracted_text.to_string(),
        title: Some("Acme".to_string()),
        meta_description: None,
        language: Some("en".to_string()),
        headings: vec![],
        schema: vec![],
        links: PageLinks { internal: vec![], external: vec![] },
        timing: Timing { ttfb_ms: 200 },
        content_hash: ContentHash::of(extracted_text.as_bytes()),
        author: None,
        date_modified: None,
        is_https: true,
        has_framework_markers: false,
        code_block_count: 0,
        list_count: 0,
        table_count: 0,
    }
}

fn sim_result(answerability: Answerability, rrf_score: Option<f64>) -> findable_score::types::SimResult {
    findable_score::types::SimResult {
        question_id: QuestionId::new(),
        run_id: RunId::new(),
        retrieved: match rrf_score {
            Some(score) => vec![RetrievedChunk { chunk_id: findable_score::ids::ChunkId::new(), rrf_score: score }],
            None => vec![],
        },
        signals_found: 0,
        signals_total: 0,
        answerability,
        confidence: 0.5,
        score: 0.0,
    }
}

/// A single well-rounded page: authored, schema-rich, properly headed,
/// linked, and tabled content, paired with a mixed-outcome question suite.
/// Hand-derived totals (see the arithmetic in each pillar module): Technical
/// raw ~99.0, Structure raw 87.5, Schema raw 100.0, Authority raw 100.0,
/// Retrieval raw 60.0 (synthetic relevance plus the single-page source-
/// diversity floor), Coverage raw 60.0 (synthetic) -> total score ~83.3
/// against `CalibrationConfig::default_active`'s weights.
#[test]
fn rich_well_structured_site_lands_in_highly_findable_range() {
    let p1 = "The ceo of Acme Software leads distributed engineering teams worldwide. \
Every release ships with automated tests, audit trails, and rollback safeguards built in. \
Teams scale from ten engineers to a thousand without losing visibility into shipped work. \
Our analysis shows consistent weekly deployment gains.";
    let p2 = "Pricing starts at twenty nine dollars per month for the Starter plan. \
It scales to one hundred ninety nine dollars monthly for Enterprise with dedicated support.";
    let extracted_text = format!("{p1}\n\n{p2}");

    let mut page = blank_page(&extracted_text);
    page.headings = vec![
        Heading { level: 1, text: "Acme Software".to_string() },
        Heading { level: 2, text: "Pricing".to_string() },
        Heading { level: 2, text: "FAQ".to_string() },
    ];
    page.schema = vec![
        SchemaObject { schema_type: SchemaType::FaqPage, valid: true, raw: serde_json::json!({}), has_author: false, has_date_modified: false },
        SchemaObject { schema_type: SchemaType::Article, valid: true, raw: serde_json::json!({}), has_author: true, has_date_modified: true },
        SchemaObject { schema_type: SchemaType::Organization, valid: true, raw: serde_json::json!({}), has_author: false, has_date_modified: false },
        SchemaObject { schema_type: SchemaType::HowTo, valid: true, raw: serde_json::json!({}), has_author: false, has_date_modified: false },
    ];
    page.links = PageLinks {
        internal: (0..7).map(|i| format!("https://acme.example/page{i}")).collect(),
        external: vec!["https://en.wikipedia.org/wiki/Acme".to_string()],
    };
    page.timing = Timing { ttfb_ms: 50 };
    page.table_count = 1;
    page.list_count = 1;
    page.author = Some("Jane Doe".to_string());
    page.date_modified = Some(Utc::now());

    let robots_result = RobotsResult { search_indexed_score: 100.0, direct_crawl_score: 100.0 };

    let sim_results = vec![
        sim_result(Answerability::FullyAnswerable, Some(0.01)),
        sim_result(Answerability::FullyAnswerable, Some(0.01)),
        sim_result(Answerability::FullyAnswerable, Some(0.01)),
        sim_result(Answerability::FullyAnswerable, Some(0.01)),
        sim_result(Answerability::FullyAnswerable, Some(0.01)),
        sim_result(Answerability::PartiallyAnswerable, Some(0.01)),
        sim_result(Answerability::PartiallyAnswerable, Some(0.01)),
        sim_result(Answerability::Unanswered, Some(0.01)),
        sim_result(Answerability::Unanswered, Some(0.01)),
        sim_result(Answerability::Unanswered, Some(0.01)),
    ];

    let pages = vec![page];
    let input = PillarInput {
        pages: &pages,
        robots_result: Some(&robots_result),
        llms_txt_present: true,
        sim_results: &sim_results,
        total_questions: 10,
    };

    let run_id = RunId::new();
    let pillar_scores = run_all(run_id, &input, false);

    let technical = pillar_scores.iter().find(|p| p.pillar == findable_score::types::Pillar::Technical).unwrap();
    assert!((technical.raw - 99.0).abs() < 0.5, "technical raw was {}", technical.raw);

    let structure = pillar_scores.iter().find(|p| p.pillar == findable_score::types::Pillar::Structure).unwrap();
    assert!((structure.raw - 87.5).abs() < 0.5, "structure raw was {}", structure.raw);

    let schema = pillar_scores.iter().find(|p| p.pillar == findable_score::types::Pillar::Schema).unwrap();
    assert!((schema.raw - 100.0).abs() < 0.01, "schema raw was {}", schema.raw);

    let authority = pillar_scores.iter().find(|p| p.pillar == findable_score::types::Pillar::Authority).unwrap();
    assert!(authority.raw > 99.0, "authority raw was {}", authority.raw);

    let calibration = CalibrationConfig::default_active();
    let result = calculate(&calibration, pillar_scores);

    assert!((result.total_score - 83.3).abs() < 1.0, "total score was {}", result.total_score);
    assert_eq!(result.level, FindabilityLevel::HighlyFindable);
    assert!(result.evaluated_max.is_none());
}

/// An empty SPA shell: no server-rendered text, framework markers present.
/// The Technical pillar applies its strong-negative empty-shell penalty and
/// the top generated fix is to add server-side rendering.
#[test]
fn empty_spa_shell_stays_low_and_recommends_ssr() {
    let mut page = blank_page("");
    page.has_framework_markers = true;
    page.timing = Timing { ttfb_ms: 800 };

    let pages = vec![page];
    let input = PillarInput {
        pages: &pages,
        robots_result: None,
        llms_txt_present: false,
        sim_results: &[],
        total_questions: 0,
    };

    let run_id = RunId::new();
    let technical = findable_score::pillars::technical::analyze(run_id, &input);
    assert!(technical.raw < 50.0, "technical raw was {}", technical.raw);
    assert!(technical.issues.iter().any(|i| i.code == "empty_shell_detected"));

    let fixes = generate_fixes(std::slice::from_ref(&technical), &[], &[]);
    let top_fix = fixes.iter().find(|f| f.priority == 1).expect("empty shell should yield a priority-1 fix");
    assert_eq!(top_fix.title, "Implement server-side rendering");
}

/// No pages crawled at all: every per-page pillar floors at 0, leaving only
/// the robots-default technical credit, so the Run lands at the very bottom
/// of the findability scale.
#[test]
fn zero_pages_yields_floor_score_and_not_yet_findable() {
    let input = PillarInput {
        pages: &[],
        robots_result: None,
        llms_txt_present: false,
        sim_results: &[],
        total_questions: 0,
    };
    let run_id = RunId::new();
    let pillar_scores = run_all(run_id, &input, false);
    let calibration = CalibrationConfig::default_active();
    let result = calculate(&calibration, pillar_scores);

    assert!(result.total_score < 10.0, "total score was {}", result.total_score);
    assert_eq!(result.level, FindabilityLevel::NotYetFindable);
}

/// robots.txt disallows every AI crawler by name but allows every search
/// crawler: the combined score is the documented 0.6/0.4 blend (60.0), which
/// keeps the Technical pillar at "partial" rather than collapsing it the way
/// a full site-wide disallow would.
#[test]
fn blocking_ai_crawlers_but_not_search_keeps_technical_partial() {
    let mixed_robots = RobotsTxt::parse(
        "User-agent: Googlebot\nAllow: /\n\n\
         User-agent: Bingbot\nAllow: /\n\n\
         User-agent: Applebot\nAllow: /\n\n\
         User-agent: GPTBot\nDisallow: /\n\n\
         User-agent: ClaudeBot\nDisallow: /\n\n\
         User-agent: anthropic-ai\nDisallow: /\n\n\
         User-agent: PerplexityBot\nDisallow: /\n\n\
         User-agent: Google-Extended\nDisallow: /\n\n\
         User-agent: CCBot\nDisallow: /\n",
    );
    let mixed_result = RobotsResult::from_robots(&mixed_robots);
    assert_eq!(mixed_result.search_indexed_score, 100.0);
    assert_eq!(mixed_result.direct_crawl_score, 0.0);
    assert_eq!(mixed_result.combined_score(), 60.0);

    let mut healthy_page = blank_page(&"word ".repeat(200));
    healthy_page.timing = Timing { ttfb_ms: 300 };

    let pages = vec![healthy_page];
    let mixed_input = PillarInput {
        pages: &pages,
        robots_result: Some(&mixed_result),
        llms_txt_present: false,
        sim_results: &[],
        total_questions: 0,
    };
    let mixed_technical = findable_score::pillars::technical::analyze(RunId::new(), &mixed_input);
    assert!(!mixed_technical.issues.iter().any(|i| i.code == "robots_blocks_ai_crawlers"));
    assert_eq!(mixed_technical.level, findable_score::types::ProgressLevel::Partial);

    let blocked_everywhere = RobotsResult { search_indexed_score: 0.0, direct_crawl_score: 0.0 };
    let blocked_input = PillarInput {
        pages: &pages,
        robots_result: Some(&blocked_everywhere),
        llms_txt_present: false,
        sim_results: &[],
        total_questions: 0,
    };
    let blocked_technical = findable_score::pillars::technical::analyze(RunId::new(), &blocked_input);
    assert!(blocked_technical.issues.iter().any(|i| i.code == "robots_blocks_ai_crawlers"));
    assert!(blocked_technical.raw < mixed_technical.raw);
}

/// Crawling, chunking, embedding, retrieving, and simulating the exact same
/// page and question twice must produce bit-identical results end to end —
/// there is no hidden clock or RNG anywhere in this path.
#[tokio::test]
async fn identical_content_simulated_twice_yields_identical_results() {
    let site = Site {
        site_id: SiteId::new(),
        domain: "acme.example".to_string(),
        business_model: None,
        competitors: vec!["rival.example".to_string()],
        plan_caps: None,
    };
    let questions = build_question_suite(&site, &[]);
    let question = questions.iter().find(|q| q.source == QuestionSource::Universal).unwrap();

    let page_text = "Acme Software is based in Austin, Texas. Call us at +1 512-555-0134 \
or email hello@acme.example for support. Plans start at $29 per month.";
    let page_id = PageId::new();
    let chunks = findable_score::chunker::chunk_page(page_id, page_text, &[]);

    async fn run_once(
        chunks: &[findable_score::types::Chunk],
        question: &findable_score::types::Question,
    ) -> findable_score::types::SimResult {
        let embedder: Arc<dyn Embedder> = Arc::new(CachedEmbedder::new(MockEmbedder::default()));
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await.unwrap();
        let embeddings: Vec<_> = chunks
            .iter()
            .zip(vectors)
            .map(|(c, v)| (c.chunk_id, v, embedder.model_id().to_string()))
            .collect();
        let retriever = Retriever::new(chunks, &embeddings, embedder);
        let chunks_by_id: HashMap<_, _> = chunks.iter().map(|c| (c.chunk_id, c)).collect();
        let thresholds = findable_score::types::CalibrationThresholds::default();
        simulate_question(question, &retriever, &chunks_by_id, &thresholds, RunId::new())
            .await
            .unwrap()
    }

    let first = run_once(&chunks, question).await;
    let second = run_once(&chunks, question).await;

    assert_eq!(first.answerability, second.answerability);
    assert!((first.score - second.score).abs() < 1e-12);
    assert!((first.confidence - second.confidence).abs() < 1e-12);
    assert_eq!(first.signals_found, second.signals_found);
}

/// A minimal single-page bakery site: plain prose, no headings, no schema,
/// no byline, a couple of internal links, and a mixed-outcome question
/// suite skewed toward unanswered. Hand-derived raws: Technical ~67
/// (partial — slow TTFB, no llms.txt), Structure ~34 (limited — no H1, no
/// FAQ), Schema 0 (limited), Authority 0 (limited — no author, no
/// freshness), Retrieval ~44 (one page, mixed relevance), Coverage 30
/// (6 of 20 questions, half-credit for partials) -> total ~34.2, squarely
/// in the documented 28-35 "Not Yet Findable" range for this scenario.
#[test]
fn minimal_single_page_bakery_site_lands_not_yet_findable() {
    let mut page = blank_page(
        "Sunrise Bakery bakes fresh bread and pastries every morning in downtown Springfield. \
Stop by for warm croissants, sourdough loaves, and seasonal fruit pies baked fresh daily.",
    );
    page.timing = Timing { ttfb_ms: 900 };
    page.links = PageLinks {
        internal: vec!["https://sunrise.example/about".to_string(), "https://sunrise.example/contact".to_string()],
        external: vec![],
    };

    let pages = vec![page];

    let mut sim_results = vec![sim_result(Answerability::FullyAnswerable, Some(0.02))];
    sim_results.extend((0..10).map(|_| sim_result(Answerability::PartiallyAnswerable, Some(0.01))));
    sim_results.extend((0..9).map(|_| sim_result(Answerability::Unanswered, None)));
    assert_eq!(sim_results.len(), 20);

    let input = PillarInput {
        pages: &pages,
        robots_result: None,
        llms_txt_present: false,
        sim_results: &sim_results,
        total_questions: 20,
    };

    let run_id = RunId::new();
    let pillar_scores = run_all(run_id, &input, false);

    let get = |pillar: findable_score::types::Pillar| {
        pillar_scores.iter().find(|p| p.pillar == pillar).unwrap()
    };

    let technical = get(findable_score::types::Pillar::Technical);
    assert_eq!(technical.level, findable_score::types::ProgressLevel::Partial, "technical raw was {}", technical.raw);

    let structure = get(findable_score::types::Pillar::Structure);
    assert_eq!(structure.level, findable_score::types::ProgressLevel::Limited, "structure raw was {}", structure.raw);
    assert!(structure.issues.iter().any(|i| i.code == "missing_faq_section"));

    let schema = get(findable_score::types::Pillar::Schema);
    assert_eq!(schema.raw, 0.0);
    assert_eq!(schema.level, findable_score::types::ProgressLevel::Limited);

    let authority = get(findable_score::types::Pillar::Authority);
    assert_eq!(authority.raw, 0.0);
    assert_eq!(authority.level, findable_score::types::ProgressLevel::Limited);
    assert!(authority.issues.iter().any(|i| i.code == "missing_author_bylines"));

    let retrieval = get(findable_score::types::Pillar::Retrieval);
    assert!(retrieval.raw > 0.0, "retrieval raw was {}", retrieval.raw);

    let coverage = get(findable_score::types::Pillar::Coverage);
    assert!((coverage.raw - 30.0).abs() < 0.01, "coverage raw was {}", coverage.raw);

    let calibration = CalibrationConfig::default_active();
    let result = calculate(&calibration, pillar_scores);

    assert!(result.total_score >= 28.0 && result.total_score <= 35.0, "total score was {}", result.total_score);
    assert_eq!(result.level, FindabilityLevel::NotYetFindable);
}

/// Every question comes back unanswered (no retrieval hits at all): the
/// score must stay finite, land at the very bottom of the scale, and still
/// produce a sensible (non-empty, non-`NaN`) fix plan rather than panicking
/// on an all-zero denominator anywhere in the chain.
#[test]
fn all_questions_unanswerable_yields_bottom_score_and_sane_fix_plan() {
    let mut page = blank_page("");
    page.timing = Timing { ttfb_ms: 1500 };
    page.is_https = false;
    let pages = vec![page];

    let blocked_everywhere = RobotsResult { search_indexed_score: 0.0, direct_crawl_score: 0.0 };
    let sim_results: Vec<_> = (0..10).map(|_| sim_result(Answerability::Unanswered, None)).collect();

    let input = PillarInput {
        pages: &pages,
        robots_result: Some(&blocked_everywhere),
        llms_txt_present: false,
        sim_results: &sim_results,
        total_questions: 10,
    };

    let run_id = RunId::new();
    let pillar_scores = run_all(run_id, &input, false);

    for score in &pillar_scores {
        assert!(!score.raw.is_nan(), "{:?} raw was NaN", score.pillar);
    }

    let calibration = CalibrationConfig::default_active();
    let result = calculate(&calibration, pillar_scores.clone());

    assert!(!result.total_score.is_nan());
    assert!((0.0..=10.0).contains(&result.total_score), "total score was {}", result.total_score);
    assert_eq!(result.level, FindabilityLevel::NotYetFindable);

    let fixes = generate_fixes(&pillar_scores, &sim_results, &[]);
    assert!(!fixes.is_empty(), "an unfindable site should still generate a fix plan");
    for fix in &fixes {
        assert!(!fix.estimated_impact_points.is_nan());
    }
}
