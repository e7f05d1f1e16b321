//! Authority pillar: bylines, credentials, citations, freshness, original data.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Issue, Page, Pillar, PillarScore, ProgressLevel};
use chrono::Utc;

const CREDENTIAL_MARKERS: &[&str] = &["phd", "md", "mba", "founder", "ceo", "director", "professor", "certified"];
const ORIGINAL_DATA_MARKERS: &[&str] = &["we surveyed", "our analysis", "we analyzed", "our research", "we found that", "our data shows"];
const AUTHORITATIVE_DOMAINS: &[&str] = &[".gov", ".edu", "wikipedia.org", "reuters.com", "nature.com"];

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let pages = input.pages;
    let mut issues = Vec::new();

    let byline_score = ratio_score(pages, |p| p.author.is_some());
    let credentials_score = ratio_score(pages, |p| has_marker(&p.extracted_text, CREDENTIAL_MARKERS));
    let citation_score = ratio_score(pages, has_authoritative_citation);
    let freshness_score = avg_score(pages, freshness_for_page);
    let original_data_score = ratio_score(pages, |p| has_marker(&p.extracted_text, ORIGINAL_DATA_MARKERS));

    if byline_score < 50.0 {
        issues.push(Issue {
            code: "missing_author_bylines".to_string(),
            level: ProgressLevel::from_raw(byline_score),
            message: "most pages carry no identifiable author".to_string(),
        });
    }
    if freshness_score < 50.0 {
        issues.push(Issue {
            code: "stale_content".to_string(),
            level: ProgressLevel::from_raw(freshness_score),
            message: "content has not been updated recently".to_string(),
        });
    }

    let components = vec![
        component("author_byline_ratio", 27.0, byline_score),
        component("credentials", 20.0, credentials_score),
        component("primary_source_citations", 20.0, citation_score),
        component("content_freshness", 20.0, freshness_score),
        component("original_data_markers", 13.0, original_data_score),
    ];

    finalize(run_id, Pillar::Authority, components, issues)
}

fn ratio_score(pages: &[Page], predicate: impl Fn(&Page) -> bool) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let matching = pages.iter().filter(|p| predicate(p)).count();
    100.0 * matching as f64 / pages.len() as f64
}

fn avg_score(pages: &[Page], f: impl Fn(&Page) -> f64) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    pages.iter().map(f).sum::<f64>() / pages.len() as f64
}

fn has_marker(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

fn has_authoritative_citation(page: &Page) -> bool {
    let lower = page.extracted_text.to_lowercase();
    page.links
        .external
        .iter()
        .any(|l| AUTHORITATIVE_DOMAINS.iter().any(|d| l.contains(d)))
        || AUTHORITATIVE_DOMAINS.iter().any(|d| lower.contains(d))
}

/// Linear decay to 0 at 24 months; pages with no `date_modified` score 0.
fn freshness_for_page(page: &Page) -> f64 {
    let Some(modified) = page.date_modified else {
        return 0.0;
    };
    let days = (Utc::now() - modified).num_days().max(0) as f64;
    let months = days / 30.0;
    (100.0 - (months / 24.0) * 100.0).clamp(0.0, 100.0)
}
