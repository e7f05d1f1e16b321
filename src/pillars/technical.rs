//! Technical pillar: robots AI-access, TTFB, llms.txt, non-JS content, HTTPS.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Issue, Pillar, PillarScore, ProgressLevel};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let mut issues = Vec::new();

    let robots_score = input.robots_result.map(|r| r.combined_score()).unwrap_or(100.0);
    if robots_score < 50.0 {
        issues.push(Issue {
            code: "robots_blocks_ai_crawlers".to_string(),
            level: ProgressLevel::from_raw(robots_score),
            message: "robots.txt disallows one or more AI or search crawlers from most of the site".to_string(),
        });
    }

    let ttfb_score = median_ttfb_score(input.pages);

    let llms_txt_score = if input.llms_txt_present { 100.0 } else { 0.0 };
    if !input.llms_txt_present {
        issues.push(Issue {
            code: "missing_llms_txt".to_string(),
            level: ProgressLevel::Limited,
            message: "no llms.txt found at the site root".to_string(),
        });
    }

    let non_js_score = non_js_dependent_score(input.pages);
    let https_score = https_score(input.pages);

    let mut components = vec![
        component("robots_ai_access", 35.0, robots_score),
        component("ttfb", 30.0, ttfb_score),
        component("llms_txt", 15.0, llms_txt_score),
        component("non_js_content", 10.0, non_js_score),
        component("https", 10.0, https_score),
    ];

    if has_empty_shell(input.pages) {
        issues.push(Issue {
            code: "empty_shell_detected".to_string(),
            level: ProgressLevel::Limited,
            message: "pages render almost no text server-side and carry SPA framework markers".to_string(),
        });
        // Strong negative: halve every component's raw contribution rather
        // than a separate weighted term, so the empty-shell penalty can
        // never push total raw above 50 ("strong negative").
        for c in &mut components {
            c.raw *= 0.4;
        }
    }

    finalize(run_id, Pillar::Technical, components, issues)
}

fn median_ttfb_score(pages: &[crate::types::Page]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let mut ttfbs: Vec<u64> = pages.iter().map(|p| p.timing.ttfb_ms).collect();
    ttfbs.sort_unstable();
    let median = ttfbs[ttfbs.len() / 2] as f64;
    // 0ms -> 100, 1500ms -> 0, linear between, clamped.
    (100.0 - (median / 1500.0) * 100.0).clamp(0.0, 100.0)
}

fn non_js_dependent_score(pages: &[crate::types::Page]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let non_empty = pages.iter().filter(|p| p.extracted_text.len() >= 100).count();
    100.0 * non_empty as f64 / pages.len() as f64
}

fn https_score(pages: &[crate::types::Page]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let https = pages.iter().filter(|p| p.is_https).count();
    100.0 * https as f64 / pages.len() as f64
}

fn has_empty_shell(pages: &[crate::types::Page]) -> bool {
    pages
        .iter()
        .any(|p| p.extracted_text.trim().len() < 100 && p.has_framework_markers)
}
