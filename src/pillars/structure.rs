//! Structure pillar: heading hierarchy, answer-first ratio, AI answer block,
//! readability, FAQ presence, internal link density, extractable formats.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Issue, Page, Pillar, PillarScore, ProgressLevel, SchemaType};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let mut issues = Vec::new();
    let pages = input.pages;

    let heading_score = avg_over_pages(pages, heading_hierarchy_validity);
    let answer_first_score = avg_over_pages(pages, answer_first_ratio);
    let answer_block_score = avg_over_pages(pages, has_ai_answer_block);
    let readability_score = avg_over_pages(pages, readability);
    let faq_score = avg_over_pages(pages, faq_presence);
    let link_density_score = avg_over_pages(pages, internal_link_density);
    let extractable_score = avg_over_pages(pages, extractable_formats);

    if faq_score < 50.0 {
        issues.push(Issue {
            code: "missing_faq_section".to_string(),
            level: ProgressLevel::from_raw(faq_score),
            message: "no FAQ-style question/answer section detected".to_string(),
        });
    }
    if readability_score < 50.0 {
        issues.push(Issue {
            code: "wall_of_text".to_string(),
            level: ProgressLevel::from_raw(readability_score),
            message: "paragraphs run long with few breaks, hurting extractability".to_string(),
        });
    }

    let components = vec![
        component("heading_hierarchy", 20.0, heading_score),
        component("answer_first_ratio", 15.0, answer_first_score),
        component("ai_answer_block", 15.0, answer_block_score),
        component("readability", 15.0, readability_score),
        component("faq_presence", 15.0, faq_score),
        component("internal_link_density", 10.0, link_density_score),
        component("extractable_formats", 10.0, extractable_score),
    ];

    finalize(run_id, Pillar::Structure, components, issues)
}

fn avg_over_pages(pages: &[Page], f: impl Fn(&Page) -> f64) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    pages.iter().map(f).sum::<f64>() / pages.len() as f64
}

/// Valid when there is exactly one H1, and no level skips a rank (H2 before
/// H4 with no H3 between, etc).
fn heading_hierarchy_validity(page: &Page) -> f64 {
    if page.headings.is_empty() {
        return 0.0;
    }
    let h1_count = page.headings.iter().filter(|h| h.level == 1).count();
    if h1_count != 1 {
        return 40.0;
    }
    let mut prev = 1u8;
    let mut skips = 0;
    for h in &page.headings[1..] {
        if h.level > prev + 1 {
            skips += 1;
        }
        prev = h.level;
    }
    (100.0 - skips as f64 * 20.0).clamp(0.0, 100.0)
}

/// Ratio of paragraphs whose first sentence directly states the answer
/// (heuristic: paragraph starts with a non-filler word and is ≤ 40 words).
fn answer_first_ratio(page: &Page) -> f64 {
    let paragraphs: Vec<&str> = page.extracted_text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    if paragraphs.is_empty() {
        return 0.0;
    }
    let direct = paragraphs
        .iter()
        .filter(|p| {
            let words: Vec<&str> = p.split_whitespace().collect();
            !words.is_empty() && words.len() <= 40
        })
        .count();
    100.0 * direct as f64 / paragraphs.len() as f64
}

/// A 40-80 word standalone paragraph appearing right after the H1.
fn has_ai_answer_block(page: &Page) -> f64 {
    let Some(first_break) = page.extracted_text.find("\n\n") else {
        return 0.0;
    };
    let candidate = &page.extracted_text[..first_break.min(page.extracted_text.len())];
    let word_count = candidate.split_whitespace().count();
    if (40..=80).contains(&word_count) {
        100.0
    } else {
        0.0
    }
}

/// Paragraph length ≤4 sentences, sentence length ≤20 words, no wall of text.
fn readability(page: &Page) -> f64 {
    let paragraphs: Vec<&str> = page.extracted_text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    if paragraphs.is_empty() {
        return 0.0;
    }
    let good = paragraphs
        .iter()
        .filter(|p| {
            let sentences: Vec<&str> = p.split(['.', '!', '?']).filter(|s| !s.trim().is_empty()).collect();
            if sentences.len() > 4 {
                return false;
            }
            sentences.iter().all(|s| s.split_whitespace().count() <= 20)
        })
        .count();
    100.0 * good as f64 / paragraphs.len() as f64
}

fn faq_presence(page: &Page) -> f64 {
    let has_schema = page.schema.iter().any(|s| s.schema_type == SchemaType::FaqPage);
    let has_heading = page.headings.iter().any(|h| h.text.to_lowercase().contains("faq") || h.text.to_lowercase().contains("frequently asked"));
    if has_schema {
        100.0
    } else if has_heading {
        60.0
    } else {
        0.0
    }
}

/// Target 5-10 internal links per page.
fn internal_link_density(page: &Page) -> f64 {
    let count = page.links.internal.len();
    if (5..=10).contains(&count) {
        100.0
    } else if count == 0 {
        0.0
    } else if count < 5 {
        100.0 * count as f64 / 5.0
    } else {
        (100.0 - (count - 10) as f64 * 5.0).clamp(0.0, 100.0)
    }
}

fn extractable_formats(page: &Page) -> f64 {
    let total = page.table_count + page.list_count;
    if total == 0 {
        0.0
    } else {
        (total as f64 * 25.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PageId;
    use crate::types::{Heading, PageLinks, Timing};

    fn page_with_headings(levels: &[u8]) -> Page {
        Page {
            page_id: PageId::new(),
            run_id: RunId::new(),
            url: "https://example.com/".to_string(),
            depth: 0,
            status_code: 200,
            raw_html_ref: None,
            extracted_text: String::new(),
            title: None,
            meta_description: None,
            language: None,
            headings: levels.iter().map(|&level| Heading { level, text: "x".to_string() }).collect(),
            schema: vec![],
            links: PageLinks { internal: vec![], external: vec![] },
            timing: Timing { ttfb_ms: 0 },
            content_hash: crate::types::ContentHash::of(b""),
            author: None,
            date_modified: None,
            is_https: true,
            has_framework_markers: false,
            code_block_count: 0,
            list_count: 0,
            table_count: 0,
        }
    }

    #[test]
    fn single_h1_with_no_skips_is_valid() {
        let page = page_with_headings(&[1, 2, 2, 3]);
        assert_eq!(heading_hierarchy_validity(&page), 100.0);
    }

    #[test]
    fn skipped_level_penalized() {
        let page = page_with_headings(&[1, 2, 4]);
        assert!(heading_hierarchy_validity(&page) < 100.0);
    }

    #[test]
    fn multiple_h1_heavily_penalized() {
        let page = page_with_headings(&[1, 1, 2]);
        assert_eq!(heading_hierarchy_validity(&page), 40.0);
    }
}
