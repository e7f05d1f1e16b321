//! Main-content extraction, trimmed from
//! `scraping/rust_scraper/clean.rs`: readability pass, then a heuristic
//! article/main/role=main fallback, then whole-document text as a last
//! resort. Domain-specific ad-block stripping and CDP-era noise heuristics
//! are dropped — a bounded polite crawl over a single site's own pages does
//! not need per-vendor (Amazon/eBay/LinkedIn/…) special-casing.

use readability::extractor;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::warn;
use url::Url;

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static MULTI_NEWLINE_RE: OnceLock<Regex> = OnceLock::new();
static SCRIPT_BLOCK_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn multi_newline_re() -> &'static Regex {
    MULTI_NEWLINE_RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn script_block_re() -> &'static Regex {
    SCRIPT_BLOCK_RE.get_or_init(|| {
        Regex::new(
            r"(?is)<(?:script|style|noscript|svg|canvas|iframe)[^>]*?>.*?</(?:script|style|noscript|svg|canvas|iframe)>",
        )
        .unwrap()
    })
}

pub fn extract_clean_content(html: &str, base_url: &Url) -> String {
    let preprocessed = script_block_re().replace_all(html, " ").to_string();

    let readability_text = match extractor::extract(&mut preprocessed.as_bytes(), base_url) {
        Ok(product) => clean_text(&html2md::parse_html(&product.content)),
        Err(e) => {
            warn!(error = %e, "readability extraction failed, falling back to heuristics");
            String::new()
        }
    };

    let heuristic_text = heuristic_main_extraction(&preprocessed);

    let rt_words = count_words(&readability_text);
    let ht_words = count_words(&heuristic_text);

    let chosen = if rt_words == 0 && ht_words > 0 {
        heuristic_text
    } else if ht_words == 0 && rt_words > 0 {
        readability_text
    } else if ht_words > rt_words.saturating_add(20) {
        heuristic_text
    } else if rt_words > 0 {
        readability_text
    } else {
        fallback_text_extraction(&preprocessed)
    };

    clean_text(&chosen)
}

fn heuristic_main_extraction(html: &str) -> String {
    let document = Html::parse_document(html);
    let selectors = [
        "article",
        "main",
        "[role=main]",
        "[itemprop=articleBody]",
        ".entry-content",
        ".post-content",
        "#content",
        "#main",
    ];

    let mut best_text = String::new();
    let mut best_words = 0usize;
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for el in document.select(&selector) {
            let text = el.text().collect::<Vec<_>>().join(" ");
            let cleaned = clean_text(&text);
            let words = count_words(&cleaned);
            if words > best_words {
                best_words = words;
                best_text = cleaned;
            }
        }
    }
    best_text
}

fn fallback_text_extraction(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let text = document
        .select(&body_selector)
        .next()
        .map(|body| body.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    clean_text(&text)
}

fn clean_text(text: &str) -> String {
    let collapsed = whitespace_re().replace_all(text, " ");
    let with_paragraphs = multi_newline_re().replace_all(&collapsed, "\n\n");
    with_paragraphs.trim().to_string()
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_tag_over_sparse_readability_output() {
        let html = "<html><body><nav>menu</nav><article><p>Acme is a bakery in Austin; contact hello@acme.com for catering.</p></article></body></html>";
        let base = Url::parse("https://acme.test/").unwrap();
        let text = extract_clean_content(html, &base);
        assert!(text.contains("bakery"));
    }
}
