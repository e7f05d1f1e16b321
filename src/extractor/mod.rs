//! Main-content extraction + metadata. Generalizes the
//! `scraping/rust_scraper` pipeline (fetch→parse→metadata→JSON-LD→readability
//! fallback→clean→headings/links/images) minus the CDP/headless-browser
//! branches, which have no counterpart in a bounded polite crawl.

mod clean;
mod jsonld;
mod metadata;

use crate::fetcher::FetchResult;
use crate::types::{ContentHash, Heading, PageLinks, SchemaObject};
use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

pub use jsonld::extract_json_ld;
pub use metadata::extract_metadata;

#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub extracted_text: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub language: Option<String>,
    pub headings: Vec<Heading>,
    pub schema: Vec<SchemaObject>,
    pub links: PageLinks,
    pub ttfb_ms: u64,
    pub content_hash: ContentHash,
    pub author: Option<String>,
    pub date_modified: Option<DateTime<Utc>>,
    pub is_https: bool,
    pub has_framework_markers: bool,
    pub code_block_count: usize,
    pub list_count: usize,
    pub table_count: usize,
    pub has_llms_txt_hint: bool,
}

impl ExtractedPage {
    pub fn into_page(
        self,
        page_id: crate::ids::PageId,
        run_id: crate::ids::RunId,
    ) -> crate::types::Page {
        crate::types::Page {
            page_id,
            run_id,
            url: self.url,
            depth: self.depth,
            status_code: self.status_code,
            raw_html_ref: None,
            extracted_text: self.extracted_text,
            title: self.title,
            meta_description: self.meta_description,
            language: self.language,
            headings: self.headings,
            schema: self.schema,
            links: self.links,
            timing: crate::types::Timing {
                ttfb_ms: self.ttfb_ms,
            },
            content_hash: self.content_hash,
            author: self.author,
            date_modified: self.date_modified,
            is_https: self.is_https,
            has_framework_markers: self.has_framework_markers,
            code_block_count: self.code_block_count,
            list_count: self.list_count,
            table_count: self.table_count,
        }
    }
}

/// Framework markers that suggest a client-rendered shell rather than
/// server-rendered content (feeds the Technical pillar's empty-shell check).
const FRAMEWORK_MARKERS: &[&str] = &[
    "id=\"root\"",
    "id=\"app\"",
    "id=\"__next\"",
    "ng-version",
    "data-reactroot",
    "__NUXT__",
];

pub fn extract_page(url: &str, depth: usize, fetch: &FetchResult) -> ExtractedPage {
    let html = String::from_utf8_lossy(&fetch.body).into_owned();
    let base_url = Url::parse(url).unwrap_or_else(|_| Url::parse("https://invalid.local").unwrap());
    let document = Html::parse_document(&html);

    let meta = extract_metadata(&document, &html, &base_url);
    let clean_text = clean::extract_clean_content(&html, &base_url);
    let headings = extract_headings(&document);
    let links = extract_links(&document, &base_url);
    let schema = jsonld::extract_schema_objects(&document);

    let has_framework_markers = FRAMEWORK_MARKERS.iter().any(|m| html.contains(m));
    let code_block_count = count_selector(&document, "pre, code");
    let list_count = count_selector(&document, "ul, ol");
    let table_count = count_selector(&document, "table");
    let has_llms_txt_hint = html.to_lowercase().contains("llms.txt");

    ExtractedPage {
        url: url.to_string(),
        depth,
        status_code: fetch.status,
        extracted_text: clean_text.clone(),
        title: meta.title,
        meta_description: meta.meta_description,
        language: meta.language,
        headings,
        schema,
        links,
        ttfb_ms: fetch.ttfb_ms,
        content_hash: ContentHash::of(clean_text.as_bytes()),
        author: meta.author,
        date_modified: meta.date_modified,
        is_https: base_url.scheme() == "https",
        has_framework_markers,
        code_block_count,
        list_count,
        table_count,
        has_llms_txt_hint,
    }
}

fn count_selector(document: &Html, selector_str: &str) -> usize {
    scraper::Selector::parse(selector_str)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let mut headings = Vec::new();
    for level in 1..=6u8 {
        let selector_str = format!("h{level}");
        if let Ok(selector) = scraper::Selector::parse(&selector_str) {
            for el in document.select(&selector) {
                let text = el.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    headings.push(Heading { level, text });
                }
            }
        }
    }
    headings
}

fn extract_links(document: &Html, base_url: &Url) -> PageLinks {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let Ok(selector) = scraper::Selector::parse("a[href]") else {
        return PageLinks { internal, external };
    };
    let base_host = base_url.host_str().unwrap_or("");
    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base_url.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let resolved_str = resolved.to_string();
        if resolved.host_str() == Some(base_host) {
            internal.push(resolved_str);
        } else {
            external.push(resolved_str);
        }
    }
    PageLinks { internal, external }
}
