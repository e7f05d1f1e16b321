//! Title/description/author/date/language extraction, adapted from
//! `scraping/rust_scraper/metadata.rs`.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

pub struct ExtractedMetadata {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub language: Option<String>,
    pub author: Option<String>,
    pub date_modified: Option<DateTime<Utc>>,
}

pub fn extract_metadata(document: &Html, html: &str, _base_url: &Url) -> ExtractedMetadata {
    ExtractedMetadata {
        title: extract_title(document),
        meta_description: extract_meta_content(document, "description")
            .or_else(|| extract_og_content(document, "og:description")),
        language: detect_language(document, html),
        author: extract_author(document),
        date_modified: extract_date_modified(document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{name}']")).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_og_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property='{property}']")).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_author(document: &Html) -> Option<String> {
    if let Some(meta_author) = extract_meta_content(document, "author") {
        return Some(meta_author);
    }
    let selector = Selector::parse("[rel='author'], .byline, .author-name, [itemprop='author']").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_date_modified(document: &Html) -> Option<DateTime<Utc>> {
    for (selector_str, attr) in [
        ("meta[property='article:modified_time']", "content"),
        ("meta[name='last-modified']", "content"),
        ("time[datetime]", "datetime"),
    ] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(value) = document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr(attr))
            {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
                    return Some(parsed.with_timezone(&Utc));
                }
            }
        }
    }
    None
}

/// Language detection via `whatlang`, falling back to the document's `<html
/// lang>` attribute when the text is too short for statistical detection.
fn detect_language(document: &Html, html: &str) -> Option<String> {
    if let Ok(selector) = Selector::parse("html") {
        if let Some(lang) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("lang"))
        {
            if !lang.is_empty() {
                return Some(lang.split('-').next().unwrap_or(lang).to_string());
            }
        }
    }
    let text_sample: String = html.chars().take(2000).collect();
    whatlang::detect(&text_sample).map(|info| info.lang().code().to_string())
}
