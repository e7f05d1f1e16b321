//! JSON-LD / schema.org extraction, adapted from
//! `scraping/rust_scraper/jsonld.rs`'s type-dispatch walker. Generalized to
//! also feed [`crate::types::SchemaObject`] for the Schema pillar,
//! rather than only producing markdown-ish summary text.

use crate::types::{SchemaObject, SchemaType};
use scraper::{Html, Selector};
use serde_json::Value;

pub fn extract_schema_objects(document: &Html) -> Vec<SchemaObject> {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for script in document.select(&selector) {
        let json_text = script.inner_html();
        if json_text.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&json_text) {
            Ok(value) => collect(&value, &mut out),
            Err(_) => out.push(SchemaObject {
                schema_type: SchemaType::Other("invalid".to_string()),
                valid: false,
                raw: Value::String(json_text),
                has_author: false,
                has_date_modified: false,
            }),
        }
    }
    out
}

fn collect(value: &Value, out: &mut Vec<SchemaObject>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect(graph, out);
                return;
            }
            let type_str = map.get("@type").and_then(|v| v.as_str()).unwrap_or("");
            let schema_type = match type_str {
                "FAQPage" => SchemaType::FaqPage,
                "Article" | "NewsArticle" | "BlogPosting" => SchemaType::Article,
                "Organization" => SchemaType::Organization,
                "HowTo" => SchemaType::HowTo,
                "Product" => SchemaType::Product,
                "RealEstateListing" => SchemaType::RealEstateListing,
                other => SchemaType::Other(other.to_string()),
            };
            let has_author = map.get("author").is_some();
            let has_date_modified = map.get("dateModified").is_some();
            out.push(SchemaObject {
                schema_type,
                valid: !type_str.is_empty(),
                raw: value.clone(),
                has_author,
                has_date_modified,
            });
        }
        _ => {}
    }
}
