//! Entity Recognition pillar (optional 7th pillar, disabled by default).
//! Heuristic-only: no external knowledge-graph lookups are performed in
//! this crate, so presence is inferred from on-site signals — an explicit
//! scope decision, recorded in `DESIGN.md`.

use super::{component, finalize, PillarInput};
use crate::ids::RunId;
use crate::types::{Pillar, PillarScore};

pub fn analyze(run_id: RunId, input: &PillarInput) -> PillarScore {
    let pages = input.pages;

    let wikipedia_score = mentions_score(pages, "wikipedia.org");
    let wikidata_score = mentions_score(pages, "wikidata.org");
    let domain_age_score = domain_age_proxy(pages);
    let web_presence_score = web_presence_proxy(pages);

    let components = vec![
        component("wikipedia_presence", 30.0, wikipedia_score),
        component("wikidata_entity", 20.0, wikidata_score),
        component("domain_age_tld", 20.0, domain_age_score),
        component("web_presence", 30.0, web_presence_score),
    ];

    finalize(run_id, Pillar::EntityRecognition, components, vec![])
}

fn mentions_score(pages: &[crate::types::Page], domain: &str) -> f64 {
    let hit = pages.iter().any(|p| p.links.external.iter().any(|l| l.contains(domain)));
    if hit {
        100.0
    } else {
        0.0
    }
}

/// No authoritative WHOIS lookup in this crate; `.com`/`.org`/`.edu`/`.gov`
/// are treated as an established-TLD proxy, everything else scores lower.
fn domain_age_proxy(pages: &[crate::types::Page]) -> f64 {
    let Some(page) = pages.first() else {
        return 0.0;
    };
    let Ok(url) = url::Url::parse(&page.url) else {
        return 0.0;
    };
    match url.host_str() {
        Some(host) if host.ends_with(".gov") || host.ends_with(".edu") => 100.0,
        Some(host) if host.ends_with(".com") || host.ends_with(".org") || host.ends_with(".net") => 70.0,
        _ => 40.0,
    }
}

/// Proxy for off-site web presence: density of external links to distinct
/// third-party hosts as a stand-in for citations/mentions elsewhere.
fn web_presence_proxy(pages: &[crate::types::Page]) -> f64 {
    let mut hosts = std::collections::HashSet::new();
    for page in pages {
        for link in &page.links.external {
            if let Ok(url) = url::Url::parse(link) {
                if let Some(host) = url.host_str() {
                    hosts.insert(host.to_string());
                }
            }
        }
    }
    (hosts.len() as f64 * 10.0).min(100.0)
}
