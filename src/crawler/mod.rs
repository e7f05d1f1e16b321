//! Breadth-first URL frontier with depth/page caps and a priority-path seed
//! list. Directly generalizes `tools/crawl.rs`'s BFS
//! (`Arc<Mutex<VecDeque<(String, usize)>>>` processed in
//! `buffer_unordered(concurrency)` waves) to emit `Page` entities and
//! distinguish `urls_blocked` (robots) from `urls_failed` (fetch errors).

use crate::error::CrawlError;
use crate::extractor::{extract_page, ExtractedPage};
use crate::fetcher::SharedFetcher;
use crate::robots::RobotsCache;
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

/// Coverage-sensitive signals concentrate on these non-homepage pages
/// (empirically observed, ) — seeded at depth 0 alongside the
/// homepage.
pub const PRIORITY_PATHS: &[&str] = &[
    "/about", "/pricing", "/press", "/contact", "/faq", "/blog", "/services",
];

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    pub concurrency: usize,
    pub same_domain_only: bool,
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 250,
            concurrency: 8,
            same_domain_only: true,
            exclude_patterns: vec![
                "/login".into(),
                "/logout".into(),
                "/signup".into(),
                "/cart".into(),
                "/checkout".into(),
                "/admin".into(),
                "/api/".into(),
            ],
        }
    }
}

pub struct CrawlOutcome {
    pub pages: Vec<ExtractedPage>,
    pub urls_blocked: usize,
    pub urls_failed: usize,
    pub max_depth_reached: usize,
}

/// Crawl a site starting from `start_url`, honoring robots.txt for
/// `robots_user_agent` and recording every successfully fetched page as an
/// `ExtractedPage` via the [`crate::extractor`] stage.
pub async fn crawl_site(
    fetcher: &SharedFetcher,
    robots_cache: &RobotsCache,
    robots_user_agent: &str,
    start_url: &str,
    config: CrawlConfig,
) -> Result<CrawlOutcome, CrawlError> {
    let base_url = Url::parse(start_url).map_err(|_| CrawlError::InvalidSeed(start_url.to_string()))?;
    let base_domain = base_url.host_str().unwrap_or("").to_string();

    info!(
        start_url,
        max_depth = config.max_depth,
        max_pages = config.max_pages,
        "starting crawl"
    );

    let robots_url = base_url
        .join("/robots.txt")
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("https://{base_domain}/robots.txt"));
    let robots_body = fetcher
        .fetch(&robots_url)
        .await
        .ok()
        .map(|result| String::from_utf8_lossy(&result.body).into_owned());
    robots_cache
        .get_or_parse(&base_domain, || robots_body)
        .await;

    let visited: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let queue: Arc<Mutex<VecDeque<(String, usize)>>> = Arc::new(Mutex::new(VecDeque::new()));
    let pages: Arc<Mutex<Vec<ExtractedPage>>> = Arc::new(Mutex::new(Vec::new()));
    let urls_blocked = Arc::new(AtomicUsize::new(0));
    let urls_failed = Arc::new(AtomicUsize::new(0));
    let max_depth_reached = Arc::new(AtomicUsize::new(0));

    {
        let mut q = queue.lock().await;
        let mut v = visited.lock().await;
        q.push_back((start_url.to_string(), 0));
        v.insert(normalize_url(start_url));
        for path in PRIORITY_PATHS {
            if let Ok(seed) = base_url.join(path) {
                let seed_str = seed.to_string();
                let normalized = normalize_url(&seed_str);
                if v.insert(normalized) {
                    q.push_back((seed_str, 0));
                }
            }
        }
    }

    loop {
        let current_count = pages.lock().await.len();
        if current_count >= config.max_pages {
            info!(max_pages = config.max_pages, "reached page cap");
            break;
        }

        let batch: Vec<(String, usize)> = {
            let mut q = queue.lock().await;
            let remaining = config.max_pages - current_count;
            let batch_size = remaining.min(config.concurrency * 2);
            let mut batch = Vec::new();
            while batch.len() < batch_size {
                match q.pop_front() {
                    Some(item) => batch.push(item),
                    None => break,
                }
            }
            batch
        };

        if batch.is_empty() {
            break;
        }

        let results: Vec<(Option<ExtractedPage>, Vec<(String, usize)>, bool)> = stream::iter(batch)
            .map(|(url, depth)| {
                let fetcher = Arc::clone(fetcher);
                let config = config.clone();
                let base_domain = base_domain.clone();
                let visited = Arc::clone(&visited);
                let max_depth_reached = Arc::clone(&max_depth_reached);
                async move {
                    max_depth_reached.fetch_max(depth, Ordering::Relaxed);

                    let allowed = robots_cache
                        .get_or_parse(&base_domain, || None)
                        .await
                        .allowed(robots_user_agent, Url::parse(&url).map(|u| u.path().to_string()).unwrap_or_default().as_str());
                    if !allowed {
                        return (None, vec![], true);
                    }

                    match fetcher.fetch(&url).await {
                        Ok(fetch_result) => {
                            let extracted = extract_page(&url, depth, &fetch_result);
                            let mut new_urls = Vec::new();
                            if depth < config.max_depth {
                                for link in &extracted.links.internal {
                                    if let Some(resolved) = resolve_url(&url, link) {
                                        let normalized = normalize_url(&resolved);
                                        if should_crawl(&resolved, &base_domain, &config) {
                                            let mut v = visited.lock().await;
                                            if v.insert(normalized) {
                                                new_urls.push((resolved, depth + 1));
                                            }
                                        }
                                    }
                                }
                            }
                            (Some(extracted), new_urls, false)
                        }
                        Err(e) => {
                            warn!(url, error = %e, "fetch failed");
                            (None, vec![], false)
                        }
                    }
                }
            })
            .buffer_unordered(config.concurrency)
            .collect()
            .await;

        for (extracted, new_urls, blocked) in results {
            if blocked {
                urls_blocked.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            match extracted {
                Some(page) => pages.lock().await.push(page),
                None => {
                    urls_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            let mut q = queue.lock().await;
            for item in new_urls {
                q.push_back(item);
            }
        }
    }

    let final_pages = Arc::try_unwrap(pages).unwrap().into_inner();
    if final_pages.is_empty() {
        return Err(CrawlError::ZeroPagesCrawled);
    }

    Ok(CrawlOutcome {
        pages: final_pages,
        urls_blocked: urls_blocked.load(Ordering::Relaxed),
        urls_failed: urls_failed.load(Ordering::Relaxed),
        max_depth_reached: max_depth_reached.load(Ordering::Relaxed),
    })
}

/// Lowercase host, remove default port, sort query, drop fragment.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_lowercase();
    };
    parsed.set_fragment(None);
    if let Some(port) = parsed.port() {
        let is_default = matches!((parsed.scheme(), port), ("http", 80) | ("https", 443));
        if is_default {
            let _ = parsed.set_port(None);
        }
    }
    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let qs = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&qs));
    }
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    let mut result = parsed.to_string();
    if let Some(host_start) = result.find(&host) {
        result.replace_range(host_start..host_start + host.len(), &host);
    }
    if result.ends_with('/') && result.len() > 1 {
        result.pop();
    }
    result
}

fn resolve_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
        || href.starts_with("data:")
    {
        return None;
    }
    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(href).ok()?;
    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}

fn should_crawl(url: &str, base_domain: &str, config: &CrawlConfig) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let url_domain = parsed.host_str().unwrap_or("");
    if config.same_domain_only && url_domain != base_domain && !url_domain.ends_with(&format!(".{base_domain}")) {
        return false;
    }
    let url_lower = url.to_lowercase();
    !config
        .exclude_patterns
        .iter()
        .any(|p| url_lower.contains(&p.to_lowercase()))
}
