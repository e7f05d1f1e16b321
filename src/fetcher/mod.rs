//! Bounded, polite HTTP client. Generalizes the `AppState.http_client` +
//! `antibot::AntiBot` rate limiter from one global delay to a per-host
//! token bucket, and adds typed retryable/non-retryable error
//! classification plus exponential backoff via `backoff`.

use crate::error::FetchError;
use backoff::{future::retry, ExponentialBackoffBuilder};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;
use url::Url;

const NON_HTML_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".exe", ".dmg", ".tar", ".gz", ".mp4", ".mp3", ".wav", ".avi", ".mov", ".jpg",
    ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".woff", ".woff2", ".ttf",
];

const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "msclkid",
];

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub ttfb_ms: u64,
    pub redirect_chain: Vec<String>,
    pub final_url: String,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub per_host_qps: f64,
    pub max_retries: u32,
    pub total_timeout: Duration,
    pub max_content_length: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            per_host_qps: 2.0,
            max_retries: 3,
            total_timeout: Duration::from_secs(20),
            max_content_length: 10 * 1024 * 1024,
        }
    }
}

struct TokenBucket {
    last_request: Instant,
    min_interval: Duration,
}

/// Per-host polite fetcher. One instance is shared (via `Arc`) across a Run's
/// crawl so the token bucket actually bounds per-host QPS across concurrent
/// fetch tasks.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
    crawl_delay_overrides: Mutex<HashMap<String, Duration>>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Self {
        let client = Client::builder()
            .timeout(config.total_timeout)
            .user_agent("FindableScoreBot/1.0 (+https://findable.works/bot)")
            .build()
            .expect("reqwest client builder should not fail with these options");
        Self {
            client,
            config,
            buckets: Mutex::new(HashMap::new()),
            crawl_delay_overrides: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_crawl_delay(&self, host: &str, delay: Duration) {
        if let Ok(mut overrides) = self.crawl_delay_overrides.try_lock() {
            overrides.insert(host.to_string(), delay);
        }
    }

    fn skip_if_non_html(url: &str) -> Result<(), FetchError> {
        let lower = url.to_lowercase();
        if NON_HTML_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Err(FetchError::SkippedExtension(url.to_string()));
        }
        Ok(())
    }

    /// Strip known tracking parameters before the request goes out.
    pub fn strip_tracking_params(url: &str) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            let qs = kept
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            parsed.set_query(Some(&qs));
        }
        parsed.to_string()
    }

    async fn wait_for_host_slot(&self, host: &str) {
        let min_interval = {
            let overrides = self.crawl_delay_overrides.lock().await;
            overrides
                .get(host)
                .copied()
                .unwrap_or_else(|| Duration::from_secs_f64(1.0 / self.config.per_host_qps))
        };
        let wait = {
            let mut buckets = self.buckets.lock().await;
            let entry = buckets.entry(host.to_string()).or_insert(TokenBucket {
                last_request: Instant::now() - min_interval,
                min_interval,
            });
            entry.min_interval = min_interval;
            let elapsed = entry.last_request.elapsed();
            let wait = min_interval.saturating_sub(elapsed);
            entry.last_request = Instant::now() + wait;
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        Self::skip_if_non_html(url)?;
        let cleaned = Self::strip_tracking_params(url);
        let host = Url::parse(&cleaned)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        self.wait_for_host_slot(&host).await;

        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.config.total_timeout))
            .build();

        let url_for_op = cleaned.clone();
        let attempt = {
            let client = self.client.clone();
            let max_len = self.config.max_content_length;
            move || {
                let client = client.clone();
                let url = url_for_op.clone();
                async move { Self::try_fetch_once(&client, &url, max_len).await }
            }
        };

        retry(backoff_policy, || async {
            match attempt().await {
                Ok(result) => Ok(result),
                Err(e) if e.is_retryable() => {
                    warn!(url = %cleaned, error = %e, "retryable fetch failure");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    async fn try_fetch_once(
        client: &Client,
        url: &str,
        max_content_length: u64,
    ) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Network {
                        url: url.to_string(),
                        source,
                    }
                }
            })?;

        let ttfb_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let redirect_chain = vec![url.to_string(), final_url.clone()];

        if let Some(len) = response.content_length() {
            if len > max_content_length {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size: len,
                });
            }
        }

        if status >= 400 && status != 429 {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        if body.len() as u64 > max_content_length {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: body.len() as u64,
            });
        }

        if status == 429 {
            return Err(FetchError::HttpStatus { url: url.to_string(), status });
        }

        Ok(FetchResult {
            status,
            headers,
            body,
            ttfb_ms,
            redirect_chain,
            final_url,
        })
    }
}

pub type SharedFetcher = Arc<Fetcher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_tracking_params_but_keeps_others() {
        let url = "https://example.com/page?utm_source=x&id=42&fbclid=abc";
        let cleaned = Fetcher::strip_tracking_params(url);
        assert!(cleaned.contains("id=42"));
        assert!(!cleaned.contains("utm_source"));
        assert!(!cleaned.contains("fbclid"));
    }

    #[test]
    fn skips_non_html_extensions() {
        assert!(Fetcher::skip_if_non_html("https://example.com/report.pdf").is_err());
        assert!(Fetcher::skip_if_non_html("https://example.com/image.png").is_err());
        assert!(Fetcher::skip_if_non_html("https://example.com/index.html").is_ok());
    }
}
