//! robots.txt parsing with wildcards and group inheritance. Built fresh
//! since no prior module here parsed robots.txt, informed by crawler-adjacent
//! repos in the broader reference pack for the shape of a per-crawler
//! allowance table, and cached the way `core/app_state.rs` caches its two
//! `moka` caches.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

pub const SEARCH_CRAWLERS: &[&str] = &["Googlebot", "Bingbot", "Applebot"];
pub const AI_CRAWLERS: &[&str] = &[
    "GPTBot",
    "ClaudeBot",
    "anthropic-ai",
    "PerplexityBot",
    "Google-Extended",
    "CCBot",
];

#[derive(Debug, Clone)]
struct RuleGroup {
    agents: Vec<String>,
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RobotsTxt {
    groups: Vec<RuleGroup>,
}

impl RobotsTxt {
    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<RuleGroup> = Vec::new();
        let mut current: Option<RuleGroup> = None;

        for raw_line in body.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();

            match key.as_str() {
                "user-agent" => {
                    if current
                        .as_ref()
                        .map(|g| !g.allow.is_empty() || !g.disallow.is_empty())
                        .unwrap_or(false)
                    {
                        groups.push(current.take().unwrap());
                    }
                    let group = current.get_or_insert_with(|| RuleGroup {
                        agents: Vec::new(),
                        allow: Vec::new(),
                        disallow: Vec::new(),
                        crawl_delay: None,
                    });
                    group.agents.push(value);
                }
                "allow" => {
                    if let Some(group) = current.as_mut() {
                        group.allow.push(value);
                    }
                }
                "disallow" => {
                    if let Some(group) = current.as_mut() {
                        if !value.is_empty() {
                            group.disallow.push(value);
                        }
                    }
                }
                "crawl-delay" => {
                    if let Some(group) = current.as_mut() {
                        group.crawl_delay = value.parse().ok();
                    }
                }
                _ => {}
            }
        }
        if let Some(group) = current {
            groups.push(group);
        }

        Self { groups }
    }

    fn matching_groups<'a>(&'a self, user_agent: &str) -> Vec<&'a RuleGroup> {
        let ua_lower = user_agent.to_lowercase();
        let specific: Vec<&RuleGroup> = self
            .groups
            .iter()
            .filter(|g| {
                g.agents
                    .iter()
                    .any(|a| a != "*" && ua_lower.contains(&a.to_lowercase()))
            })
            .collect();
        if !specific.is_empty() {
            return specific;
        }
        self.groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a == "*"))
            .collect()
    }

    /// Longest-matching-prefix wins; ties favor `Allow`.
    pub fn allowed(&self, user_agent: &str, path: &str) -> bool {
        let groups = self.matching_groups(user_agent);
        if groups.is_empty() {
            return true;
        }
        let mut best_len = -1i64;
        let mut best_allow = true;

        for group in groups {
            for rule in &group.allow {
                if pattern_matches(rule, path) && rule.len() as i64 >= best_len {
                    best_len = rule.len() as i64;
                    best_allow = true;
                }
            }
            for rule in &group.disallow {
                if pattern_matches(rule, path) && rule.len() as i64 >= best_len {
                    best_len = rule.len() as i64;
                    best_allow = false;
                }
            }
        }
        best_allow
    }

    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.matching_groups(user_agent)
            .into_iter()
            .find_map(|g| g.crawl_delay)
            .map(Duration::from_secs_f64)
    }
}

/// robots.txt path patterns support `*` wildcard and `$` end-anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let anchored_end = pattern.ends_with('$');
    let pattern = pattern.trim_end_matches('$');
    let segments: Vec<&str> = pattern.split('*').collect();

    let mut remainder = path;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !remainder.starts_with(segment) {
                return false;
            }
            remainder = &remainder[segment.len()..];
        } else if let Some(pos) = remainder.find(segment) {
            remainder = &remainder[pos + segment.len()..];
        } else {
            return false;
        }
    }
    if anchored_end {
        remainder.is_empty() || segments.last() == Some(&"")
    } else {
        true
    }
}

#[derive(Debug, Clone)]
pub struct RobotsResult {
    pub search_indexed_score: f64,
    pub direct_crawl_score: f64,
}

impl RobotsResult {
    /// Combined per-pillar score = 0.6·search + 0.4·direct.
    pub fn combined_score(&self) -> f64 {
        0.6 * self.search_indexed_score + 0.4 * self.direct_crawl_score
    }

    pub fn from_robots(robots: &RobotsTxt) -> Self {
        let search_allowed = SEARCH_CRAWLERS
            .iter()
            .filter(|ua| robots.allowed(ua, "/"))
            .count();
        let ai_allowed = AI_CRAWLERS
            .iter()
            .filter(|ua| robots.allowed(ua, "/"))
            .count();
        Self {
            search_indexed_score: 100.0 * search_allowed as f64 / SEARCH_CRAWLERS.len() as f64,
            direct_crawl_score: 100.0 * ai_allowed as f64 / AI_CRAWLERS.len() as f64,
        }
    }
}

/// Per-host, single-writer-then-many-reader cache with TTL, matching the
/// `moka::future::Cache` usage in `app_state.rs`.
pub struct RobotsCache {
    cache: Cache<String, Arc<RobotsTxt>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
        }
    }

    pub async fn get_or_parse(
        &self,
        host: &str,
        body: impl FnOnce() -> Option<String>,
    ) -> Arc<RobotsTxt> {
        if let Some(existing) = self.cache.get(host).await {
            return existing;
        }
        let parsed = Arc::new(match body() {
            Some(text) => RobotsTxt::parse(&text),
            None => RobotsTxt { groups: Vec::new() },
        });
        self.cache.insert(host.to_string(), parsed.clone()).await;
        parsed
    }
}

impl Default for RobotsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_user_agent_blocks_specific_bot_by_default() {
        let robots = RobotsTxt::parse("User-agent: GPTBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n");
        assert!(!robots.allowed("GPTBot", "/pricing"));
        assert!(robots.allowed("Googlebot", "/pricing"));
    }

    #[test]
    fn longest_match_wins() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /private\nAllow: /private/public\n");
        assert!(robots.allowed("Googlebot", "/private/public/page"));
        assert!(!robots.allowed("Googlebot", "/private/secret"));
    }

    #[test]
    fn combined_score_weights_search_over_direct() {
        let result = RobotsResult {
            search_indexed_score: 100.0,
            direct_crawl_score: 0.0,
        };
        assert_eq!(result.combined_score(), 60.0);
    }
}
