//! Run-wide tunables that are not part of the versioned `CalibrationConfig`
//! (pillar weights/thresholds live in the `Store` instead) — this module
//! is the crawl/fetch/concurrency knobs a caller sets at Run start, loaded
//! the way `ShadowConfig` is loaded: JSON file candidate-path search,
//! falling back to per-field env vars, falling back to hardcoded defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FindableConfig {
    pub max_pages: usize,
    pub max_depth: usize,
    pub concurrency: usize,
    pub observation_cost_cap_usd: Option<f64>,
    pub include_observation: bool,
    pub run_deadline_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_content_length_bytes: u64,
}

impl Default for FindableConfig {
    fn default() -> Self {
        Self {
            max_pages: 250,
            max_depth: 3,
            concurrency: 8,
            observation_cost_cap_usd: None,
            include_observation: false,
            run_deadline_secs: 600,
            fetch_timeout_secs: 20,
            max_content_length_bytes: 10 * 1024 * 1024,
        }
    }
}

impl FindableConfig {
    fn resolve_usize(json: Option<usize>, env_key: &str, default: usize) -> usize {
        json.or_else(|| std::env::var(env_key).ok().and_then(|v| v.parse().ok()))
            .unwrap_or(default)
    }

    fn resolve_bool(json: Option<bool>, env_key: &str, default: bool) -> bool {
        json.or_else(|| std::env::var(env_key).ok().and_then(|v| v.parse().ok()))
            .unwrap_or(default)
    }

    /// Merge env-var overrides on top of whatever was loaded from JSON (or defaults).
    pub fn with_env_overrides(mut self) -> Self {
        self.max_pages = Self::resolve_usize(Some(self.max_pages), "FINDABLE_MAX_PAGES", 250);
        self.max_depth = Self::resolve_usize(Some(self.max_depth), "FINDABLE_MAX_DEPTH", 3);
        self.concurrency = Self::resolve_usize(Some(self.concurrency), "FINDABLE_CONCURRENCY", 8);
        self.include_observation = Self::resolve_bool(
            Some(self.include_observation),
            "FINDABLE_INCLUDE_OBSERVATION",
            false,
        );
        self
    }
}

/// Search `./findable.json`, `../findable.json`, then `$FINDABLE_CONFIG`, falling
/// back silently to `Default` — same candidate-path style used for
/// `cortex-scout.json`.
pub fn load_findable_config() -> FindableConfig {
    let candidates: Vec<PathBuf> = [
        Some(PathBuf::from("./findable.json")),
        Some(PathBuf::from("../findable.json")),
        std::env::var("FINDABLE_CONFIG").ok().map(PathBuf::from),
    ]
    .into_iter()
    .flatten()
    .collect();

    for path in candidates {
        if let Ok(text) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = serde_json::from_str::<FindableConfig>(&text) {
                return cfg.with_env_overrides();
            }
        }
    }

    FindableConfig::default().with_env_overrides()
}
