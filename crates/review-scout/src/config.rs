//! Scrape configuration and environment overrides.

use crate::delay::DelayPolicy;
use crate::renderer::LaunchProfile;
use crate::selectors::SelectorCatalog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one scrape pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// How long a cached bundle stays readable.
    pub cache_ttl_secs: u64,
    /// Optional bound on cached URLs; `None` keeps every entry.
    pub max_cache_entries: Option<usize>,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Review count at which scrolling and extraction stop.
    pub max_reviews: usize,
    /// Consecutive unchanged scroll heights that count as "settled".
    pub no_change_threshold: u32,
    pub navigation_timeout_ms: u64,
    pub tab_wait_ms: u64,
    pub reviews_wait_ms: u64,
    /// Worst-case wait per clicked "more" control before text is read.
    pub expand_settle_ms: u64,
    /// Interval between presence and settle polls.
    pub poll_interval_ms: u64,
    pub launch: LaunchProfile,
    pub selectors: SelectorCatalog,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 24 * 60 * 60,
            max_cache_entries: None,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            max_reviews: 50,
            no_change_threshold: 15,
            navigation_timeout_ms: 90_000,
            tab_wait_ms: 15_000,
            reviews_wait_ms: 30_000,
            expand_settle_ms: 500,
            poll_interval_ms: 100,
            launch: LaunchProfile::default(),
            selectors: SelectorCatalog::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults with `SCOUT_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup. Unparseable values are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SCOUT_CHROMIUM_PATH").filter(|p| !p.trim().is_empty()) {
            self.launch.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(v) = parse_var(&lookup, "SCOUT_MAX_REVIEWS") {
            self.max_reviews = v;
        }
        if let Some(v) = parse_var(&lookup, "SCOUT_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "SCOUT_MIN_DELAY_MS") {
            self.min_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "SCOUT_MAX_DELAY_MS") {
            self.max_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "SCOUT_MAX_CACHE_ENTRIES") {
            self.max_cache_entries = Some(v);
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        DelayPolicy::new(self.min_delay_ms, self.max_delay_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.max_reviews, 50);
        assert_eq!(config.no_change_threshold, 15);
        assert_eq!(config.navigation_timeout_ms, 90_000);
        assert_eq!(config.tab_wait_ms, 15_000);
        assert_eq!(config.reviews_wait_ms, 30_000);
        assert!(config.max_cache_entries.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ScrapeConfig::default();
        config.apply_env(lookup_from(&[
            ("SCOUT_MAX_REVIEWS", "20"),
            ("SCOUT_CHROMIUM_PATH", "/usr/bin/chromium"),
            ("SCOUT_MAX_CACHE_ENTRIES", "100"),
            ("SCOUT_MIN_DELAY_MS", "0"),
            ("SCOUT_MAX_DELAY_MS", "0"),
        ]));
        assert_eq!(config.max_reviews, 20);
        assert_eq!(
            config.launch.chromium_path,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert_eq!(config.max_cache_entries, Some(100));
        assert_eq!(config.delay_policy(), DelayPolicy::none());
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let mut config = ScrapeConfig::default();
        config.apply_env(lookup_from(&[("SCOUT_MAX_REVIEWS", "lots")]));
        assert_eq!(config.max_reviews, 50);
    }
}
