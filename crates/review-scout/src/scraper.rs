//! The review scraper. Composes the cache, pacing, browser session, loader
//! and extractors into one request.
//!
//! ```text
//! cache lookup ─hit─▶ return
//!      │ miss
//!      ▼
//! delay → launch → navigate → delay → tab (best effort) → wait for reviews
//!      → delay → scroll-load → extract reviews + summary
//!      → (empty? not found) → cache write → close session → return
//! ```
//!
//! The session is closed exactly once whichever step fails.

use crate::cache::ReviewCache;
use crate::config::ScrapeConfig;
use crate::delay::DelayPolicy;
use crate::error::{ScrapeError, ScrapeResult};
use crate::extract::ReviewExtractor;
use crate::loader::ContentLoader;
use crate::renderer::Renderer;
use crate::session::BrowserSession;
use crate::summary::extract_summary;
use crate::types::{now_millis, ReviewBundle};
use std::sync::Arc;

/// Fetches review bundles for place URLs, one browser session per miss.
pub struct ReviewScraper {
    renderer: Arc<dyn Renderer>,
    cache: ReviewCache,
    config: ScrapeConfig,
    delay: DelayPolicy,
}

impl ReviewScraper {
    pub fn new(renderer: Arc<dyn Renderer>, cache: ReviewCache, config: ScrapeConfig) -> Self {
        let delay = config.delay_policy();
        Self {
            renderer,
            cache,
            config,
            delay,
        }
    }

    /// Override the pacing policy derived from the config.
    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn cache(&self) -> &ReviewCache {
        &self.cache
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    /// Cached bundle for `url` if fresh, otherwise a full scrape.
    pub async fn fetch(&self, url: &str) -> ScrapeResult<ReviewBundle> {
        if let Some(entry) = self.cache.get(url).await {
            tracing::info!(url, "serving reviews from cache");
            return Ok(entry.data);
        }

        self.delay.pause("pre-launch").await;

        let mut session = BrowserSession::new(Arc::clone(&self.renderer));
        let result = match self.scrape(&mut session, url).await {
            Ok(bundle) => {
                self.cache.put(url, &bundle, now_millis()).await;
                Ok(bundle)
            }
            Err(e) => Err(e),
        };
        session.close().await;

        if let Err(e) = &result {
            if e.is_not_found() {
                tracing::warn!(url, "no reviews extracted; cache left untouched");
            } else {
                tracing::error!(url, "review scrape failed: {e}");
            }
        }
        result
    }

    async fn scrape(&self, session: &mut BrowserSession, url: &str) -> ScrapeResult<ReviewBundle> {
        session.launch(&self.config.launch).await?;

        tracing::info!(url, "navigating");
        session.navigate(url, self.config.navigation_timeout_ms).await?;
        self.delay.pause("post-navigation").await;

        let page = session.page()?;
        let loader = ContentLoader::new(page, &self.config, self.delay);
        loader.activate_reviews_tab().await;
        loader.wait_for_reviews().await?;

        self.delay.pause("pre-scroll").await;
        loader.load_more().await?;

        let reviews = ReviewExtractor::new(page, &self.config).extract().await?;
        let summary = extract_summary(page, &self.config.selectors).await;

        if reviews.is_empty() {
            return Err(ScrapeError::NoReviewsExtracted);
        }

        tracing::info!(
            url,
            found = reviews.len(),
            total = summary.user_ratings_total,
            "scraped reviews"
        );
        Ok(ReviewBundle {
            reviews,
            rating: summary.rating,
            user_ratings_total: summary.user_ratings_total,
        })
    }
}
