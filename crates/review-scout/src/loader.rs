//! Content loader: reveals the reviews panel and drives scroll-triggered
//! lazy loading until the list is long enough or stops growing.

use crate::config::ScrapeConfig;
use crate::delay::DelayPolicy;
use crate::error::{ScrapeError, ScrapeResult};
use crate::renderer::RenderContext;
use crate::scripts::{self, PageScript};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Poll `script` until it evaluates to `true` or `timeout_ms` elapses.
///
/// Evaluation errors count as "not yet": the page may still be settling.
pub async fn wait_for_true(
    page: &dyn RenderContext,
    script: &PageScript,
    timeout_ms: u64,
    poll_interval_ms: u64,
) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let poll = Duration::from_millis(poll_interval_ms.max(1));
    loop {
        match page.execute_js(script.source()).await {
            Ok(value) if value.as_bool() == Some(true) => return true,
            Ok(_) => {}
            Err(e) => tracing::debug!(script = script.name(), "poll failed: {e}"),
        }
        if Instant::now() + poll > deadline {
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Outcome of the best-effort tab activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabActivation {
    Clicked,
    AlreadyActive,
    NotFound,
}

/// Why the scroll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Enough reviews are rendered.
    ReachedCap,
    /// The container height stopped changing.
    Settled,
    /// No scrollable container matched.
    ContainerMissing,
}

/// Summary of a finished scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub attempts: u32,
    pub review_count: usize,
    pub reason: StopReason,
}

/// Stopping rule for the scroll loop.
///
/// Stops once the counted reviews reach `max_reviews`, or once the height
/// has been unchanged for `threshold` consecutive observations. Pages that
/// recycle DOM nodes without growing stop early and yield fewer reviews
/// than the place has.
#[derive(Debug, Clone)]
pub struct SettleTracker {
    last_height: u64,
    no_change: u32,
    review_count: usize,
    attempts: u32,
    max_reviews: usize,
    threshold: u32,
}

impl SettleTracker {
    pub fn new(initial_height: u64, max_reviews: usize, threshold: u32) -> Self {
        Self {
            last_height: initial_height,
            no_change: 0,
            review_count: 0,
            attempts: 0,
            max_reviews,
            threshold,
        }
    }

    /// Record one post-scroll measurement.
    pub fn observe(&mut self, height: u64, review_count: usize) {
        self.attempts += 1;
        if height == self.last_height {
            self.no_change += 1;
        } else {
            self.no_change = 0;
        }
        self.last_height = height;
        self.review_count = review_count;
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.review_count >= self.max_reviews {
            Some(StopReason::ReachedCap)
        } else if self.no_change >= self.threshold {
            Some(StopReason::Settled)
        } else {
            None
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn no_change(&self) -> u32 {
        self.no_change
    }

    pub fn review_count(&self) -> usize {
        self.review_count
    }
}

#[derive(Debug, Deserialize)]
struct TabState {
    found: bool,
    already_active: bool,
}

#[derive(Debug, Deserialize)]
struct Measurement {
    found: bool,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    count: usize,
}

/// Drives one page from "navigated" to "reviews fully loaded".
pub struct ContentLoader<'a> {
    page: &'a dyn RenderContext,
    config: &'a ScrapeConfig,
    delay: DelayPolicy,
}

impl<'a> ContentLoader<'a> {
    pub fn new(page: &'a dyn RenderContext, config: &'a ScrapeConfig, delay: DelayPolicy) -> Self {
        Self {
            page,
            config,
            delay,
        }
    }

    /// Click the reviews tab if it shows up and is not already selected.
    /// Never fails: the page may already display reviews.
    pub async fn activate_reviews_tab(&self) -> TabActivation {
        let catalog = &self.config.selectors;
        let present = wait_for_true(
            self.page,
            &scripts::probe(&catalog.reviews_tab),
            self.config.tab_wait_ms,
            self.config.poll_interval_ms,
        )
        .await;
        if !present {
            tracing::warn!("reviews tab not found, looking for reviews directly");
            return TabActivation::NotFound;
        }

        let state = match self
            .page
            .execute_js(scripts::activate_tab(catalog).source())
            .await
            .map_err(|e| e.to_string())
            .and_then(|v| serde_json::from_value::<TabState>(v).map_err(|e| e.to_string()))
        {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("could not click reviews tab: {e}");
                return TabActivation::NotFound;
            }
        };

        if !state.found {
            tracing::warn!("reviews tab disappeared before it could be clicked");
            TabActivation::NotFound
        } else if state.already_active {
            tracing::info!("reviews tab already active");
            TabActivation::AlreadyActive
        } else {
            tracing::info!("clicked reviews tab");
            self.delay.pause("after-tab-click").await;
            TabActivation::Clicked
        }
    }

    /// Wait for at least one review element. Absence is fatal.
    pub async fn wait_for_reviews(&self) -> ScrapeResult<()> {
        let timeout_ms = self.config.reviews_wait_ms;
        let present = wait_for_true(
            self.page,
            &scripts::probe(&self.config.selectors.review_items),
            timeout_ms,
            self.config.poll_interval_ms,
        )
        .await;
        if present {
            Ok(())
        } else {
            Err(ScrapeError::ReviewsNotPresent { timeout_ms })
        }
    }

    async fn measure(&self, script: &PageScript) -> ScrapeResult<Measurement> {
        let value = self.page.execute_js(script.source()).await?;
        serde_json::from_value(value)
            .map_err(|e| ScrapeError::Script(format!("unexpected measurement: {e}")))
    }

    /// Scroll the reviews container until the cap or the settle rule stops it.
    pub async fn load_more(&self) -> ScrapeResult<LoadOutcome> {
        let catalog = &self.config.selectors;
        let scroll = scripts::scroll_to_bottom(catalog);
        let measure = scripts::measure(catalog);

        let initial = self.measure(&measure).await?;
        if !initial.found {
            tracing::warn!("scrollable reviews container not found, skipping incremental load");
            return Ok(LoadOutcome {
                attempts: 0,
                review_count: initial.count,
                reason: StopReason::ContainerMissing,
            });
        }

        let mut tracker = SettleTracker::new(
            initial.height as u64,
            self.config.max_reviews,
            self.config.no_change_threshold,
        );
        let reason = loop {
            if let Some(reason) = tracker.stop_reason() {
                break reason;
            }
            self.page.execute_js(scroll.source()).await?;
            self.delay.pause("scroll").await;
            let m = self.measure(&measure).await?;
            tracker.observe(m.height as u64, m.count);
            tracing::debug!(
                attempt = tracker.attempts(),
                height = m.height,
                no_change = tracker.no_change(),
                reviews = m.count,
                "scrolled reviews"
            );
        };

        tracing::info!(
            attempts = tracker.attempts(),
            reviews = tracker.review_count(),
            ?reason,
            "finished loading reviews"
        );
        Ok(LoadOutcome {
            attempts: tracker.attempts(),
            review_count: tracker.review_count(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settles_after_threshold_unchanged_attempts() {
        let mut tracker = SettleTracker::new(1000, 50, 15);
        // Height grows for three attempts, then stops changing.
        for height in [1200, 1400, 1600] {
            tracker.observe(height, 10);
            assert!(tracker.stop_reason().is_none());
        }
        let mut extra = 0;
        while tracker.stop_reason().is_none() {
            tracker.observe(1600, 10);
            extra += 1;
            assert!(extra <= 15);
        }
        assert_eq!(extra, 15);
        assert_eq!(tracker.stop_reason(), Some(StopReason::Settled));
        assert_eq!(tracker.attempts(), 18);
    }

    #[test]
    fn test_growth_resets_counter() {
        let mut tracker = SettleTracker::new(100, 50, 3);
        tracker.observe(100, 1);
        tracker.observe(100, 1);
        assert_eq!(tracker.no_change(), 2);
        tracker.observe(200, 2);
        assert_eq!(tracker.no_change(), 0);
        assert!(tracker.stop_reason().is_none());
    }

    #[test]
    fn test_cap_wins_over_growth() {
        let mut tracker = SettleTracker::new(100, 50, 15);
        tracker.observe(500, 49);
        assert!(tracker.stop_reason().is_none());
        tracker.observe(900, 55);
        assert_eq!(tracker.stop_reason(), Some(StopReason::ReachedCap));
    }

    #[test]
    fn test_recycled_nodes_stop_early() {
        // Virtualized lists that swap nodes without growing settle below the cap.
        let mut tracker = SettleTracker::new(800, 50, 2);
        tracker.observe(800, 20);
        tracker.observe(800, 20);
        assert_eq!(tracker.stop_reason(), Some(StopReason::Settled));
        assert_eq!(tracker.review_count(), 20);
    }
}
