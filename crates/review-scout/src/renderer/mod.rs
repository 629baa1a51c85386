//! Renderer abstraction for browser-based page automation.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). Each scrape
//! launches its own renderer context: one browser process, one page.

pub mod chromium;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default desktop user-agent presented to scraped pages.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Errors raised at the renderer seam.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("browser not available: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Launch(String),

    #[error("navigation timed out after {timeout_ms}ms")]
    NavigationTimeout { timeout_ms: u64 },

    #[error("{0}")]
    Navigation(String),

    #[error("{0}")]
    Script(String),

    #[error("no page is open in this context")]
    NoPage,
}

pub type RenderResult<T> = Result<T, RenderError>;

/// How a browser instance is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchProfile {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Explicit Chromium binary. Discovered on the system when unset.
    pub chromium_path: Option<PathBuf>,
    /// Scrape targets are public pages, so certificate errors are ignored.
    pub ignore_certificate_errors: bool,
}

impl Default for LaunchProfile {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chromium_path: None,
            ignore_certificate_errors: true,
        }
    }
}

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time until the network went quiet, in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can launch isolated rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Launch a fresh browser process for one request.
    async fn launch(&self, profile: &LaunchProfile) -> RenderResult<Box<dyn RenderContext>>;
    /// Short engine name for logs.
    fn name(&self) -> &'static str;
}

/// One launched browser with at most one page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Open the page (tab) and apply the user-agent.
    async fn open_page(&mut self, user_agent: &str) -> RenderResult<()>;
    /// Navigate and wait for network quiescence, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> RenderResult<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> RenderResult<serde_json::Value>;
    /// Close the page and terminate the browser process.
    async fn close(self: Box<Self>) -> RenderResult<()>;
}

/// A no-op renderer used when Chromium is unavailable.
///
/// Cached bundles and widget configuration keep working; scrapes that miss
/// the cache fail at launch.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn launch(&self, _profile: &LaunchProfile) -> RenderResult<Box<dyn RenderContext>> {
        Err(RenderError::Unavailable(
            "Chromium not found; set SCOUT_CHROMIUM_PATH".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_renderer_refuses_launch() {
        let err = NoopRenderer
            .launch(&LaunchProfile::default())
            .await
            .err()
            .expect("noop renderer must not launch");
        assert!(matches!(err, RenderError::Unavailable(_)));
    }

    #[test]
    fn test_default_profile_matches_desktop_viewport() {
        let profile = LaunchProfile::default();
        assert_eq!((profile.viewport_width, profile.viewport_height), (1280, 800));
        assert!(profile.ignore_certificate_errors);
        assert!(profile.user_agent.contains("Chrome/"));
    }
}
