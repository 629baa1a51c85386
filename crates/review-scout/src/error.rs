//! Error taxonomy for the scrape pipeline and the review cache.

use crate::renderer::RenderError;

/// Errors surfaced by the orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no review elements appeared within {timeout_ms}ms")]
    ReviewsNotPresent { timeout_ms: u64 },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("No reviews found or failed to extract reviews.")]
    NoReviewsExtracted,

    /// A single review element could not be read. Recoverable: logged and
    /// skipped by the extractor, never returned from a fetch.
    #[error("review element {index} could not be extracted: {message}")]
    ExtractionElement { index: usize, message: String },

    #[error("browser session is not ready: {0}")]
    Session(String),
}

impl ScrapeError {
    /// Whether the error means "nothing to return" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::NoReviewsExtracted)
    }
}

impl From<RenderError> for ScrapeError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Unavailable(msg) | RenderError::Launch(msg) => ScrapeError::Launch(msg),
            RenderError::NavigationTimeout { timeout_ms } => ScrapeError::NavigationTimeout {
                url: String::new(),
                timeout_ms,
            },
            RenderError::Navigation(msg) => ScrapeError::Navigation(msg),
            RenderError::Script(msg) => ScrapeError::Script(msg),
            RenderError::NoPage => ScrapeError::Session("no page open".to_string()),
        }
    }
}

/// Failures of the durable cache document. Always degraded by the cache
/// store itself; callers never see these.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
