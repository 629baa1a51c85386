//! Core data types for scraped reviews and cached review bundles.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Author name used when a review carries no readable author.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Placeholder avatar used when a review carries no profile photo.
pub const DEFAULT_PROFILE_PHOTO: &str = "https://lh3.googleusercontent.com/a/default-user";

/// A single normalized review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author_name: String,
    /// Star rating, 0 when the label could not be parsed.
    pub rating: u8,
    pub text: String,
    pub profile_photo_url: String,
    /// The relative-time text as shown on the page ("3 weeks ago").
    #[serde(default)]
    pub relative_time_description: String,
    /// Approximate publication time in epoch milliseconds.
    #[serde(default)]
    pub time: i64,
}

impl Review {
    pub fn is_anonymous(&self) -> bool {
        self.author_name == ANONYMOUS_AUTHOR
    }
}

/// The result of one scrape: the review list plus the place-level summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewBundle {
    /// Deduplicated reviews in page order.
    pub reviews: Vec<Review>,
    /// Aggregate rating, 0 when unknown.
    pub rating: f64,
    /// Total review count shown on the page, 0 when unknown.
    pub user_ratings_total: u64,
}

/// A cached bundle with the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: ReviewBundle,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
}

impl CacheEntry {
    /// An entry is readable only while `now - timestamp < ttl`.
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
