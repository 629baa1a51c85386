//! Review extraction: expand truncated text, read every review element,
//! normalize the raw fields, deduplicate by text, and cap the result.

use crate::config::ScrapeConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::relative_time::parse_review_time;
use crate::renderer::RenderContext;
use crate::scripts;
use crate::types::{Review, ANONYMOUS_AUTHOR, DEFAULT_PROFILE_PHOTO};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Field values exactly as read from one review element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawReview {
    pub author: Option<String>,
    pub rating_label: Option<String>,
    pub text: Option<String>,
    pub time_text: Option<String>,
    pub avatar: Option<String>,
}

/// Per-element result of the extraction script.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementOutcome {
    Ok(RawReview),
    Error(String),
}

/// Leading numeral of an accessibility label ("4 stars" → 4). Zero when
/// absent, unparseable, or out of range.
pub fn parse_rating(label: &str) -> u8 {
    let token = label.split_whitespace().next().unwrap_or("");
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u8>() {
        Ok(rating) if rating <= 5 => rating,
        _ => 0,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn raw field values into a [`Review`] with defaults applied.
pub fn normalize(raw: RawReview, now: DateTime<Utc>) -> Review {
    let author_name = raw
        .author
        .as_deref()
        .map(collapse_whitespace)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

    let relative_time_description = raw.time_text.as_deref().unwrap_or("").trim().to_string();
    let time = parse_review_time(&relative_time_description, now).timestamp_millis();

    let profile_photo_url = raw
        .avatar
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE_PHOTO.to_string());

    Review {
        author_name,
        rating: raw.rating_label.as_deref().map(parse_rating).unwrap_or(0),
        text: raw.text.as_deref().unwrap_or("").trim().to_string(),
        profile_photo_url,
        relative_time_description,
        time,
    }
}

/// Reviews keyed by exact text, in first-seen order.
///
/// A later review with the same text replaces an anonymous one in place;
/// a named review is never replaced.
#[derive(Debug, Default)]
pub struct ReviewSet {
    reviews: Vec<Review>,
    by_text: HashMap<String, usize>,
}

impl ReviewSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the review was added or replaced an anonymous one.
    pub fn insert(&mut self, review: Review) -> bool {
        match self.by_text.get(&review.text) {
            Some(&index) => {
                if self.reviews[index].is_anonymous() {
                    self.reviews[index] = review;
                    true
                } else {
                    false
                }
            }
            None => {
                self.by_text.insert(review.text.clone(), self.reviews.len());
                self.reviews.push(review);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// The first `max` reviews in first-seen order.
    pub fn into_capped(mut self, max: usize) -> Vec<Review> {
        self.reviews.truncate(max);
        self.reviews
    }
}

/// Deduplicate then truncate to `max`.
pub fn dedupe_and_cap<I>(reviews: I, max: usize) -> Vec<Review>
where
    I: IntoIterator<Item = Review>,
{
    let mut set = ReviewSet::new();
    for review in reviews {
        set.insert(review);
    }
    set.into_capped(max)
}

/// Collect the successful outcomes, logging and skipping failed elements.
pub fn collect_outcomes(outcomes: Vec<ElementOutcome>, now: DateTime<Utc>) -> Vec<Review> {
    outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| match outcome {
            ElementOutcome::Ok(raw) => Some(normalize(raw, now)),
            ElementOutcome::Error(message) => {
                let err = ScrapeError::ExtractionElement { index, message };
                tracing::warn!("skipping review: {err}");
                None
            }
        })
        .collect()
}

/// Reads reviews from a loaded page.
pub struct ReviewExtractor<'a> {
    page: &'a dyn RenderContext,
    config: &'a ScrapeConfig,
}

impl<'a> ReviewExtractor<'a> {
    pub fn new(page: &'a dyn RenderContext, config: &'a ScrapeConfig) -> Self {
        Self { page, config }
    }

    /// Click every "more" control, then wait until the review text stops
    /// growing. The wait is bounded by `clicked × expand_settle_ms` and ends
    /// early if the page cannot be polled.
    pub async fn expand_truncated(&self) -> ScrapeResult<usize> {
        let catalog = &self.config.selectors;
        let clicked = self
            .page
            .execute_js(scripts::expand_truncated(catalog).source())
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        if clicked == 0 {
            return Ok(0);
        }

        let bound = Duration::from_millis(self.config.expand_settle_ms.saturating_mul(clicked as u64));
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let deadline = Instant::now() + bound;
        let volume_script = scripts::text_volume(catalog);
        let mut last: Option<u64> = None;

        while Instant::now() < deadline {
            tokio::time::sleep(poll).await;
            let volume = match self.page.execute_js(volume_script.source()).await {
                Ok(value) => value.as_u64(),
                Err(e) => {
                    tracing::debug!("text volume poll failed, reading reviews as they are: {e}");
                    break;
                }
            };
            if volume.is_some() && volume == last {
                break;
            }
            last = volume;
        }
        tracing::debug!(clicked, "expanded truncated reviews");
        Ok(clicked)
    }

    /// Expand, read, normalize, deduplicate, and cap.
    pub async fn extract(&self) -> ScrapeResult<Vec<Review>> {
        self.expand_truncated().await?;

        let catalog = &self.config.selectors;
        let script = scripts::extract_reviews(&catalog.review_items, &catalog.fields);
        let value = self.page.execute_js(script.source()).await?;
        let outcomes: Vec<ElementOutcome> = serde_json::from_value(value)
            .map_err(|e| ScrapeError::Script(format!("unexpected extraction result: {e}")))?;

        let element_count = outcomes.len();
        let reviews = collect_outcomes(outcomes, Utc::now());
        let reviews = dedupe_and_cap(reviews, self.config.max_reviews);
        tracing::info!(elements = element_count, unique = reviews.len(), "extracted reviews");
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(author: &str, text: &str) -> Review {
        Review {
            author_name: author.to_string(),
            rating: 5,
            text: text.to_string(),
            profile_photo_url: DEFAULT_PROFILE_PHOTO.to_string(),
            relative_time_description: String::new(),
            time: 0,
        }
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("5 stars"), 5);
        assert_eq!(parse_rating(" 4 stars "), 4);
        assert_eq!(parse_rating("4.0 out of 5"), 4);
        assert_eq!(parse_rating("1 star"), 1);
        assert_eq!(parse_rating("stars"), 0);
        assert_eq!(parse_rating(""), 0);
        assert_eq!(parse_rating("12 stars"), 0);
    }

    #[test]
    fn test_anonymous_replaced_by_named() {
        let reviews = dedupe_and_cap(
            vec![review(ANONYMOUS_AUTHOR, "Great food"), review("Jane", "Great food")],
            50,
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author_name, "Jane");
    }

    #[test]
    fn test_named_never_replaced() {
        let reviews = dedupe_and_cap(
            vec![
                review("Jane", "Great food"),
                review(ANONYMOUS_AUTHOR, "Great food"),
                review("John", "Great food"),
            ],
            50,
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author_name, "Jane");
    }

    #[test]
    fn test_replacement_keeps_first_seen_position() {
        let reviews = dedupe_and_cap(
            vec![
                review(ANONYMOUS_AUTHOR, "first"),
                review("Amy", "second"),
                review("Bob", "first"),
            ],
            50,
        );
        let order: Vec<_> = reviews.iter().map(|r| (r.author_name.as_str(), r.text.as_str())).collect();
        assert_eq!(order, vec![("Bob", "first"), ("Amy", "second")]);
    }

    #[test]
    fn test_cap_keeps_first_encountered() {
        let input: Vec<Review> = (0..80).map(|i| review("Jane", &format!("review {i}"))).collect();
        let reviews = dedupe_and_cap(input, 50);
        assert_eq!(reviews.len(), 50);
        assert_eq!(reviews[0].text, "review 0");
        assert_eq!(reviews[49].text, "review 49");
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let now = Utc::now();
        let review = normalize(RawReview::default(), now);
        assert_eq!(review.author_name, ANONYMOUS_AUTHOR);
        assert_eq!(review.rating, 0);
        assert_eq!(review.text, "");
        assert_eq!(review.profile_photo_url, DEFAULT_PROFILE_PHOTO);
        assert_eq!(review.time, now.timestamp_millis());
    }

    #[test]
    fn test_normalize_cleans_fields() {
        let now = Utc::now();
        let raw = RawReview {
            author: Some("  Jane \n   Doe ".to_string()),
            rating_label: Some("4 stars".to_string()),
            text: Some("  Lovely place  ".to_string()),
            time_text: Some("3 days ago".to_string()),
            avatar: Some("https://lh3.googleusercontent.com/a/jane".to_string()),
        };
        let review = normalize(raw, now);
        assert_eq!(review.author_name, "Jane Doe");
        assert_eq!(review.rating, 4);
        assert_eq!(review.text, "Lovely place");
        assert_eq!(review.relative_time_description, "3 days ago");
        assert_eq!(review.time, (now - chrono::Duration::days(3)).timestamp_millis());
        assert_eq!(review.profile_photo_url, "https://lh3.googleusercontent.com/a/jane");
    }

    #[test]
    fn test_blank_author_is_anonymous() {
        let raw = RawReview {
            author: Some("   ".to_string()),
            ..RawReview::default()
        };
        assert!(normalize(raw, Utc::now()).is_anonymous());
    }

    #[test]
    fn test_failed_elements_are_skipped() {
        let outcomes: Vec<ElementOutcome> = serde_json::from_value(serde_json::json!([
            { "ok": { "author": "Jane", "rating_label": "5 stars", "text": "Great food",
                      "time_text": "a week ago", "avatar": null } },
            { "error": "Cannot read properties of null" },
            { "ok": { "author": null, "rating_label": null, "text": "Okay",
                      "time_text": null, "avatar": null } }
        ]))
        .unwrap();
        let reviews = collect_outcomes(outcomes, Utc::now());
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].author_name, "Jane");
        assert_eq!(reviews[1].text, "Okay");
    }
}
