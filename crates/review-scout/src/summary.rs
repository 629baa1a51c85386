//! Place-level summary: aggregate rating and total review count.
//!
//! Both reads are best-effort and independent of review extraction.

use crate::renderer::RenderContext;
use crate::scripts;
use crate::selectors::SelectorCatalog;
use serde::Deserialize;

/// Aggregate rating and total review count shown on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaceSummary {
    pub rating: f64,
    pub user_ratings_total: u64,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryText {
    rating_text: Option<String>,
    total_text: Option<String>,
}

/// Leading decimal number in `text` ("4.6", "4,6 stars"). Zero when absent.
pub fn parse_rating_value(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_separator = false;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if (c == '.' || c == ',') && !seen_separator && end == i && i > 0 {
            seen_separator = true;
        } else {
            break;
        }
    }
    trimmed[..end].replace(',', ".").parse().unwrap_or(0.0)
}

/// All digits in `text` read as one number ("(1,234)" → 1234). Zero when none.
pub fn parse_total_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Read the summary from the page. Failures log and yield zeros.
pub async fn extract_summary(page: &dyn RenderContext, catalog: &SelectorCatalog) -> PlaceSummary {
    let text = match page.execute_js(scripts::summary(catalog).source()).await {
        Ok(value) => serde_json::from_value::<SummaryText>(value).unwrap_or_else(|e| {
            tracing::warn!("unexpected summary result: {e}");
            SummaryText::default()
        }),
        Err(e) => {
            tracing::warn!("failed to read place summary: {e}");
            SummaryText::default()
        }
    };

    PlaceSummary {
        rating: text.rating_text.as_deref().map(parse_rating_value).unwrap_or(0.0),
        user_ratings_total: text.total_text.as_deref().map(parse_total_count).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_value() {
        assert_eq!(parse_rating_value("4.6"), 4.6);
        assert_eq!(parse_rating_value(" 4.6 "), 4.6);
        assert_eq!(parse_rating_value("4,6"), 4.6);
        assert_eq!(parse_rating_value("5"), 5.0);
        assert_eq!(parse_rating_value("4.6(1,234)"), 4.6);
        assert_eq!(parse_rating_value("4."), 4.0);
        assert_eq!(parse_rating_value("rating"), 0.0);
        assert_eq!(parse_rating_value(""), 0.0);
    }

    #[test]
    fn test_parse_total_count() {
        assert_eq!(parse_total_count("(1,234)"), 1234);
        assert_eq!(parse_total_count("1.234 reviews"), 1234);
        assert_eq!(parse_total_count("87 reviews"), 87);
        assert_eq!(parse_total_count("no reviews"), 0);
        assert_eq!(parse_total_count(""), 0);
    }
}
