//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use review_scout::ScrapeError;

/// Errors returned by the HTTP handlers, rendered as `{"error": "..."}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// A review request that cannot start a scrape. Reported like any other
    /// review failure.
    #[error("{0}")]
    ReviewRequest(String),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Scrape(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::ReviewRequest(_) | ApiError::Scrape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the caller.
    pub fn message(&self) -> String {
        match self {
            ApiError::Scrape(e) if e.is_not_found() => e.to_string(),
            ApiError::Scrape(e) => format!("Failed to fetch reviews: {e}"),
            ApiError::ReviewRequest(msg) => format!("Failed to fetch reviews: {msg}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reviews_maps_to_not_found() {
        let err = ApiError::from(ScrapeError::NoReviewsExtracted);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "No reviews found or failed to extract reviews.");
    }

    #[test]
    fn test_other_scrape_errors_are_internal() {
        let err = ApiError::from(ScrapeError::ReviewsNotPresent { timeout_ms: 30_000 });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().starts_with("Failed to fetch reviews: "));
    }

    #[test]
    fn test_invalid_review_request_is_internal() {
        let err = ApiError::ReviewRequest("URL is required".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to fetch reviews: URL is required");
    }

    #[test]
    fn test_bad_request_keeps_message() {
        let err = ApiError::BadRequest("URL is required".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "URL is required");
    }
}
