//! HTTP API for Review Scout.
//!
//! `POST /api/reviews` is the only route that reaches the scraper. The
//! widget routes are CRUD over the [`WidgetStore`], and anything else falls
//! through to the static widget assets.

use crate::error::ApiError;
use crate::widgets::{WidgetConfig, WidgetStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use review_scout::{ReviewBundle, ReviewScraper};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// State shared by every handler.
pub struct AppState {
    pub scraper: ReviewScraper,
    pub widgets: WidgetStore,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveWidgetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>, static_dir: impl Into<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/reviews", post(fetch_reviews))
        .route("/api/widgets", get(list_widgets))
        .route("/api/widgets/save", post(save_widget))
        .route("/api/widgets/get-url/:id", get(widget_url))
        .route("/api/widgets/:id", get(get_widget))
        .fallback_service(ServeDir::new(static_dir.into()))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn start(addr: SocketAddr, state: Arc<AppState>, static_dir: PathBuf) -> anyhow::Result<()> {
    let app = router(state, static_dir);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Review Scout listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "renderer": state.scraper.renderer_name(),
    }))
}

async fn fetch_reviews(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewBundle>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::ReviewRequest(e.body_text()))?;
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::ReviewRequest("URL is required".to_string()));
    }
    let bundle = state.scraper.fetch(url).await?;
    Ok(Json(bundle))
}

async fn save_widget(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveWidgetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WidgetConfig>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(name), Some(url)) = (non_empty(request.name), non_empty(request.url)) else {
        return Err(ApiError::BadRequest("Name and URL are required".to_string()));
    };
    let widget = state.widgets.save(&name, &url).await;
    Ok((StatusCode::CREATED, Json(widget)))
}

async fn list_widgets(State(state): State<Arc<AppState>>) -> Json<Vec<WidgetConfig>> {
    Json(state.widgets.list().await)
}

async fn get_widget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WidgetConfig>, ApiError> {
    state
        .widgets
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Widget not found".to_string()))
}

async fn widget_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let widget = state
        .widgets
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Widget not found".to_string()))?;
    Ok(Json(json!({ "url": widget.url })))
}
