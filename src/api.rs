// src/api.rs
//! HTTP surface consumed by the web UI.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/tokenAnalyzer/analyze` | Analyze one token, options in the JSON body |
//! | `GET` | `/api/tokenAnalyzer/analyze/:tokenIdentifier` | Same, options as `?history=&days=&sentiment=` |
//! | `GET` | `/api/tokenAnalyzer/compare?tokens=a,b` | Analyze 2-5 tokens side by side |
//! | `GET` | `/api/tokenAnalyzer/trending` | Placeholder |
//! | `GET` | `/health` | Liveness |
//!
//! Analysis outcomes, including failed ones, are returned with `200` and a
//! `{ success, message? }` body. Malformed requests get `400`; a panic inside
//! a handler is caught and reported as `500` with the same body shape.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::analyzers::token_analyzer::{TokenAnalyzer, MISSING_IDENTIFIER_MESSAGE};
use crate::models::AnalysisOptions;
use crate::utils::{normalize_identifier, parse_flag};

pub const MIN_COMPARE_TOKENS: usize = 2;
pub const MAX_COMPARE_TOKENS: usize = 5;

// ── Request types ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub token_identifier: Option<String>,
    #[serde(default)]
    pub include_historical_data: bool,
    pub historical_days: Option<u32>,
    #[serde(default)]
    pub include_sentiment: bool,
}

/// Query flags arrive as strings from the UI (`history=true`, `days=30`).
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    pub history: Option<String>,
    pub days: Option<String>,
    pub sentiment: Option<String>,
}

impl AnalyzeQuery {
    fn options(&self) -> AnalysisOptions {
        AnalysisOptions::new(
            parse_flag(self.history.as_deref()),
            self.days.as_deref().and_then(|d| d.trim().parse().ok()),
            parse_flag(self.sentiment.as_deref()),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub tokens: Option<String>,
}

// ── Route builder ─────────────────────────────────────────────────────────

pub fn routes(analyzer: Arc<TokenAnalyzer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tokenAnalyzer/analyze", post(analyze_from_body))
        .route("/api/tokenAnalyzer/analyze/:token_identifier", get(analyze_from_path))
        .route("/api/tokenAnalyzer/compare", get(compare))
        .route("/api/tokenAnalyzer/trending", get(trending))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(analyzer)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// `POST /api/tokenAnalyzer/analyze`
async fn analyze_from_body(
    State(analyzer): State<Arc<TokenAnalyzer>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected analyze request: {}", rejection);
            return bad_request(&rejection.body_text());
        }
    };

    let Some(identifier) = request
        .token_identifier
        .as_deref()
        .filter(|id| !normalize_identifier(id).is_empty())
    else {
        return bad_request(MISSING_IDENTIFIER_MESSAGE);
    };

    let options = AnalysisOptions::new(
        request.include_historical_data,
        request.historical_days,
        request.include_sentiment,
    );

    Json(analyzer.analyze_token(identifier, options).await).into_response()
}

/// `GET /api/tokenAnalyzer/analyze/:tokenIdentifier`
async fn analyze_from_path(
    State(analyzer): State<Arc<TokenAnalyzer>>,
    Path(token_identifier): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Response {
    if normalize_identifier(&token_identifier).is_empty() {
        return bad_request(MISSING_IDENTIFIER_MESSAGE);
    }

    Json(analyzer.analyze_token(&token_identifier, query.options()).await).into_response()
}

/// `GET /api/tokenAnalyzer/compare?tokens=a,b,c`
async fn compare(State(analyzer): State<Arc<TokenAnalyzer>>, Query(query): Query<CompareQuery>) -> Response {
    let tokens: Vec<String> = query
        .tokens
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if !(MIN_COMPARE_TOKENS..=MAX_COMPARE_TOKENS).contains(&tokens.len()) {
        return bad_request(&format!(
            "Please provide between {} and {} tokens to compare",
            MIN_COMPARE_TOKENS, MAX_COMPARE_TOKENS
        ));
    }

    let comparison = analyzer.compare_tokens(&tokens, AnalysisOptions::default()).await;

    Json(json!({ "success": true, "comparison": comparison })).into_response()
}

/// `GET /api/tokenAnalyzer/trending`
async fn trending() -> impl IntoResponse {
    Json(json!({ "success": true, "message": "Trending tokens feature coming soon" }))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    error!("💥 Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": "Internal server error" })),
    )
        .into_response()
}
