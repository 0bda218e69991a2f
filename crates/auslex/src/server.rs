//! HTTP search endpoint.
//!
//! Exposes the retriever to the answer-assembly layer as a small JSON
//! API. Answer streaming, authentication, and prompt orchestration all
//! live in that outer layer — this server returns the full snippet list
//! synchronously.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Retrieve snippets for `{query, jurisdiction?, as_at?, limit?}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `search_failed` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use auslex_core::models::{Snippet, SnippetQuery};
use auslex_core::retriever::{InvalidQuery, Retriever};

use crate::config::Config;
use crate::embedding;
use crate::store;

/// Shared application state: one retriever reused across requests.
#[derive(Clone)]
struct AppState {
    retriever: Arc<Retriever>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Fails at startup (not per request) when no embedding provider is
/// configured, since every search needs one.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if !config.embedding.is_enabled() {
        anyhow::bail!("Serving requires embeddings. Set [embedding] provider in config.");
    }

    let store = store::open_store(config).await?;
    let provider = embedding::create_provider(&config.embedding)?;
    let retriever = Arc::new(Retriever::with_options(
        store,
        provider,
        config.retriever_options(),
    ));

    let app = router(AppState { retriever });

    println!("AusLex retrieval listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Maps retrieval errors to HTTP statuses: the retriever marks
/// client-input rejections with [`InvalidQuery`], everything else
/// (provider, store) is a server failure.
fn classify_search_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if err.is::<InvalidQuery>() {
        bad_request(msg)
    } else {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "search_failed".to_string(),
            message: msg,
        }
    }
}

// ============ POST /search ============

/// Handler for `POST /search`.
///
/// Body: `{"query": "...", "jurisdiction"?: "...", "as_at"?: "YYYY-MM-DD",
/// "limit"?: n}` (`"question"` is accepted as an alias for `"query"`).
/// Responds with the ordered snippet array — no wrapper, no pagination.
async fn handle_search(
    State(state): State<AppState>,
    Json(query): Json<SnippetQuery>,
) -> Result<Json<Vec<Snippet>>, AppError> {
    if query.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let results = state
        .retriever
        .search(&query)
        .await
        .map_err(classify_search_error)?;

    Ok(Json(results))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`. Used by load balancers and monitoring.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
