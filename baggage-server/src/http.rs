//! Baggage checker HTTP API
//!
//! Axum-based HTTP server exposing item checks and stored history.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - GET  /                        — liveness banner
//! - GET  /health                  — health check for deployment monitoring
//! - POST /check-item              — check an item given in the JSON body
//! - GET  /check-item/:item        — check an item given in the path
//! - GET  /stored-responses        — stored answers, newest first (limit/offset)
//! - GET  /stored-responses/:item  — stored answers for one item

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use baggage_core::completion::CompletionBackend;
use baggage_core::error::ServiceError;
use baggage_core::models::{ItemQuery, ItemRequest, RecordFilter};
use baggage_core::storage::RecordStore;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::subsystems::{check, history};

pub const SERVICE_NAME: &str = "TSA Item Checker API";

/// Shared state for all HTTP handlers. Both clients are built once at startup.
#[derive(Clone)]
pub struct HttpState {
    pub completion: Arc<dyn CompletionBackend>,
    pub store: Option<Arc<dyn RecordStore>>,
}

impl HttpState {
    fn store(&self) -> Option<&dyn RecordStore> {
        self.store.as_deref()
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/check-item", post(check_item_handler))
        .route("/check-item/:item", get(check_item_path_handler))
        .route("/stored-responses", get(stored_responses_handler))
        .route("/stored-responses/:item", get(stored_responses_for_item_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    addr: &str,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("{} listening on http://{}", SERVICE_NAME, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn root_inner() -> serde_json::Value {
    serde_json::json!({
        "message": "TSA Item Checker API is running!",
        "status": "healthy",
    })
}

pub fn health_inner() -> serde_json::Value {
    serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    })
}

/// Inner check — shared by the POST body and GET path variants.
pub async fn check_item_inner(state: &HttpState, raw_item: &str) -> (StatusCode, serde_json::Value) {
    match check::check_item(state.completion.as_ref(), state.store(), raw_item).await {
        Ok(response) => (StatusCode::OK, to_json(&response)),
        Err(e) => error_to_http(&e),
    }
}

pub async fn stored_responses_inner(
    state: &HttpState,
    params: PageParams,
) -> (StatusCode, serde_json::Value) {
    let filter = RecordFilter::new(None, params.limit, params.offset);

    match history::list_stored(state.store(), &filter).await {
        Ok(rows) => (
            StatusCode::OK,
            serde_json::json!({
                "count": rows.len(),
                "responses": rows,
                "limit": filter.limit,
                "offset": filter.offset,
            }),
        ),
        Err(e) => error_to_http(&e),
    }
}

pub async fn stored_responses_for_item_inner(
    state: &HttpState,
    raw_item: &str,
    params: PageParams,
) -> (StatusCode, serde_json::Value) {
    let query = match ItemQuery::parse(raw_item) {
        Ok(q) => q,
        Err(e) => return error_to_http(&e),
    };
    let filter = RecordFilter::new(Some(query.item().to_string()), params.limit, params.offset);

    match history::list_stored(state.store(), &filter).await {
        Ok(rows) => (
            StatusCode::OK,
            serde_json::json!({
                "item": query.item(),
                "count": rows.len(),
                "responses": rows,
            }),
        ),
        Err(e) => error_to_http(&e),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(health_inner()))
}

pub async fn check_item_handler(
    State(state): State<Arc<HttpState>>,
    request: Result<Json<ItemRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match request {
        Ok(Json(req)) => check_item_inner(&state, &req.item).await,
        Err(e) => rejection_to_http(e.status(), format!("Invalid JSON body: {}", e.body_text())),
    };
    (status, Json(body))
}

pub async fn check_item_path_handler(
    State(state): State<Arc<HttpState>>,
    Path(item): Path<String>,
) -> impl IntoResponse {
    let (status, body) = check_item_inner(&state, &item).await;
    (status, Json(body))
}

pub async fn stored_responses_handler(
    State(state): State<Arc<HttpState>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> impl IntoResponse {
    let (status, body) = match params {
        Ok(Query(params)) => stored_responses_inner(&state, params).await,
        Err(e) => query_rejection_to_http(&e),
    };
    (status, Json(body))
}

pub async fn stored_responses_for_item_handler(
    State(state): State<Arc<HttpState>>,
    Path(item): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> impl IntoResponse {
    let (status, body) = match params {
        Ok(Query(params)) => stored_responses_for_item_inner(&state, &item, params).await,
        Err(e) => query_rejection_to_http(&e),
    };
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Configuration(_)
        | ServiceError::Upstream(_)
        | ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_to_http(error: &ServiceError) -> (StatusCode, serde_json::Value) {
    (status_for(error), to_json(&ErrorResponse::new(error.to_string())))
}

fn rejection_to_http(status: StatusCode, message: String) -> (StatusCode, serde_json::Value) {
    (status, to_json(&ErrorResponse::new(message)))
}

fn query_rejection_to_http(rejection: &QueryRejection) -> (StatusCode, serde_json::Value) {
    rejection_to_http(
        rejection.status(),
        format!("Invalid query parameters: {}", rejection.body_text()),
    )
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        serde_json::json!({
            "error": format!("failed to encode response: {}", e),
            "status": "error",
        })
    })
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
