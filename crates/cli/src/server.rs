//! HTTP boundary.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Pipeline state |
//! | `POST` | `/chat` | Answer a question with its sources |
//!
//! Errors use a `{"detail": "..."}` body, including malformed request
//! bodies. A question shorter than
//! [`MIN_QUERY_CHARS`] is rejected with 400; a pipeline that could not be
//! initialized yields 503 with the not-initialized answer as detail.

use anyhow::Context;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use inquiry_knowledge::{Citation, Lifecycle, PipelineStatus, QueryStatus};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shortest accepted question, in characters after trimming.
pub const MIN_QUERY_CHARS: usize = 5;

#[derive(Clone)]
pub struct AppState {
    lifecycle: Arc<Lifecycle>,
}

impl AppState {
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    answer: String,
    sources: Vec<Citation>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    pipeline: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

/// Assemble the router with CORS and per-request tracing.
pub fn build_router(state: AppState, cors_origins: &[String]) -> anyhow::Result<Router> {
    let origins = cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{}'", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "request",
            request_id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Ok(Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(cors)
        .layer(trace)
        .with_state(state))
}

/// Bind and serve until Ctrl-C.
pub async fn run(lifecycle: Arc<Lifecycle>, cors_origins: &[String], port: u16) -> anyhow::Result<()> {
    let app = build_router(AppState::new(lifecycle), cors_origins)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Inquiry service is running. Use the /chat endpoint."
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.lifecycle.status();
    let reason = match &status {
        PipelineStatus::Failed { reason } => Some(reason.clone()),
        _ => None,
    };
    Json(HealthResponse {
        status: if status.is_ready() { "ok" } else { "degraded" },
        pipeline: status.as_str(),
        reason,
    })
}

async fn chat_handler(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected chat body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let query = request.query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Query must be at least {} characters long.",
                MIN_QUERY_CHARS
            ),
        );
    }

    tracing::info!(chars = query.chars().count(), "Chat query received");
    let response = state.lifecycle.query(query).await;

    if response.status == QueryStatus::NotInitialized {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, response.answer);
    }

    Json(ChatResponse {
        answer: response.answer,
        sources: response.citations,
    })
    .into_response()
}
