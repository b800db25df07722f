//! HTTP API Server for log action batches
//!
//! A lightweight local HTTP server that accepts a batch of log actions,
//! executes it with the shared [`LogActionExecutor`] and returns the
//! per-refId results.
//!
//! # Architecture
//!
//! ```text
//! Client                       logsdash
//! ┌──────────────┐            ┌──────────────────────────┐
//! │ poller / UI  │  HTTP POST │ API Server               │
//! │              ├───────────►│ validate token           │
//! └──────────────┘            │ LogActionExecutor        │
//!                             │   └─ LogStoreClient      │
//!                             └──────────────────────────┘
//! ```
//!
//! # Security
//!
//! - Random API token generated on server startup
//! - Each request validated with the X-API-Token header

#![warn(clippy::all, rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app::log_actions::{LogActionBatch, LogActionExecutor};

pub const API_TOKEN_HEADER: &str = "X-API-Token";

/// Running API server
pub struct ApiServer {
    /// Random token for authentication
    api_token: String,
    /// Address the server is listening on
    local_addr: SocketAddr,
    /// Server shutdown handle
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

/// Shared state passed to all request handlers
#[derive(Clone)]
struct AppState {
    api_token: Arc<str>,
    executor: LogActionExecutor,
}

impl ApiServer {
    /// Bind `bind` and start serving in a background task
    pub async fn start(bind: &str, executor: LogActionExecutor) -> anyhow::Result<Self> {
        Self::start_with_token(bind, executor, generate_api_token()).await
    }

    pub async fn start_with_token(
        bind: &str,
        executor: LogActionExecutor,
        api_token: String,
    ) -> anyhow::Result<Self> {
        info!("🔐 API token: {}...", api_token.get(..16).unwrap_or(&api_token));

        let app = router(api_token.clone(), executor);

        let listener = tokio::net::TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;

        info!("🚀 API server listening on http://{}", local_addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                log_error!("API server failed: {}", e);
            }
        });

        Ok(Self {
            api_token,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Get the API token clients must send
    pub fn token(&self) -> &str {
        &self.api_token
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the base URL for the API
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting requests and wait for in-flight ones to finish
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("🛑 API server shutdown initiated");
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("API server task ended abnormally: {}", e);
            }
        }
    }
}

/// Build the API router
pub fn router(api_token: String, executor: LogActionExecutor) -> Router {
    let state = AppState {
        api_token: Arc::from(api_token),
        executor,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/logs/query", post(handle_query_batch))
        .with_state(state)
        .layer(cors)
}

/// Generate a random API token (32 bytes = 64 hex characters)
fn generate_api_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// Validate API token from request headers
fn validate_token(headers: &HeaderMap, expected_token: &str) -> bool {
    headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|token| token == expected_token)
        .unwrap_or(false)
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Execute a batch of log actions.
///
/// The token is checked before the body is parsed.
async fn handle_query_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !validate_token(&headers, &state.api_token) {
        warn!("⚠️ Unauthorized API request: invalid token");
        return (StatusCode::FORBIDDEN, "Invalid API token").into_response();
    }

    let batch: LogActionBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("⚠️ Malformed batch body: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Invalid batch: {}", e)).into_response();
        }
    };

    info!("📨 Log action batch: {} requests", batch.queries.len());

    let response = state.executor.execute_batch(batch).await;

    match response.first_error() {
        Some((ref_id, error)) => warn!("❌ Batch completed with errors (first: {} - {})", ref_id, error),
        None => info!("✅ Batch completed: {} results", response.results.len()),
    }

    Json(response).into_response()
}
