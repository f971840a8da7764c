//! # Layerconf HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//! The server holds one selection session over the loaded graph.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Node/layer counts and selection phase
//! - `GET /options` - Every option grouped by layer
//! - `GET /configs/{name}` - One node as a record
//! - `PUT /configs/{name}` - Replace top-level parameter keys
//! - `POST /configs` - Append a node
//! - `GET /selection` - Current selection
//! - `PUT /selection` - Replace the selection
//! - `DELETE /selection` - Clear the selection
//! - `GET /valid_options` - Options valid under the selection
//! - `GET /current_config` - Merged parameters of the selection
//!
//! ## Configuration (Environment Variables)
//!
//! - `LAYERCONF_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `layerconf::api::*`)
pub use handlers::{
    append_config_handler, current_config_handler, delete_selection_handler, get_config_handler,
    get_selection_handler, health_handler, options_handler, patch_config_handler,
    put_selection_handler, status_handler, valid_options_handler,
};
pub use types::{
    ApiError, ApiResult, AppendResponse, ErrorResponse, HealthResponse, OptionsResponse,
    SelectionRequest, SelectionResponse, StatusResponse,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use layerconf_core::{LayerConfError, Session};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "LAYERCONF_CORS_ORIGINS";

/// Request body limit (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the selection session.
#[derive(Clone)]
pub struct AppState {
    /// Selection mutations need `&mut Session`; the mutex serialises them.
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Create new app state with a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `LAYERCONF_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins ({}=*)", CORS_ORIGINS_ENV);
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                build_localhost_cors()
            } else {
                with_methods(CorsLayer::new().allow_origin(allowed_origins))
            }
        }
        None => {
            tracing::info!(
                "CORS: No {} set, defaulting to localhost only",
                CORS_ORIGINS_ENV
            );
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(cors: CorsLayer) -> CorsLayer {
    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/options", get(handlers::options_handler))
        .route("/configs", post(handlers::append_config_handler))
        .route(
            "/configs/{name}",
            get(handlers::get_config_handler).put(handlers::patch_config_handler),
        )
        .route(
            "/selection",
            get(handlers::get_selection_handler)
                .put(handlers::put_selection_handler)
                .delete(handlers::delete_selection_handler),
        )
        .route("/valid_options", get(handlers::valid_options_handler))
        .route("/current_config", get(handlers::current_config_handler))
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, session: Session) -> Result<(), LayerConfError> {
    let state = AppState::new(session);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LayerConfError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Layerconf HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LayerConfError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
