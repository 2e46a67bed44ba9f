//! # Concordance HTTP API
//!
//! ## Endpoints
//!
//! - `PUT /{kind-path}/{uuid}` - Write an aggregate, answer the change record
//! - `GET /{kind-path}/{uuid}` - Read an aggregate
//! - `GET /{kind-path}/__count` - Count canonical concepts of a kind
//! - `GET /__health` - Health check
//! - `GET /__gtg` - Good-to-go, 503 when the store is unreachable
//!
//! Every response carries `X-Request-Id`: the caller's, or a generated
//! `tid_` id that also stamps the write's events.
//!
//! ## Security Configuration
//!
//! - `CONCORDANCE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `CONCORDANCE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::ApiKey;
pub use handlers::{ApiError, status_for};
pub use middleware::{REQUEST_ID, TransactionId, create_rate_limiter, new_transaction_id};
pub use types::{CountResponse, ErrorResponse, HealthResponse, KIND_PATHS, kind_for_path};

use crate::{AppError, config::Settings};
use axum::{
    Router, middleware as axum_middleware,
    routing::{get, put},
};
use concordance_core::{ConceptService, StorageBackend};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConceptService<StorageBackend>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: StorageBackend) -> Self {
        Self {
            service: Arc::new(ConceptService::new(store)),
        }
    }
}

/// Authentication and throttling for the router.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    pub api_key: Option<String>,
    /// Requests per second; 0 disables.
    pub rate_limit: u32,
}

impl From<&Settings> for AccessConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            rate_limit: settings.rate_limit,
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. Transaction id - reads or mints `X-Request-Id`
/// 3. Rate Limiting - protects the store (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState, access: &AccessConfig) -> Router {
    let mut router = Router::new()
        .route("/__health", get(handlers::health_handler))
        .route("/__gtg", get(handlers::gtg_handler))
        .route("/{kind}/__count", get(handlers::count_handler))
        .route(
            "/{kind}/{uuid}",
            put(handlers::write_handler).get(handlers::read_handler),
        );

    match access.api_key.as_deref() {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                ApiKey::new(key),
                auth::api_key_auth_middleware,
            ));
        }
        None => tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set CONCORDANCE_API_KEY to enable authentication."
        ),
    }

    if access.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", access.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(access.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum_middleware::from_fn(middleware::transaction_id_middleware))
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(settings: &Settings, store: StorageBackend) -> Result<(), AppError> {
    let router = create_router(AppState::new(store), &AccessConfig::from(settings));
    let addr = settings.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Concordance HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}
