//! # Middleware
//!
//! Rate limiting and transaction ids for the HTTP API.
//!
//! ## Configuration
//!
//! - `CONCORDANCE_RATE_LIMIT`: requests per second (default: 100, 0 disables)

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the transaction id, in both directions.
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a global rate limiter allowing `requests_per_second`.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Rate limiting middleware. Answers 429 once the quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TRANSACTION ID
// =============================================================================

/// Transaction id of the current request, stamped on every event it emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId(pub String);

/// A fresh transaction id.
pub fn new_transaction_id() -> String {
    format!("tid_{}", Uuid::new_v4().simple())
}

/// Take the transaction id from `X-Request-Id` or mint one, expose it to
/// handlers as a [`TransactionId`] extension and echo it on the response.
pub async fn transaction_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let transaction_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(new_transaction_id);

    request
        .extensions_mut()
        .insert(TransactionId(transaction_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&transaction_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

// =============================================================================
// TESTS
// =============================================================================
