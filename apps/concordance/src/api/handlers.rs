//! # API Endpoint Handlers
//!
//! The engine is synchronous and the redb adapter blocks on disk, so every
//! store call runs on the blocking pool.

use super::{
    AppState,
    middleware::TransactionId,
    types::{CountResponse, ErrorResponse, HealthResponse, admits, kind_for_path},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use concordance_core::{
    AggregateConcept, ChangeRecord, ConceptKind, ConceptService, ConcordanceError,
    StorageBackend,
};
use std::sync::Arc;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// An error answer: status plus [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

/// The status an engine error is answered with.
pub fn status_for(err: &ConcordanceError) -> StatusCode {
    match err {
        ConcordanceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ConcordanceError::ConcordanceConflict { .. } => StatusCode::CONFLICT,
        ConcordanceError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        ConcordanceError::DataIntegrityViolation { .. }
        | ConcordanceError::UnrecognizedType { .. }
        | ConcordanceError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ConcordanceError> for ApiError {
    fn from(err: ConcordanceError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// Run a service call on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&ConceptService<StorageBackend>) -> Result<T, ConcordanceError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "blocking task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })?
        .map_err(ApiError::from)
}

fn path_kind(segment: &str) -> Result<ConceptKind, ApiError> {
    kind_for_path(segment)
        .ok_or_else(|| ApiError::not_found(format!("no concept type is served at /{}", segment)))
}

// =============================================================================
// PROBES
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Good-to-go: 200 only when the store answers.
pub async fn gtg_handler(State(state): State<AppState>) -> Response {
    match run_blocking(&state, |service| service.check()).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(err) => {
            tracing::warn!(error = %err.message, "store is not good to go");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, err.message).into_response()
        }
    }
}

// =============================================================================
// COUNT
// =============================================================================

/// Number of canonical concepts under a kind path.
pub async fn count_handler(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Json<CountResponse>, ApiError> {
    let kind = path_kind(&segment)?;
    let count = run_blocking(&state, move |service| service.count_of(kind)).await?;
    Ok(Json(CountResponse {
        kind: kind.to_string(),
        count,
    }))
}

// =============================================================================
// READ
// =============================================================================

/// Read the aggregate for a canonical id.
pub async fn read_handler(
    State(state): State<AppState>,
    Path((segment, uuid)): Path<(String, String)>,
    Extension(TransactionId(transaction_id)): Extension<TransactionId>,
) -> Result<Json<AggregateConcept>, ApiError> {
    let kind = path_kind(&segment)?;
    let id = uuid.clone();
    let found = run_blocking(&state, move |service| service.read(&id, &transaction_id)).await?;

    match found {
        Some(aggregate) if admits(kind, &aggregate.kind) => Ok(Json(aggregate)),
        _ => Err(ApiError::not_found(format!("{} {} not found", kind, uuid))),
    }
}

// =============================================================================
// WRITE
// =============================================================================

/// Write an aggregate. Answers with the change record.
pub async fn write_handler(
    State(state): State<AppState>,
    Path((segment, uuid)): Path<(String, String)>,
    Extension(TransactionId(transaction_id)): Extension<TransactionId>,
    Json(aggregate): Json<AggregateConcept>,
) -> Result<Json<ChangeRecord>, ApiError> {
    let kind = path_kind(&segment)?;

    if aggregate.pref_uuid != uuid {
        return Err(ApiError::bad_request(format!(
            "uuid {} in the path does not match prefUUID {} in the payload",
            uuid, aggregate.pref_uuid
        )));
    }
    if !admits(kind, &aggregate.kind) {
        return Err(ApiError::bad_request(format!(
            "type {} is not served at /{}",
            aggregate.kind, segment
        )));
    }

    let record = run_blocking(&state, move |service| {
        service.write(&aggregate, &transaction_id)
    })
    .await?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_class() {
        let conflict = ConcordanceError::ConcordanceConflict {
            source_id: "s".to_string(),
            canonical_id: "c".to_string(),
        };
        assert_eq!(status_for(&conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&ConcordanceError::missing("prefLabel", "p")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ConcordanceError::Store("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ConcordanceError::DataIntegrityViolation {
                source_id: "s".to_string(),
                canonical_id: "c".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
