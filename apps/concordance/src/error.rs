//! # Application Errors
//!
//! Everything the binary can fail with. Engine errors pass through unchanged
//! so the HTTP layer can map them to status codes.

use concordance_core::ConcordanceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Concordance(#[from] ConcordanceError),

    #[error("io error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid payload: {0}")]
    Payload(String),
}
