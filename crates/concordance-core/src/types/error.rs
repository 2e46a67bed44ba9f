use thiserror::Error;

/// Errors that can occur in the concordance engine.
///
/// - No silent failures
/// - Use `Result<T, ConcordanceError>` for fallible operations
/// - A missing canonical id on read is `Ok(None)`, never an error
#[derive(Debug, Error)]
pub enum ConcordanceError {
    /// The payload is malformed or incomplete. The write was not attempted.
    #[error("invalid request, {0}")]
    InvalidRequest(String),

    /// The write would move the anchor of another multi-member concordance.
    #[error(
        "cannot currently process this record as it will break an existing concordance with prefUUID {canonical_id} (source {source_id})"
    )]
    ConcordanceConflict {
        source_id: String,
        canonical_id: String,
    },

    /// Stored state contradicts the engine's invariants.
    #[error(
        "data integrity violation: source {source_id} is the only member of non-matching canonical {canonical_id}"
    )]
    DataIntegrityViolation {
        source_id: String,
        canonical_id: String,
    },

    /// None of a node's stored labels maps to a known kind.
    #[error("unrecognized type for {id}: labels {labels:?}")]
    UnrecognizedType { id: String, labels: Vec<String> },

    /// The store could not be reached or the atomic batch failed.
    #[error("store error: {0}")]
    Store(String),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ConcordanceError {
    /// Build an `InvalidRequest` naming a missing field and the offending id.
    pub fn missing(field: &str, id: &str) -> Self {
        Self::InvalidRequest(format!("no {} has been supplied for {}", field, id))
    }
}
