//! # API Request/Response Types
//!
//! JSON bodies for the HTTP API and the mapping from URL path segments to
//! concept kinds. Write requests and read responses are the core
//! `AggregateConcept` itself; a successful write answers with the core
//! `ChangeRecord`.

use concordance_core::ConceptKind;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// COUNT RESPONSE
// =============================================================================

/// Number of canonical concepts served under one kind path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// KIND PATHS
// =============================================================================

/// URL path segment for each kind. A path serves its kind and every
/// descendant, so `/organisations` accepts public companies.
pub const KIND_PATHS: [(&str, ConceptKind); 19] = [
    ("concepts", ConceptKind::Concept),
    ("classifications", ConceptKind::Classification),
    ("sections", ConceptKind::Section),
    ("subjects", ConceptKind::Subject),
    ("special-reports", ConceptKind::SpecialReport),
    ("genres", ConceptKind::Genre),
    ("brands", ConceptKind::Brand),
    ("alphaville-series", ConceptKind::AlphavilleSeries),
    ("topics", ConceptKind::Topic),
    ("locations", ConceptKind::Location),
    ("people", ConceptKind::Person),
    ("organisations", ConceptKind::Organisation),
    ("companies", ConceptKind::Company),
    ("public-companies", ConceptKind::PublicCompany),
    ("private-companies", ConceptKind::PrivateCompany),
    ("memberships", ConceptKind::Membership),
    ("membership-roles", ConceptKind::MembershipRole),
    ("board-roles", ConceptKind::BoardRole),
    ("financial-instruments", ConceptKind::FinancialInstrument),
];

/// The kind served by a path segment.
pub fn kind_for_path(segment: &str) -> Option<ConceptKind> {
    KIND_PATHS
        .iter()
        .find(|(path, _)| *path == segment)
        .map(|(_, kind)| *kind)
}

/// Whether a path's kind serves a payload or stored `type`.
///
/// Unknown types are admitted here and rejected by validation, which names
/// the offending id.
pub fn admits(path_kind: ConceptKind, payload_kind: &str) -> bool {
    payload_kind
        .parse::<ConceptKind>()
        .map(|kind| kind.is_a(path_kind))
        .unwrap_or(true)
}
