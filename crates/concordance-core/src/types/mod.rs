//! # Core Type Definitions
//!
//! This module contains the payload and error types shared by every layer:
//! - Aggregate payloads (`AggregateConcept`, `SourceConcept`)
//! - Scalar and relationship field groups (`ConceptFields`, `ConceptRelations`)
//! - Error types (`ConcordanceError`)
//!
//! The JSON shape is camelCase and matches what the source systems publish.
//! Empty optional fields are omitted on output so that a read of a stored
//! aggregate compares equal to the payload that produced it.

mod concept;
mod error;

pub use concept::{
    AggregateConcept, ConceptFields, ConceptRelations, MembershipRole, SourceConcept,
};
pub use error::ConcordanceError;
