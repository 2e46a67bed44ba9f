//! # concordance-core
//!
//! The concordance resolution engine for canonical concepts.
//!
//! Several authorities report the same real-world concept as independent
//! source records. A write names a canonical id and the source records that
//! denote it; this crate keeps that mapping globally consistent:
//!
//! - every source record belongs to exactly one canonical id
//! - a write never silently detaches another group's anchor
//! - dropped sources are re-anchored, emptied canonicals are deleted
//! - every write commits as one atomic batch and returns a change record
//!
//! ## Architectural Constraints
//!
//! - Synchronous, NO async, NO network dependencies
//! - The store is injected ([`GraphStore`]), never global
//! - Per-kind behaviour comes from the [`policy`] registry

// =============================================================================
// MODULES
// =============================================================================

pub mod authority;
pub mod events;
pub mod fingerprint;
pub mod graph;
pub mod kind;
pub mod ops;
pub mod planner;
pub mod policy;
pub mod primitives;
pub mod reconstruction;
pub mod resolution;
pub mod service;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    AggregateConcept, ConceptFields, ConceptRelations, ConcordanceError, MembershipRole,
    SourceConcept,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use authority::Authority;
pub use events::{ChangeRecord, Event, EventDetails, EventStamp};
pub use fingerprint::fingerprint;
pub use graph::{CanonicalRows, EquivalenceState, Graph, GraphStore};
pub use kind::ConceptKind;
pub use ops::GraphOp;
pub use planner::MutationPlanner;
pub use policy::{KindPolicy, RelationKind, ScalarField, policy};
pub use reconstruction::Reconstructor;
pub use resolution::{Resolution, ResolutionEngine, Transition, classify};
pub use service::ConceptService;
pub use storage::{RedbGraph, StorageBackend};
pub use validation::Validator;
