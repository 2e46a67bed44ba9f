//! # Graph Operations
//!
//! Typed mutations produced by the planner and executed by a store adapter.
//!
//! Operations carry ids and values, never query text. A batch is ordered and
//! is applied as one atomic unit.

use crate::graph::{Identifier, Properties};
use crate::policy::RelationKind;

/// One planned mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOp {
    /// Strip a source node down to a bare stub: labels, properties,
    /// identifiers, relationships and equivalence are removed.
    /// Creates the stub if the node is absent.
    ClearSource { uuid: String },

    /// Strip a canonical node down to a bare stub and detach its members.
    /// Creates the stub if the node is absent.
    ClearCanonical { pref_uuid: String },

    /// Detach every member and remove the canonical node.
    DeleteCanonical { pref_uuid: String },

    /// Replace a canonical node's labels and properties.
    SetCanonical {
        pref_uuid: String,
        labels: Vec<String>,
        props: Properties,
    },

    /// Replace a source node's labels and properties, keeping its edges.
    SetSource {
        uuid: String,
        labels: Vec<String>,
        props: Properties,
    },

    /// Point a source at a canonical, replacing any previous equivalence.
    /// Fails if the canonical does not exist.
    LinkEquivalence { uuid: String, pref_uuid: String },

    AttachIdentifier {
        uuid: String,
        identifier: Identifier,
    },

    /// Add a relationship edge from a source. A missing target is created
    /// as a bare stub.
    Relate {
        uuid: String,
        relation: RelationKind,
        target: String,
        props: Properties,
    },
}

impl GraphOp {
    /// Short operation name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClearSource { .. } => "clear_source",
            Self::ClearCanonical { .. } => "clear_canonical",
            Self::DeleteCanonical { .. } => "delete_canonical",
            Self::SetCanonical { .. } => "set_canonical",
            Self::SetSource { .. } => "set_source",
            Self::LinkEquivalence { .. } => "link_equivalence",
            Self::AttachIdentifier { .. } => "attach_identifier",
            Self::Relate { .. } => "relate",
        }
    }
}
