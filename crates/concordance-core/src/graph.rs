//! # Graph Engine
//!
//! Stored records, the store adapter contract and the in-memory adapter.
//!
//! The graph holds two node namespaces and one association:
//!
//! - **source nodes**, keyed by source uuid, carrying labels, properties,
//!   identifiers and outgoing relationship edges
//! - **canonical nodes**, keyed by canonical id, carrying labels and properties
//! - **equivalence**: each source points at no more than one canonical, and
//!   each canonical keeps its member set
//!
//! Operations are applied through the [`GraphWriter`] trait so that the
//! in-memory and redb adapters share one interpretation of every [`GraphOp`].
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::ConcordanceError;
use crate::ops::GraphOp;
use crate::policy::RelationKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

// =============================================================================
// STORED RECORDS
// =============================================================================

/// A stored property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropValue {
    Text(String),
    TextList(Vec<String>),
    Int(i64),
    Bool(bool),
}

/// Node properties keyed by property name.
pub type Properties = BTreeMap<String, PropValue>;

/// Labels and properties of a node. Empty labels and properties mean a stub.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredNode {
    /// Kind label chain, most specific first.
    pub labels: Vec<String>,
    pub props: Properties,
}

impl StoredNode {
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.labels.is_empty() && self.props.is_empty()
    }
}

/// An identifier node attached to a source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub authority: String,
    pub label: String,
    pub value: String,
}

/// An outgoing relationship edge from a source node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRelation {
    pub kind: RelationKind,
    pub target: String,
    pub props: Properties,
}

/// Everything stored for one source uuid.
///
/// `Default` is the bare stub: no labels, no edges, no equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    pub node: StoredNode,
    /// Canonical id this source is equivalent to.
    pub equivalent_to: Option<String>,
    pub identifiers: BTreeSet<Identifier>,
    pub relations: Vec<StoredRelation>,
}

/// Live equivalence state of a source id, read right before a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceState {
    pub source_id: String,
    /// The canonical the source points at, if any.
    pub canonical_id: Option<String>,
    /// Members of that canonical, sorted by id.
    pub members: Vec<String>,
}

/// One member source as returned for reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub uuid: String,
    pub node: StoredNode,
    pub identifiers: BTreeSet<Identifier>,
    pub relations: Vec<StoredRelation>,
}

/// A canonical node with its members, ordered by source id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRows {
    pub pref_uuid: String,
    pub canonical: StoredNode,
    pub sources: Vec<SourceRow>,
}

// =============================================================================
// VIEW / WRITER TRAITS
// =============================================================================

/// Raw record access, implemented by each adapter's transaction.
pub trait GraphView {
    fn source(&self, id: &str) -> Result<Option<SourceRecord>, ConcordanceError>;

    fn canonical(&self, id: &str) -> Result<Option<StoredNode>, ConcordanceError>;

    /// Member source ids of a canonical, sorted.
    fn members(&self, canonical: &str) -> Result<Vec<String>, ConcordanceError>;
}

/// Raw record mutation. Callers go through [`apply_op`].
pub trait GraphWriter: GraphView {
    fn put_source(&mut self, id: &str, record: SourceRecord) -> Result<(), ConcordanceError>;

    fn put_canonical(&mut self, id: &str, node: StoredNode) -> Result<(), ConcordanceError>;

    fn remove_canonical(&mut self, id: &str) -> Result<(), ConcordanceError>;

    fn add_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError>;

    fn remove_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError>;
}

/// Drop the equivalence of every member of `canonical`.
fn detach_members<W: GraphWriter + ?Sized>(
    writer: &mut W,
    canonical: &str,
) -> Result<(), ConcordanceError> {
    for member in writer.members(canonical)? {
        if let Some(mut record) = writer.source(&member)? {
            record.equivalent_to = None;
            writer.put_source(&member, record)?;
        }
        writer.remove_member(canonical, &member)?;
    }
    Ok(())
}

/// Apply one operation. Every adapter interprets operations through here.
pub fn apply_op<W: GraphWriter + ?Sized>(
    writer: &mut W,
    op: &GraphOp,
) -> Result<(), ConcordanceError> {
    match op {
        GraphOp::ClearSource { uuid } => {
            let previous = writer.source(uuid)?.and_then(|r| r.equivalent_to);
            if let Some(canonical) = previous {
                writer.remove_member(&canonical, uuid)?;
            }
            writer.put_source(uuid, SourceRecord::default())
        }
        GraphOp::ClearCanonical { pref_uuid } => {
            detach_members(writer, pref_uuid)?;
            writer.put_canonical(pref_uuid, StoredNode::default())
        }
        GraphOp::DeleteCanonical { pref_uuid } => {
            detach_members(writer, pref_uuid)?;
            writer.remove_canonical(pref_uuid)
        }
        GraphOp::SetCanonical {
            pref_uuid,
            labels,
            props,
        } => writer.put_canonical(
            pref_uuid,
            StoredNode {
                labels: labels.clone(),
                props: props.clone(),
            },
        ),
        GraphOp::SetSource {
            uuid,
            labels,
            props,
        } => {
            let mut record = writer.source(uuid)?.unwrap_or_default();
            record.node = StoredNode {
                labels: labels.clone(),
                props: props.clone(),
            };
            writer.put_source(uuid, record)
        }
        GraphOp::LinkEquivalence { uuid, pref_uuid } => {
            if writer.canonical(pref_uuid)?.is_none() {
                return Err(ConcordanceError::Store(format!(
                    "cannot link {} to missing canonical {}",
                    uuid, pref_uuid
                )));
            }
            let mut record = writer.source(uuid)?.unwrap_or_default();
            if let Some(previous) = record.equivalent_to.take() {
                if previous != *pref_uuid {
                    writer.remove_member(&previous, uuid)?;
                }
            }
            record.equivalent_to = Some(pref_uuid.clone());
            writer.put_source(uuid, record)?;
            writer.add_member(pref_uuid, uuid)
        }
        GraphOp::AttachIdentifier { uuid, identifier } => {
            let mut record = writer.source(uuid)?.unwrap_or_default();
            record.identifiers.insert(identifier.clone());
            writer.put_source(uuid, record)
        }
        GraphOp::Relate {
            uuid,
            relation,
            target,
            props,
        } => {
            let mut record = writer.source(uuid)?.unwrap_or_default();
            let edge = StoredRelation {
                kind: *relation,
                target: target.clone(),
                props: props.clone(),
            };
            match record
                .relations
                .iter_mut()
                .find(|r| r.kind == *relation && r.target == *target)
            {
                Some(existing) => *existing = edge,
                None => record.relations.push(edge),
            }
            writer.put_source(uuid, record)?;

            if writer.source(target)?.is_none() {
                writer.put_source(target, SourceRecord::default())?;
            }
            Ok(())
        }
    }
}

/// Read the equivalence state of a source id.
///
/// `None` when no node exists for the id.
pub fn equivalence_state<V: GraphView + ?Sized>(
    view: &V,
    id: &str,
) -> Result<Option<EquivalenceState>, ConcordanceError> {
    let Some(record) = view.source(id)? else {
        return Ok(None);
    };
    let members = match &record.equivalent_to {
        Some(canonical) => view.members(canonical)?,
        None => Vec::new(),
    };
    Ok(Some(EquivalenceState {
        source_id: id.to_string(),
        canonical_id: record.equivalent_to,
        members,
    }))
}

/// Gather a canonical node and its member sources.
pub fn canonical_rows<V: GraphView + ?Sized>(
    view: &V,
    pref_uuid: &str,
) -> Result<Option<CanonicalRows>, ConcordanceError> {
    let Some(canonical) = view.canonical(pref_uuid)? else {
        return Ok(None);
    };

    let mut sources = Vec::new();
    for member in view.members(pref_uuid)? {
        let record = view.source(&member)?.ok_or_else(|| {
            ConcordanceError::Store(format!(
                "member {} of {} has no source record",
                member, pref_uuid
            ))
        })?;
        sources.push(SourceRow {
            uuid: member,
            node: record.node,
            identifiers: record.identifiers,
            relations: record.relations,
        });
    }

    Ok(Some(CanonicalRows {
        pref_uuid: pref_uuid.to_string(),
        canonical,
        sources,
    }))
}

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The store adapter contract.
///
/// Adapters take `&self` and apply a batch atomically: either every
/// operation lands or none does.
pub trait GraphStore: Send + Sync {
    /// Execute an ordered batch of operations as one atomic unit.
    fn execute(&self, ops: &[GraphOp]) -> Result<(), ConcordanceError>;

    fn equivalence_state(&self, id: &str) -> Result<Option<EquivalenceState>, ConcordanceError>;

    fn canonical_rows(&self, pref_uuid: &str) -> Result<Option<CanonicalRows>, ConcordanceError>;

    /// Number of canonical nodes.
    fn canonical_count(&self) -> Result<usize, ConcordanceError>;

    /// Every canonical id, sorted.
    fn canonical_ids(&self) -> Result<Vec<String>, ConcordanceError>;

    /// Liveness probe.
    fn check(&self) -> Result<(), ConcordanceError>;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

#[derive(Debug, Clone, Default)]
struct GraphState {
    sources: BTreeMap<String, SourceRecord>,
    canonicals: BTreeMap<String, StoredNode>,
    members: BTreeMap<String, BTreeSet<String>>,
}

impl GraphView for GraphState {
    fn source(&self, id: &str) -> Result<Option<SourceRecord>, ConcordanceError> {
        Ok(self.sources.get(id).cloned())
    }

    fn canonical(&self, id: &str) -> Result<Option<StoredNode>, ConcordanceError> {
        Ok(self.canonicals.get(id).cloned())
    }

    fn members(&self, canonical: &str) -> Result<Vec<String>, ConcordanceError> {
        Ok(self
            .members
            .get(canonical)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }
}

impl GraphWriter for GraphState {
    fn put_source(&mut self, id: &str, record: SourceRecord) -> Result<(), ConcordanceError> {
        self.sources.insert(id.to_string(), record);
        Ok(())
    }

    fn put_canonical(&mut self, id: &str, node: StoredNode) -> Result<(), ConcordanceError> {
        self.canonicals.insert(id.to_string(), node);
        Ok(())
    }

    fn remove_canonical(&mut self, id: &str) -> Result<(), ConcordanceError> {
        self.canonicals.remove(id);
        self.members.remove(id);
        Ok(())
    }

    fn add_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError> {
        self.members
            .entry(canonical.to_string())
            .or_default()
            .insert(source.to_string());
        Ok(())
    }

    fn remove_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError> {
        if let Some(members) = self.members.get_mut(canonical) {
            members.remove(source);
            if members.is_empty() {
                self.members.remove(canonical);
            }
        }
        Ok(())
    }
}

/// The in-memory graph.
///
/// A batch is applied to a copy of the state under the write lock and
/// swapped in only when every operation succeeded.
#[derive(Debug, Default)]
pub struct Graph {
    state: RwLock<GraphState>,
}

fn poisoned<T>(_: T) -> ConcordanceError {
    ConcordanceError::Store("graph lock poisoned".to_string())
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of source nodes, stubs included.
    pub fn source_count(&self) -> Result<usize, ConcordanceError> {
        Ok(self.state.read().map_err(poisoned)?.sources.len())
    }
}

impl GraphStore for Graph {
    fn execute(&self, ops: &[GraphOp]) -> Result<(), ConcordanceError> {
        let mut guard = self.state.write().map_err(poisoned)?;
        let mut next = guard.clone();
        for op in ops {
            apply_op(&mut next, op)?;
        }
        *guard = next;
        Ok(())
    }

    fn equivalence_state(&self, id: &str) -> Result<Option<EquivalenceState>, ConcordanceError> {
        let state = self.state.read().map_err(poisoned)?;
        equivalence_state(&*state, id)
    }

    fn canonical_rows(&self, pref_uuid: &str) -> Result<Option<CanonicalRows>, ConcordanceError> {
        let state = self.state.read().map_err(poisoned)?;
        canonical_rows(&*state, pref_uuid)
    }

    fn canonical_count(&self) -> Result<usize, ConcordanceError> {
        Ok(self.state.read().map_err(poisoned)?.canonicals.len())
    }

    fn canonical_ids(&self) -> Result<Vec<String>, ConcordanceError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.canonicals.keys().cloned().collect())
    }

    fn check(&self) -> Result<(), ConcordanceError> {
        self.state.read().map_err(poisoned).map(|_| ())
    }
}

// =============================================================================
// TESTS
// =============================================================================
