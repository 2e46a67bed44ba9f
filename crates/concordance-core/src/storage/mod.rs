//! # Storage Backends
//!
//! The persistent adapter and the runtime backend selector.

mod redb_graph;

pub use redb_graph::RedbGraph;

use crate::ConcordanceError;
use crate::graph::{CanonicalRows, EquivalenceState, Graph, GraphStore};
use crate::ops::GraphOp;
use std::path::Path;

/// Storage backend selected at runtime.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(Graph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Graph::new())
    }
}

impl StorageBackend {
    /// Open or create a redb database at the given path.
    pub fn redb(path: impl AsRef<Path>) -> Result<Self, ConcordanceError> {
        Ok(Self::Persistent(RedbGraph::open(path)?))
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    fn store(&self) -> &dyn GraphStore {
        match self {
            Self::InMemory(graph) => graph,
            Self::Persistent(graph) => graph,
        }
    }
}

impl GraphStore for StorageBackend {
    fn execute(&self, ops: &[GraphOp]) -> Result<(), ConcordanceError> {
        self.store().execute(ops)
    }

    fn equivalence_state(&self, id: &str) -> Result<Option<EquivalenceState>, ConcordanceError> {
        self.store().equivalence_state(id)
    }

    fn canonical_rows(&self, pref_uuid: &str) -> Result<Option<CanonicalRows>, ConcordanceError> {
        self.store().canonical_rows(pref_uuid)
    }

    fn canonical_count(&self) -> Result<usize, ConcordanceError> {
        self.store().canonical_count()
    }

    fn canonical_ids(&self) -> Result<Vec<String>, ConcordanceError> {
        self.store().canonical_ids()
    }

    fn check(&self) -> Result<(), ConcordanceError> {
        self.store().check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_in_memory() {
        let backend = StorageBackend::default();
        assert!(!backend.is_persistent());
        assert_eq!(backend.canonical_count().expect("count"), 0);
    }

    #[test]
    fn redb_backend_is_persistent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let backend = StorageBackend::redb(temp.path().join("db.redb")).expect("open");
        assert!(backend.is_persistent());
        backend.check().expect("check");
    }
}
