//! # redb-backed Graph Storage
//!
//! A disk-backed graph store using the redb embedded database.
//!
//! A whole operation batch runs inside one write transaction: it is committed
//! after the last operation, and dropping the transaction on the first error
//! aborts it. Readers use MVCC snapshots and never see a half-applied write.
//!
//! ## Layout
//!
//! - `sources`: source uuid -> postcard [`SourceRecord`]
//! - `canonicals`: canonical id -> postcard [`StoredNode`]
//! - `members`: (canonical id, source uuid) -> ()
//!
//! The `members` key order makes a canonical's members one contiguous range,
//! already sorted by source uuid.

use crate::ConcordanceError;
use crate::graph::{
    CanonicalRows, EquivalenceState, GraphStore, GraphView, GraphWriter, SourceRecord, StoredNode,
    apply_op, canonical_rows, equivalence_state,
};
use crate::ops::GraphOp;
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table,
    TableDefinition,
};
use std::fmt::Display;
use std::path::Path;

/// Table for source nodes: uuid -> serialized SourceRecord
const SOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("sources");

/// Table for canonical nodes: prefUUID -> serialized StoredNode
const CANONICALS: TableDefinition<&str, &[u8]> = TableDefinition::new("canonicals");

/// Table for equivalence: (prefUUID, source uuid) -> ()
const MEMBERS: TableDefinition<(&str, &str), ()> = TableDefinition::new("members");

fn store_err<E: Display>(e: E) -> ConcordanceError {
    ConcordanceError::Store(e.to_string())
}

fn codec_err<E: Display>(e: E) -> ConcordanceError {
    ConcordanceError::Serialization(e.to_string())
}

// =============================================================================
// TABLE HELPERS
// =============================================================================

fn read_source<T>(table: &T, id: &str) -> Result<Option<SourceRecord>, ConcordanceError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    table
        .get(id)
        .map_err(store_err)?
        .map(|data| postcard::from_bytes::<SourceRecord>(data.value()).map_err(codec_err))
        .transpose()
}

fn read_canonical<T>(table: &T, id: &str) -> Result<Option<StoredNode>, ConcordanceError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    table
        .get(id)
        .map_err(store_err)?
        .map(|data| postcard::from_bytes::<StoredNode>(data.value()).map_err(codec_err))
        .transpose()
}

fn read_members<T>(table: &T, canonical: &str) -> Result<Vec<String>, ConcordanceError>
where
    T: ReadableTable<(&'static str, &'static str), ()>,
{
    let start: (&str, &str) = (canonical, "");
    let mut members = Vec::new();
    for entry in table.range(start..).map_err(store_err)? {
        let (key, _) = entry.map_err(store_err)?;
        let (owner, source) = key.value();
        if owner != canonical {
            break;
        }
        members.push(source.to_string());
    }
    Ok(members)
}

// =============================================================================
// TRANSACTION VIEWS
// =============================================================================

/// Snapshot view over a read transaction.
struct RedbReader {
    sources: ReadOnlyTable<&'static str, &'static [u8]>,
    canonicals: ReadOnlyTable<&'static str, &'static [u8]>,
    members: ReadOnlyTable<(&'static str, &'static str), ()>,
}

impl GraphView for RedbReader {
    fn source(&self, id: &str) -> Result<Option<SourceRecord>, ConcordanceError> {
        read_source(&self.sources, id)
    }

    fn canonical(&self, id: &str) -> Result<Option<StoredNode>, ConcordanceError> {
        read_canonical(&self.canonicals, id)
    }

    fn members(&self, canonical: &str) -> Result<Vec<String>, ConcordanceError> {
        read_members(&self.members, canonical)
    }
}

/// Mutable view over an open write transaction.
struct RedbWriter<'txn> {
    sources: Table<'txn, &'static str, &'static [u8]>,
    canonicals: Table<'txn, &'static str, &'static [u8]>,
    members: Table<'txn, (&'static str, &'static str), ()>,
}

impl GraphView for RedbWriter<'_> {
    fn source(&self, id: &str) -> Result<Option<SourceRecord>, ConcordanceError> {
        read_source(&self.sources, id)
    }

    fn canonical(&self, id: &str) -> Result<Option<StoredNode>, ConcordanceError> {
        read_canonical(&self.canonicals, id)
    }

    fn members(&self, canonical: &str) -> Result<Vec<String>, ConcordanceError> {
        read_members(&self.members, canonical)
    }
}

impl GraphWriter for RedbWriter<'_> {
    fn put_source(&mut self, id: &str, record: SourceRecord) -> Result<(), ConcordanceError> {
        let bytes = postcard::to_allocvec(&record).map_err(codec_err)?;
        self.sources
            .insert(id, bytes.as_slice())
            .map_err(store_err)?;
        Ok(())
    }

    fn put_canonical(&mut self, id: &str, node: StoredNode) -> Result<(), ConcordanceError> {
        let bytes = postcard::to_allocvec(&node).map_err(codec_err)?;
        self.canonicals
            .insert(id, bytes.as_slice())
            .map_err(store_err)?;
        Ok(())
    }

    fn remove_canonical(&mut self, id: &str) -> Result<(), ConcordanceError> {
        for member in read_members(&self.members, id)? {
            self.members
                .remove((id, member.as_str()))
                .map_err(store_err)?;
        }
        self.canonicals.remove(id).map_err(store_err)?;
        Ok(())
    }

    fn add_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError> {
        self.members
            .insert((canonical, source), ())
            .map_err(store_err)?;
        Ok(())
    }

    fn remove_member(&mut self, canonical: &str, source: &str) -> Result<(), ConcordanceError> {
        self.members
            .remove((canonical, source))
            .map_err(store_err)?;
        Ok(())
    }
}

// =============================================================================
// REDB GRAPH
// =============================================================================

/// A disk-backed graph store using redb.
pub struct RedbGraph {
    db: Database,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph").finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a graph database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConcordanceError> {
        let db = Database::create(path.as_ref()).map_err(store_err)?;

        // Initialize tables if they don't exist
        let write_txn = db.begin_write().map_err(store_err)?;
        {
            write_txn.open_table(SOURCES).map_err(store_err)?;
            write_txn.open_table(CANONICALS).map_err(store_err)?;
            write_txn.open_table(MEMBERS).map_err(store_err)?;
        }
        write_txn.commit().map_err(store_err)?;

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), ConcordanceError> {
        self.db.compact().map_err(store_err)?;
        Ok(())
    }

    fn reader(&self) -> Result<RedbReader, ConcordanceError> {
        let txn = self.db.begin_read().map_err(store_err)?;
        Ok(RedbReader {
            sources: txn.open_table(SOURCES).map_err(store_err)?,
            canonicals: txn.open_table(CANONICALS).map_err(store_err)?,
            members: txn.open_table(MEMBERS).map_err(store_err)?,
        })
    }
}

impl GraphStore for RedbGraph {
    fn execute(&self, ops: &[GraphOp]) -> Result<(), ConcordanceError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;
        {
            let mut writer = RedbWriter {
                sources: write_txn.open_table(SOURCES).map_err(store_err)?,
                canonicals: write_txn.open_table(CANONICALS).map_err(store_err)?,
                members: write_txn.open_table(MEMBERS).map_err(store_err)?,
            };
            for op in ops {
                apply_op(&mut writer, op)?;
            }
        }
        write_txn.commit().map_err(store_err)?;
        Ok(())
    }

    fn equivalence_state(&self, id: &str) -> Result<Option<EquivalenceState>, ConcordanceError> {
        equivalence_state(&self.reader()?, id)
    }

    fn canonical_rows(&self, pref_uuid: &str) -> Result<Option<CanonicalRows>, ConcordanceError> {
        canonical_rows(&self.reader()?, pref_uuid)
    }

    fn canonical_count(&self) -> Result<usize, ConcordanceError> {
        let txn = self.db.begin_read().map_err(store_err)?;
        let table = txn.open_table(CANONICALS).map_err(store_err)?;
        Ok(table.len().map_err(store_err)? as usize)
    }

    fn canonical_ids(&self) -> Result<Vec<String>, ConcordanceError> {
        let txn = self.db.begin_read().map_err(store_err)?;
        let table = txn.open_table(CANONICALS).map_err(store_err)?;
        let mut ids = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (key, _) = entry.map_err(store_err)?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    fn check(&self) -> Result<(), ConcordanceError> {
        let txn = self.db.begin_read().map_err(store_err)?;
        txn.open_table(SOURCES).map_err(store_err)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
