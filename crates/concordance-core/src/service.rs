//! # Concept Service
//!
//! The facade callers use: one generic engine over an injected store.
//!
//! ```text
//! write: validate -> fingerprint -> read P -> resolve -> plan -> execute
//! read:  canonical rows -> reconstruct
//! ```

use crate::events::{ChangeRecord, EventStamp};
use crate::fingerprint::fingerprint;
use crate::graph::GraphStore;
use crate::kind::ConceptKind;
use crate::planner::MutationPlanner;
use crate::reconstruction::Reconstructor;
use crate::resolution::ResolutionEngine;
use crate::types::AggregateConcept;
use crate::validation::Validator;
use crate::ConcordanceError;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Write and read concepts against a store.
#[derive(Debug, Default)]
pub struct ConceptService<S: GraphStore> {
    store: S,
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl<S: GraphStore> ConceptService<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write an aggregate and return the change record.
    ///
    /// The whole write is rejected, with nothing applied, on validation
    /// failure, concordance conflict or integrity violation.
    pub fn write(
        &self,
        aggregate: &AggregateConcept,
        transaction_id: &str,
    ) -> Result<ChangeRecord, ConcordanceError> {
        let kind = Validator::validate(aggregate)?;
        let aggregate_hash = fingerprint(aggregate)?;
        let stamp = EventStamp::new(aggregate_hash.clone(), transaction_id);

        let existing = self.read(&aggregate.pref_uuid, transaction_id)?;
        let resolution = ResolutionEngine::resolve(
            &self.store,
            aggregate,
            kind,
            existing.as_ref(),
            &stamp,
        )?;

        let ops = MutationPlanner::plan(
            aggregate,
            kind,
            &resolution,
            &aggregate_hash,
            epoch_seconds(),
        )?;
        debug!(
            transaction_id,
            pref_uuid = %aggregate.pref_uuid,
            operations = ops.len(),
            "executing write batch"
        );
        self.store.execute(&ops)?;

        info!(
            transaction_id,
            pref_uuid = %aggregate.pref_uuid,
            kind = %kind,
            sources = aggregate.source_representations.len(),
            unconcorded = resolution.unconcorded.len(),
            deleted = resolution.canonicals_to_delete.len(),
            "concept written"
        );

        Ok(ChangeRecord {
            updated_ids: resolution.updated_ids,
            events: resolution.events,
        })
    }

    /// Read the aggregate for a canonical id. `Ok(None)` when absent.
    pub fn read(
        &self,
        pref_uuid: &str,
        transaction_id: &str,
    ) -> Result<Option<AggregateConcept>, ConcordanceError> {
        debug!(transaction_id, pref_uuid, "reading concept");
        self.store
            .canonical_rows(pref_uuid)?
            .map(Reconstructor::reconstruct)
            .transpose()
    }

    /// Liveness probe against the store.
    pub fn check(&self) -> Result<(), ConcordanceError> {
        self.store.check()
    }

    /// Number of canonical concepts.
    pub fn count(&self) -> Result<usize, ConcordanceError> {
        self.store.canonical_count()
    }

    /// Number of canonical concepts labelled `kind`, descendants included.
    pub fn count_of(&self, kind: ConceptKind) -> Result<usize, ConcordanceError> {
        let mut total = 0;
        for id in self.store.canonical_ids()? {
            let labelled = self
                .store
                .canonical_rows(&id)?
                .is_some_and(|rows| rows.canonical.labels.iter().any(|l| l == kind.label()));
            if labelled {
                total += 1;
            }
        }
        Ok(total)
    }
}
