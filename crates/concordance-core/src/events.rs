//! # Change Events
//!
//! The change record returned by every successful write: the touched source
//! ids and an ordered, replayable event list.

use crate::kind::ConceptKind;
use serde::{Deserialize, Serialize};

/// What happened to a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventDetails {
    #[serde(rename = "Concept Updated")]
    ConceptUpdated,

    #[serde(rename = "Concordance Added")]
    ConcordanceAdded {
        #[serde(rename = "oldID")]
        old_id: String,
        #[serde(rename = "newID")]
        new_id: String,
    },

    #[serde(rename = "Concordance Removed")]
    ConcordanceRemoved {
        #[serde(rename = "oldID")]
        old_id: String,
        #[serde(rename = "newID")]
        new_id: String,
    },
}

/// One emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub concept_type: String,
    #[serde(rename = "conceptUUID")]
    pub concept_uuid: String,
    pub aggregate_hash: String,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub event_details: EventDetails,
}

impl Event {
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self.event_details, EventDetails::ConceptUpdated)
    }

    #[must_use]
    pub fn is_concordance_change(&self) -> bool {
        !self.is_update()
    }
}

/// Fingerprint and transaction id shared by every event of one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStamp {
    pub aggregate_hash: String,
    pub transaction_id: String,
}

impl EventStamp {
    #[must_use]
    pub fn new(aggregate_hash: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            aggregate_hash: aggregate_hash.into(),
            transaction_id: transaction_id.into(),
        }
    }

    fn event(&self, kind: ConceptKind, concept_uuid: &str, details: EventDetails) -> Event {
        Event {
            concept_type: kind.label().to_string(),
            concept_uuid: concept_uuid.to_string(),
            aggregate_hash: self.aggregate_hash.clone(),
            transaction_id: self.transaction_id.clone(),
            event_details: details,
        }
    }

    #[must_use]
    pub fn updated(&self, kind: ConceptKind, id: &str) -> Event {
        self.event(kind, id, EventDetails::ConceptUpdated)
    }

    #[must_use]
    pub fn added(&self, kind: ConceptKind, concept_uuid: &str, old_id: &str, new_id: &str) -> Event {
        self.event(
            kind,
            concept_uuid,
            EventDetails::ConcordanceAdded {
                old_id: old_id.to_string(),
                new_id: new_id.to_string(),
            },
        )
    }

    #[must_use]
    pub fn removed(
        &self,
        kind: ConceptKind,
        concept_uuid: &str,
        old_id: &str,
        new_id: &str,
    ) -> Event {
        self.event(
            kind,
            concept_uuid,
            EventDetails::ConcordanceRemoved {
                old_id: old_id.to_string(),
                new_id: new_id.to_string(),
            },
        )
    }
}

/// Output of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Source ids touched by the write, for downstream notification.
    #[serde(rename = "updatedIDs")]
    pub updated_ids: Vec<String>,
    pub events: Vec<Event>,
}

impl ChangeRecord {
    /// Number of `Concept Updated` events for the given id.
    #[must_use]
    pub fn updates_for(&self, id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.is_update() && e.concept_uuid == id)
            .count()
    }

    /// Events that add or remove a concordance.
    pub fn concordance_changes(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_concordance_change())
    }
}
