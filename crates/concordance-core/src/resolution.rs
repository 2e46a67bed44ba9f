//! # Concordance Resolution Engine
//!
//! Decides, against live store state, what a write does to every source id
//! it claims and to every source id it drops.
//!
//! For a write targeting canonical `P` with claimed set `Snew` and stored set
//! `Sold`:
//!
//! - `Sold - Snew` are unconcorded: each becomes its own singleton canonical
//! - `Snew - Sold` (all of `Snew` when `P` is new) are integrated after
//!   classifying their current equivalence with [`classify`]
//!
//! Unconcord events come first, then integrate events in payload order, then
//! exactly one `Concept Updated` for `P`.

use crate::events::{Event, EventStamp};
use crate::graph::{EquivalenceState, GraphStore};
use crate::kind::ConceptKind;
use crate::types::{AggregateConcept, SourceConcept};
use crate::ConcordanceError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// How a claimed source id moves into the written group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No node exists for the id.
    Create,
    /// A node exists but is not equivalent to any populated canonical.
    Attach,
    /// Already a member of the written canonical.
    Keep,
    /// The id anchors its own singleton canonical, which is absorbed.
    Absorb,
    /// Stale member of a foreign group that it does not anchor.
    Move { from: String },
    /// The id anchors a foreign multi-member group.
    Conflict { canonical: String },
    /// The id is the lone member of a canonical with a different id.
    Corrupt { canonical: String },
}

/// Classify one claimed source id.
#[must_use]
pub fn classify(pref_uuid: &str, source_id: &str, state: Option<&EquivalenceState>) -> Transition {
    let Some(state) = state else {
        return Transition::Create;
    };
    let Some(canonical) = state.canonical_id.as_deref() else {
        return Transition::Attach;
    };

    if canonical == pref_uuid {
        return Transition::Keep;
    }

    match state.members.len() {
        0 => Transition::Attach,
        1 if canonical == source_id => Transition::Absorb,
        1 => Transition::Corrupt {
            canonical: canonical.to_string(),
        },
        _ if canonical == source_id => Transition::Conflict {
            canonical: canonical.to_string(),
        },
        _ => Transition::Move {
            from: canonical.to_string(),
        },
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// The decisions for one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Stored sources dropped from the group, sorted by uuid, with the data
    /// they were stored with.
    pub unconcorded: Vec<SourceConcept>,
    /// Canonical ids that become empty and must be deleted.
    pub canonicals_to_delete: BTreeSet<String>,
    pub events: Vec<Event>,
    /// `Snew` in payload order followed by the unconcorded ids.
    pub updated_ids: Vec<String>,
}

/// Members of one foreign group claimed by a write.
#[derive(Debug, Default)]
struct ForeignClaim {
    members: Vec<String>,
    claimed: BTreeSet<String>,
}

/// The resolution engine.
pub struct ResolutionEngine;

impl ResolutionEngine {
    /// Resolve a validated aggregate against the store.
    ///
    /// `existing` is the stored aggregate for `P`, if any. Nothing is written;
    /// a conflict or integrity error aborts before planning.
    pub fn resolve<S: GraphStore + ?Sized>(
        store: &S,
        aggregate: &AggregateConcept,
        kind: ConceptKind,
        existing: Option<&AggregateConcept>,
        stamp: &EventStamp,
    ) -> Result<Resolution, ConcordanceError> {
        let pref = aggregate.pref_uuid.as_str();
        let claimed: BTreeSet<&str> = aggregate.source_ids().collect();
        let stored: BTreeSet<&str> = existing
            .map(|e| e.source_ids().collect())
            .unwrap_or_default();

        let mut resolution = Resolution::default();

        // Unconcord
        let mut leaving: Vec<&SourceConcept> = existing
            .map(|e| {
                e.source_representations
                    .iter()
                    .filter(|s| !claimed.contains(s.uuid.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        leaving.sort_by(|a, b| a.uuid.cmp(&b.uuid));

        for source in leaving {
            if source.uuid == pref {
                return Err(ConcordanceError::ConcordanceConflict {
                    source_id: source.uuid.clone(),
                    canonical_id: pref.to_string(),
                });
            }
            let source_kind: ConceptKind = source.kind.parse()?;
            debug!(source = %source.uuid, canonical = pref, "unconcording source");
            resolution
                .events
                .push(stamp.removed(source_kind, &source.uuid, pref, &source.uuid));
            resolution.unconcorded.push(source.clone());
        }

        // Integrate
        let mut foreign: BTreeMap<String, ForeignClaim> = BTreeMap::new();
        for source in &aggregate.source_representations {
            let id = source.uuid.as_str();
            if stored.contains(id) {
                continue;
            }
            let source_kind: ConceptKind = source.kind.parse()?;
            let state = store.equivalence_state(id)?;
            let transition = classify(pref, id, state.as_ref());
            debug!(source = id, canonical = pref, ?transition, "classified source");

            match transition {
                Transition::Create => {
                    if id != pref {
                        resolution.events.push(stamp.updated(source_kind, id));
                        resolution.events.push(stamp.added(source_kind, id, id, pref));
                    }
                }
                Transition::Attach | Transition::Keep => {}
                Transition::Absorb => {
                    resolution.canonicals_to_delete.insert(id.to_string());
                    resolution.events.push(stamp.added(source_kind, id, id, pref));
                }
                Transition::Move { from } => {
                    warn!(
                        source = id,
                        stale_canonical = %from,
                        canonical = pref,
                        "moving stale concordance"
                    );
                    resolution
                        .events
                        .push(stamp.removed(source_kind, &from, &from, id));
                    resolution.events.push(stamp.added(source_kind, id, id, pref));

                    let claim = foreign.entry(from).or_default();
                    if let Some(state) = state {
                        claim.members = state.members;
                    }
                    claim.claimed.insert(id.to_string());
                }
                Transition::Conflict { canonical } => {
                    return Err(ConcordanceError::ConcordanceConflict {
                        source_id: id.to_string(),
                        canonical_id: canonical,
                    });
                }
                Transition::Corrupt { canonical } => {
                    error!(
                        source = id,
                        canonical = %canonical,
                        "source is the lone member of a canonical it does not anchor"
                    );
                    return Err(ConcordanceError::DataIntegrityViolation {
                        source_id: id.to_string(),
                        canonical_id: canonical,
                    });
                }
            }
        }

        // Foreign groups emptied by this write. A group re-anchored above keeps
        // its unconcorded source.
        for (canonical, claim) in foreign {
            let reanchored = resolution.unconcorded.iter().any(|u| u.uuid == canonical);
            if !reanchored && claim.members.iter().all(|m| claim.claimed.contains(m)) {
                debug!(canonical = %canonical, "foreign canonical emptied, deleting");
                resolution.canonicals_to_delete.insert(canonical);
            }
        }

        resolution.events.push(stamp.updated(kind, pref));

        resolution.updated_ids = aggregate
            .source_ids()
            .map(str::to_string)
            .chain(resolution.unconcorded.iter().map(|s| s.uuid.clone()))
            .collect();

        Ok(resolution)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state(canonical: Option<&str>, members: &[&str]) -> EquivalenceState {
        EquivalenceState {
            source_id: "s".to_string(),
            canonical_id: canonical.map(str::to_string),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn absent_node_is_created() {
        assert_eq!(classify("p", "s", None), Transition::Create);
    }

    #[test]
    fn unattached_node_is_attached() {
        assert_eq!(
            classify("p", "s", Some(&state(None, &[]))),
            Transition::Attach
        );
    }

    #[test]
    fn singleton_anchor_is_absorbed() {
        assert_eq!(
            classify("p", "s", Some(&state(Some("s"), &["s"]))),
            Transition::Absorb
        );
    }

    #[test]
    fn singleton_non_anchor_is_corrupt() {
        assert_eq!(
            classify("p", "s", Some(&state(Some("t"), &["s"]))),
            Transition::Corrupt {
                canonical: "t".to_string()
            }
        );
    }

    #[test]
    fn member_of_target_is_kept() {
        assert_eq!(
            classify("p", "s", Some(&state(Some("p"), &["p", "s"]))),
            Transition::Keep
        );
    }

    #[test]
    fn foreign_anchor_conflicts() {
        assert_eq!(
            classify("p", "s", Some(&state(Some("s"), &["s", "x"]))),
            Transition::Conflict {
                canonical: "s".to_string()
            }
        );
    }

    #[test]
    fn foreign_non_anchor_moves() {
        assert_eq!(
            classify("p", "s", Some(&state(Some("t"), &["s", "t"]))),
            Transition::Move {
                from: "t".to_string()
            }
        );
    }
}
