//! # Content Fingerprint
//!
//! A stable hash of a normalized aggregate, attached to every emitted event
//! and stored on the canonical node as `aggregateHash`.
//!
//! Normalization makes the hash independent of source order, relation order
//! and empty optional fields. The stored hash and the write stamp are not
//! part of the input. The fingerprint is a change-tracking tag only: it
//! never suppresses a write.

use crate::graph::{PropValue, Properties};
use crate::policy::{RelationKind, ScalarField};
use crate::types::{AggregateConcept, ConceptFields, ConceptRelations, SourceConcept};
use crate::ConcordanceError;
use serde::Serialize;

#[derive(Serialize)]
struct NormalizedSource<'a> {
    uuid: &'a str,
    pref_label: &'a str,
    kind: &'a str,
    authority: &'a str,
    authority_value: &'a str,
    fields: Vec<(&'static str, PropValue)>,
    edges: Vec<(&'static str, String, Properties)>,
}

#[derive(Serialize)]
struct NormalizedAggregate<'a> {
    pref_uuid: &'a str,
    pref_label: &'a str,
    kind: &'a str,
    fields: Vec<(&'static str, PropValue)>,
    edges: Vec<(&'static str, String, Properties)>,
    sources: Vec<NormalizedSource<'a>>,
}

fn normalize_fields(fields: &ConceptFields) -> Vec<(&'static str, PropValue)> {
    ScalarField::ALL
        .iter()
        .filter_map(|f| f.value(fields).map(|v| (f.key(), v)))
        .collect()
}

fn normalize_edges(relations: &ConceptRelations) -> Vec<(&'static str, String, Properties)> {
    let mut edges: Vec<_> = RelationKind::ALL
        .iter()
        .flat_map(|kind| {
            kind.edges(relations)
                .into_iter()
                .map(move |e| (kind.edge_type(), e.target, e.props))
        })
        .collect();
    edges.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    edges.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
    edges
}

fn normalize_source(source: &SourceConcept) -> NormalizedSource<'_> {
    NormalizedSource {
        uuid: &source.uuid,
        pref_label: &source.pref_label,
        kind: &source.kind,
        authority: &source.authority,
        authority_value: &source.authority_value,
        fields: normalize_fields(&source.fields),
        edges: normalize_edges(&source.relations),
    }
}

/// Hex blake3 digest of the normalized aggregate.
pub fn fingerprint(aggregate: &AggregateConcept) -> Result<String, ConcordanceError> {
    let mut sources: Vec<_> = aggregate
        .source_representations
        .iter()
        .map(normalize_source)
        .collect();
    sources.sort_by(|a, b| a.uuid.cmp(b.uuid));

    let normalized = NormalizedAggregate {
        pref_uuid: &aggregate.pref_uuid,
        pref_label: &aggregate.pref_label,
        kind: &aggregate.kind,
        fields: normalize_fields(&aggregate.fields),
        edges: normalize_edges(&aggregate.relations),
        sources,
    };

    let bytes = postcard::to_allocvec(&normalized)
        .map_err(|e| ConcordanceError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate() -> AggregateConcept {
        AggregateConcept::new("p", "Acme", "Organisation")
            .with_source(SourceConcept::new("a", "Acme", "Organisation", "TME", "a"))
            .with_source(SourceConcept::new("b", "Acme Ltd", "Organisation", "LEI", "b"))
    }

    #[test]
    fn fingerprint_is_stable() {
        let first = fingerprint(&aggregate()).expect("hash");
        let second = fingerprint(&aggregate()).expect("hash");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn source_order_does_not_matter() {
        let mut reordered = aggregate();
        reordered.source_representations.reverse();
        assert_eq!(
            fingerprint(&aggregate()).expect("hash"),
            fingerprint(&reordered).expect("hash")
        );
    }

    #[test]
    fn stored_hash_and_stamp_are_ignored() {
        let mut stamped = aggregate();
        stamped.aggregate_hash = Some("previous".to_string());
        stamped.source_representations[0].last_modified_epoch = Some(1_700_000_000);
        assert_eq!(
            fingerprint(&aggregate()).expect("hash"),
            fingerprint(&stamped).expect("hash")
        );
    }

    #[test]
    fn content_change_changes_hash() {
        let mut changed = aggregate();
        changed.fields.aliases = vec!["ACME Corp".to_string()];
        assert_ne!(
            fingerprint(&aggregate()).expect("hash"),
            fingerprint(&changed).expect("hash")
        );
    }
}
