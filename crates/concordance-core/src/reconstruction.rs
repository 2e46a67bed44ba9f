//! # Read / Reconstruction
//!
//! Regroups a canonical node and its member sources into the aggregate shape.
//!
//! - each node's kind is resolved from its stored label chain
//! - fields come back through the policy field table
//! - blank relation targets are dropped, relation lists sorted
//! - the `lastModifiedEpoch` stamp is stripped
//! - aggregate relations are derived from the sources

use crate::graph::{CanonicalRows, PropValue, Properties, SourceRow};
use crate::kind::ConceptKind;
use crate::policy::ScalarField;
use crate::primitives::{AGGREGATE_HASH, AUTHORITY, AUTHORITY_VALUE, PREF_LABEL};
use crate::types::{AggregateConcept, ConceptFields, ConceptRelations, MembershipRole, SourceConcept};
use crate::ConcordanceError;
use std::collections::BTreeMap;

fn text(props: &Properties, key: &str) -> Option<String> {
    match props.get(key) {
        Some(PropValue::Text(value)) => Some(value.clone()),
        _ => None,
    }
}

fn fields_from(props: &Properties) -> ConceptFields {
    let mut fields = ConceptFields::default();
    for (key, value) in props {
        if let Some(field) = ScalarField::from_key(key) {
            field.assign(&mut fields, value);
        }
    }
    fields
}

fn tidy(ids: &mut Vec<String>) {
    ids.retain(|id| !id.is_empty());
    ids.sort();
    ids.dedup();
}

fn tidy_single(id: &mut Option<String>) {
    if id.as_deref().is_some_and(str::is_empty) {
        *id = None;
    }
}

fn tidy_roles(roles: &mut Vec<MembershipRole>) {
    roles.retain(|r| !r.role_uuid.is_empty());
    roles.sort();
    roles.dedup_by(|a, b| a.role_uuid == b.role_uuid);
}

/// Collapse blank placeholders and put relation lists in a stable order.
fn normalize(relations: &mut ConceptRelations) {
    tidy(&mut relations.parent_uuids);
    tidy(&mut relations.broader_uuids);
    tidy(&mut relations.related_uuids);
    tidy(&mut relations.superseded_by_uuids);
    tidy_single(&mut relations.organisation_uuid);
    tidy_single(&mut relations.person_uuid);
    tidy_single(&mut relations.issued_by);
    tidy_single(&mut relations.parent_organisation);
    tidy_roles(&mut relations.membership_roles);
}

/// Aggregate relations: list union, first single value in source order,
/// roles keyed by role id.
fn derive_relations(sources: &[SourceConcept]) -> ConceptRelations {
    let mut derived = ConceptRelations::default();
    let mut roles: BTreeMap<String, MembershipRole> = BTreeMap::new();

    for source in sources {
        let rel = &source.relations;
        derived.parent_uuids.extend(rel.parent_uuids.iter().cloned());
        derived.broader_uuids.extend(rel.broader_uuids.iter().cloned());
        derived.related_uuids.extend(rel.related_uuids.iter().cloned());
        derived
            .superseded_by_uuids
            .extend(rel.superseded_by_uuids.iter().cloned());

        derived.organisation_uuid = derived
            .organisation_uuid
            .take()
            .or_else(|| rel.organisation_uuid.clone());
        derived.person_uuid = derived.person_uuid.take().or_else(|| rel.person_uuid.clone());
        derived.issued_by = derived.issued_by.take().or_else(|| rel.issued_by.clone());
        derived.parent_organisation = derived
            .parent_organisation
            .take()
            .or_else(|| rel.parent_organisation.clone());

        for role in &rel.membership_roles {
            roles
                .entry(role.role_uuid.clone())
                .or_insert_with(|| role.clone());
        }
    }

    derived.membership_roles = roles.into_values().collect();
    normalize(&mut derived);
    derived
}

/// Reconstruction of stored rows into aggregates.
pub struct Reconstructor;

impl Reconstructor {
    /// Rebuild the aggregate for a canonical node and its members.
    pub fn reconstruct(rows: CanonicalRows) -> Result<AggregateConcept, ConcordanceError> {
        let kind = ConceptKind::most_specific(&rows.pref_uuid, &rows.canonical.labels)?;
        let props = &rows.canonical.props;

        let sources = rows
            .sources
            .into_iter()
            .map(Self::source)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AggregateConcept {
            pref_label: text(props, PREF_LABEL).unwrap_or_default(),
            kind: kind.label().to_string(),
            aggregate_hash: text(props, AGGREGATE_HASH),
            fields: fields_from(props),
            relations: derive_relations(&sources),
            source_representations: sources,
            pref_uuid: rows.pref_uuid,
        })
    }

    fn source(row: SourceRow) -> Result<SourceConcept, ConcordanceError> {
        let kind = ConceptKind::most_specific(&row.uuid, &row.node.labels)?;
        let props = &row.node.props;

        let mut relations = ConceptRelations::default();
        for relation in &row.relations {
            relation
                .kind
                .absorb(&mut relations, &relation.target, &relation.props);
        }
        normalize(&mut relations);

        Ok(SourceConcept {
            pref_label: text(props, PREF_LABEL).unwrap_or_default(),
            kind: kind.label().to_string(),
            authority: text(props, AUTHORITY).unwrap_or_default(),
            authority_value: text(props, AUTHORITY_VALUE).unwrap_or_default(),
            last_modified_epoch: None,
            fields: fields_from(props),
            relations,
            uuid: row.uuid,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
