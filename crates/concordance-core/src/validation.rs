//! # Validation
//!
//! Payload validation before anything is read from or written to the store.
//!
//! - Reject incomplete aggregates and source records
//! - Reject unknown or abstract kinds
//! - Reject duplicate source ids
//! - Run the kind's extra rules from the policy registry
//!
//! Unknown authorities are accepted with a warning; they simply get no
//! identifier node.

use crate::authority::Authority;
use crate::kind::ConceptKind;
use crate::policy::policy;
use crate::primitives::{MAX_ID_LENGTH, MAX_SOURCE_REPRESENTATIONS};
use crate::types::{AggregateConcept, ConceptRelations};
use crate::ConcordanceError;
use std::collections::BTreeSet;
use tracing::warn;

/// Aggregate payload validation.
pub struct Validator;

impl Validator {
    /// Validate an aggregate and return its kind.
    ///
    /// Error messages name the missing field and the id it was missing on:
    /// the aggregate's `prefUUID` for top-level fields, the source `uuid`
    /// for source fields.
    pub fn validate(aggregate: &AggregateConcept) -> Result<ConceptKind, ConcordanceError> {
        let pref = aggregate.pref_uuid.as_str();

        if pref.is_empty() {
            return Err(ConcordanceError::InvalidRequest(
                "no prefUUID has been supplied".to_string(),
            ));
        }
        if pref.len() > MAX_ID_LENGTH {
            return Err(ConcordanceError::InvalidRequest(format!(
                "prefUUID exceeds {} characters",
                MAX_ID_LENGTH
            )));
        }
        if aggregate.pref_label.is_empty() {
            return Err(ConcordanceError::missing("prefLabel", pref));
        }
        if aggregate.kind.is_empty() {
            return Err(ConcordanceError::missing("type", pref));
        }
        let kind = ConceptKind::writable(&aggregate.kind).ok_or_else(|| {
            ConcordanceError::InvalidRequest(format!(
                "invalid type {} has been supplied for {}",
                aggregate.kind, pref
            ))
        })?;

        let sources = &aggregate.source_representations;
        if sources.is_empty() {
            return Err(ConcordanceError::missing("sourceRepresentation", pref));
        }
        if sources.len() > MAX_SOURCE_REPRESENTATIONS {
            return Err(ConcordanceError::InvalidRequest(format!(
                "{} has more than {} sourceRepresentations",
                pref, MAX_SOURCE_REPRESENTATIONS
            )));
        }

        let mut seen = BTreeSet::new();
        for source in sources {
            let id = source.uuid.as_str();
            if id.is_empty() {
                return Err(ConcordanceError::missing("sourceRepresentation.uuid", pref));
            }
            if id.len() > MAX_ID_LENGTH {
                return Err(ConcordanceError::InvalidRequest(format!(
                    "source uuid exceeds {} characters in {}",
                    MAX_ID_LENGTH, pref
                )));
            }
            if source.pref_label.is_empty() {
                return Err(ConcordanceError::missing("sourceRepresentation.prefLabel", id));
            }
            if source.kind.is_empty() {
                return Err(ConcordanceError::missing("sourceRepresentation.type", id));
            }
            if ConceptKind::writable(&source.kind).is_none() {
                return Err(ConcordanceError::InvalidRequest(format!(
                    "invalid type {} has been supplied for source {}",
                    source.kind, id
                )));
            }
            if source.authority.is_empty() {
                return Err(ConcordanceError::missing("sourceRepresentation.authority", id));
            }
            if source.authority_value.is_empty() {
                return Err(ConcordanceError::missing(
                    "sourceRepresentation.authorityValue",
                    id,
                ));
            }
            if Authority::parse(&source.authority).is_none() {
                warn!(
                    source = id,
                    authority = %source.authority,
                    "unknown authority, no identifier will be stored"
                );
            }
            if !seen.insert(id) {
                return Err(ConcordanceError::InvalidRequest(format!(
                    "source {} appears more than once in {}",
                    id, pref
                )));
            }
        }

        let kind_policy = policy(kind);
        if !kind_policy.concordance_allowed && sources.len() > 1 {
            return Err(ConcordanceError::InvalidRequest(format!(
                "{} {} does not support concordance",
                kind, pref
            )));
        }
        for rule in kind_policy.rules {
            rule(aggregate)?;
        }

        Ok(kind)
    }
}

fn membership_links(relations: &ConceptRelations, id: &str) -> Result<(), ConcordanceError> {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    if !present(&relations.person_uuid) {
        return Err(ConcordanceError::missing("personUUID", id));
    }
    if !present(&relations.organisation_uuid) {
        return Err(ConcordanceError::missing("organisationUUID", id));
    }
    if relations.membership_roles.is_empty() {
        return Err(ConcordanceError::missing("membershipRoles", id));
    }
    if relations.membership_roles.iter().any(|r| r.role_uuid.is_empty()) {
        return Err(ConcordanceError::missing("membershipRoleUUID", id));
    }
    Ok(())
}

/// Membership rule: the aggregate and every source name a person, an
/// organisation and at least one role.
pub fn require_membership_links(aggregate: &AggregateConcept) -> Result<(), ConcordanceError> {
    membership_links(&aggregate.relations, &aggregate.pref_uuid)?;
    for source in &aggregate.source_representations {
        membership_links(&source.relations, &source.uuid)?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MembershipRole, SourceConcept};

    fn brand() -> AggregateConcept {
        AggregateConcept::new("p", "Brand", "Brand")
            .with_source(SourceConcept::new("a", "A", "Brand", "TME", "a-tme"))
    }

    fn linked(mut relations: ConceptRelations) -> ConceptRelations {
        relations.person_uuid = Some("person".to_string());
        relations.organisation_uuid = Some("org".to_string());
        relations.membership_roles = vec![MembershipRole::new("role")];
        relations
    }

    fn membership() -> AggregateConcept {
        let mut source = SourceConcept::new("m", "M", "Membership", "FACTSET", "m-fs");
        source.relations = linked(source.relations);
        let mut aggregate =
            AggregateConcept::new("p", "Membership", "Membership").with_source(source);
        aggregate.relations = linked(aggregate.relations);
        aggregate
    }

    fn message(result: Result<ConceptKind, ConcordanceError>) -> String {
        match result {
            Err(ConcordanceError::InvalidRequest(msg)) => msg,
            other => format!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn valid_aggregate_returns_kind() {
        assert_eq!(
            Validator::validate(&brand()).expect("valid"),
            ConceptKind::Brand
        );
    }

    #[test]
    fn missing_pref_label_names_the_aggregate() {
        let mut aggregate = brand();
        aggregate.pref_label.clear();
        assert_eq!(
            message(Validator::validate(&aggregate)),
            "no prefLabel has been supplied for p"
        );
    }

    #[test]
    fn missing_authority_value_names_the_source() {
        let mut aggregate = brand();
        aggregate.source_representations[0].authority_value.clear();
        let msg = message(Validator::validate(&aggregate));
        assert!(msg.contains("authorityValue"), "{}", msg);
        assert!(msg.ends_with(" a"), "{}", msg);
    }

    #[test]
    fn abstract_kind_is_rejected() {
        let mut aggregate = brand();
        aggregate.kind = "Classification".to_string();
        assert!(message(Validator::validate(&aggregate)).contains("invalid type"));
    }

    #[test]
    fn empty_sources_are_rejected() {
        let aggregate = AggregateConcept::new("p", "Brand", "Brand");
        assert!(message(Validator::validate(&aggregate)).contains("sourceRepresentation"));
    }

    #[test]
    fn duplicate_source_ids_are_rejected() {
        let aggregate =
            brand().with_source(SourceConcept::new("a", "A again", "Brand", "UPP", "a"));
        assert!(message(Validator::validate(&aggregate)).contains("more than once"));
    }

    #[test]
    fn unknown_authority_is_accepted() {
        let aggregate = AggregateConcept::new("p", "Brand", "Brand")
            .with_source(SourceConcept::new("a", "A", "Brand", "Mystery", "x"));
        assert!(Validator::validate(&aggregate).is_ok());
    }

    #[test]
    fn special_report_rejects_concordance() {
        let aggregate = AggregateConcept::new("p", "Report", "SpecialReport")
            .with_source(SourceConcept::new("a", "A", "SpecialReport", "TME", "a"))
            .with_source(SourceConcept::new("b", "B", "SpecialReport", "TME", "b"));
        assert_eq!(
            message(Validator::validate(&aggregate)),
            "SpecialReport p does not support concordance"
        );
    }

    #[test]
    fn membership_with_links_is_valid() {
        assert_eq!(
            Validator::validate(&membership()).expect("valid"),
            ConceptKind::Membership
        );
    }

    #[test]
    fn membership_source_without_role_is_rejected() {
        let mut aggregate = membership();
        aggregate.source_representations[0]
            .relations
            .membership_roles
            .clear();
        assert_eq!(
            message(Validator::validate(&aggregate)),
            "no membershipRoles has been supplied for m"
        );
    }

    #[test]
    fn membership_role_without_id_is_rejected() {
        let mut aggregate = membership();
        aggregate.relations.membership_roles = vec![MembershipRole::default()];
        assert!(message(Validator::validate(&aggregate)).contains("membershipRoleUUID"));
    }
}
