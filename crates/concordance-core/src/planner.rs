//! # Graph Mutation Planner
//!
//! Turns a validated aggregate and its resolution into one ordered batch of
//! [`GraphOp`]s:
//!
//! 1. re-anchor every unconcorded source as its own singleton canonical
//! 2. clear every claimed source and the target canonical to a bare stub
//! 3. delete canonicals emptied by the write
//! 4. rebuild the target canonical
//! 5. rebuild each source with its equivalence, identifiers and relationships
//!
//! Clear-then-rebuild runs on every write, so a change of kind, fields or
//! relationships never leaves stale labels or edges behind.

use crate::authority::Authority;
use crate::graph::{PropValue, Properties};
use crate::kind::ConceptKind;
use crate::ops::GraphOp;
use crate::policy::policy;
use crate::primitives::{AGGREGATE_HASH, AUTHORITY, AUTHORITY_VALUE, LAST_MODIFIED_EPOCH, PREF_LABEL};
use crate::resolution::Resolution;
use crate::types::{AggregateConcept, SourceConcept};
use crate::ConcordanceError;

/// Builds the operation batch for a write.
pub struct MutationPlanner;

impl MutationPlanner {
    /// Plan a write. Nothing is executed.
    pub fn plan(
        aggregate: &AggregateConcept,
        kind: ConceptKind,
        resolution: &Resolution,
        aggregate_hash: &str,
        last_modified_epoch: i64,
    ) -> Result<Vec<GraphOp>, ConcordanceError> {
        let pref = &aggregate.pref_uuid;
        let mut ops = Vec::new();

        for source in &resolution.unconcorded {
            Self::reanchor(&mut ops, source)?;
        }

        for source in &aggregate.source_representations {
            ops.push(GraphOp::ClearSource {
                uuid: source.uuid.clone(),
            });
        }
        ops.push(GraphOp::ClearCanonical {
            pref_uuid: pref.clone(),
        });

        for canonical in &resolution.canonicals_to_delete {
            ops.push(GraphOp::DeleteCanonical {
                pref_uuid: canonical.clone(),
            });
        }

        let mut props = policy(kind).properties(&aggregate.fields);
        props.insert(
            PREF_LABEL.to_string(),
            PropValue::Text(aggregate.pref_label.clone()),
        );
        props.insert(
            AGGREGATE_HASH.to_string(),
            PropValue::Text(aggregate_hash.to_string()),
        );
        ops.push(GraphOp::SetCanonical {
            pref_uuid: pref.clone(),
            labels: kind.label_chain(),
            props,
        });

        for source in &aggregate.source_representations {
            Self::rebuild_source(&mut ops, source, pref, last_modified_epoch)?;
        }

        Ok(ops)
    }

    /// A dropped source becomes the lone member of a canonical with its own id.
    fn reanchor(ops: &mut Vec<GraphOp>, source: &SourceConcept) -> Result<(), ConcordanceError> {
        let kind: ConceptKind = source.kind.parse()?;
        let mut props = policy(kind).properties(&source.fields);
        props.insert(
            PREF_LABEL.to_string(),
            PropValue::Text(source.pref_label.clone()),
        );

        ops.push(GraphOp::SetCanonical {
            pref_uuid: source.uuid.clone(),
            labels: kind.label_chain(),
            props,
        });
        ops.push(GraphOp::LinkEquivalence {
            uuid: source.uuid.clone(),
            pref_uuid: source.uuid.clone(),
        });
        Ok(())
    }

    fn rebuild_source(
        ops: &mut Vec<GraphOp>,
        source: &SourceConcept,
        pref: &str,
        last_modified_epoch: i64,
    ) -> Result<(), ConcordanceError> {
        let kind: ConceptKind = source.kind.parse()?;
        let kind_policy = policy(kind);
        let uuid = &source.uuid;

        let mut props: Properties = kind_policy.properties(&source.fields);
        props.insert(
            PREF_LABEL.to_string(),
            PropValue::Text(source.pref_label.clone()),
        );
        props.insert(
            AUTHORITY.to_string(),
            PropValue::Text(source.authority.clone()),
        );
        props.insert(
            AUTHORITY_VALUE.to_string(),
            PropValue::Text(source.authority_value.clone()),
        );
        props.insert(
            LAST_MODIFIED_EPOCH.to_string(),
            PropValue::Int(last_modified_epoch),
        );

        ops.push(GraphOp::SetSource {
            uuid: uuid.clone(),
            labels: kind.label_chain(),
            props,
        });
        ops.push(GraphOp::LinkEquivalence {
            uuid: uuid.clone(),
            pref_uuid: pref.to_string(),
        });

        if let Some(authority) = Authority::parse(&source.authority) {
            ops.push(GraphOp::AttachIdentifier {
                uuid: uuid.clone(),
                identifier: authority.identifier(&source.authority_value),
            });
        }
        ops.push(GraphOp::AttachIdentifier {
            uuid: uuid.clone(),
            identifier: Authority::SYNTHETIC.identifier(uuid),
        });

        for relation in kind_policy.relations {
            for edge in relation.edges(&source.relations) {
                ops.push(GraphOp::Relate {
                    uuid: uuid.clone(),
                    relation: *relation,
                    target: edge.target,
                    props: edge.props,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RelationKind;
    use std::collections::BTreeSet;

    fn names(ops: &[GraphOp]) -> Vec<&'static str> {
        ops.iter().map(GraphOp::name).collect()
    }

    #[test]
    fn single_source_plan_is_ordered() {
        let aggregate = AggregateConcept::new("p", "Acme", "Brand")
            .with_source(SourceConcept::new("p", "Acme", "Brand", "TME", "acme-tme"));

        let ops = MutationPlanner::plan(
            &aggregate,
            ConceptKind::Brand,
            &Resolution::default(),
            "hash",
            10,
        )
        .expect("plan");

        assert_eq!(
            names(&ops),
            vec![
                "clear_source",
                "clear_canonical",
                "set_canonical",
                "set_source",
                "link_equivalence",
                "attach_identifier",
                "attach_identifier",
            ]
        );
    }

    #[test]
    fn canonical_carries_hash_and_label_chain() {
        let aggregate = AggregateConcept::new("p", "Acme", "PublicCompany").with_source(
            SourceConcept::new("a", "Acme", "PublicCompany", "FACTSET", "F1"),
        );

        let ops = MutationPlanner::plan(
            &aggregate,
            ConceptKind::PublicCompany,
            &Resolution::default(),
            "h1",
            10,
        )
        .expect("plan");

        let canonical = ops
            .iter()
            .find_map(|op| match op {
                GraphOp::SetCanonical { labels, props, .. } => Some((labels, props)),
                _ => None,
            })
            .expect("canonical op");
        assert_eq!(canonical.0[0], "PublicCompany");
        assert_eq!(canonical.0.last().map(String::as_str), Some("Thing"));
        assert_eq!(
            canonical.1.get(AGGREGATE_HASH),
            Some(&PropValue::Text("h1".to_string()))
        );
    }

    #[test]
    fn unknown_authority_only_gets_synthetic_identifier() {
        let aggregate = AggregateConcept::new("p", "X", "Topic")
            .with_source(SourceConcept::new("a", "X", "Topic", "Mystery", "m"));

        let ops = MutationPlanner::plan(
            &aggregate,
            ConceptKind::Topic,
            &Resolution::default(),
            "h",
            1,
        )
        .expect("plan");

        let identifiers: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                GraphOp::AttachIdentifier { identifier, .. } => Some(identifier.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(identifiers, vec![Authority::Upp.identifier("a")]);
    }

    #[test]
    fn relationships_follow_source_kind_policy() {
        let mut source = SourceConcept::new("a", "X", "Brand", "TME", "x");
        source.relations.parent_uuids = vec!["parent".to_string()];
        source.relations.related_uuids = vec!["ignored".to_string()];
        let aggregate = AggregateConcept::new("p", "X", "Brand").with_source(source);

        let ops = MutationPlanner::plan(
            &aggregate,
            ConceptKind::Brand,
            &Resolution::default(),
            "h",
            1,
        )
        .expect("plan");

        let relations: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                GraphOp::Relate {
                    relation, target, ..
                } => Some((*relation, target.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(relations, vec![(RelationKind::HasParent, "parent")]);
    }

    #[test]
    fn unconcord_and_delete_come_before_rebuild() {
        let aggregate = AggregateConcept::new("p", "X", "Topic")
            .with_source(SourceConcept::new("p", "X", "Topic", "TME", "x"));
        let resolution = Resolution {
            unconcorded: vec![SourceConcept::new("u", "U", "Topic", "TME", "u")],
            canonicals_to_delete: BTreeSet::from(["old".to_string()]),
            ..Resolution::default()
        };

        let ops = MutationPlanner::plan(&aggregate, ConceptKind::Topic, &resolution, "h", 1)
            .expect("plan");

        assert_eq!(
            &names(&ops)[..5],
            &[
                "set_canonical",
                "link_equivalence",
                "clear_source",
                "clear_canonical",
                "delete_canonical",
            ]
        );
        assert_eq!(
            ops[0],
            GraphOp::SetCanonical {
                pref_uuid: "u".to_string(),
                labels: ConceptKind::Topic.label_chain(),
                props: Properties::from([(
                    PREF_LABEL.to_string(),
                    PropValue::Text("U".to_string())
                )]),
            }
        );
    }
}
