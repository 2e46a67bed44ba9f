//! # Concordance Scenarios
//!
//! End-to-end write/read behaviour of the engine. Every scenario runs
//! against both the in-memory graph and the redb graph.

#![allow(clippy::panic)]

use concordance_core::{
    AggregateConcept, ChangeRecord, ConceptService, ConcordanceError, EventDetails, Graph,
    GraphStore, MembershipRole, RedbGraph, SourceConcept,
};
use tempfile::tempdir;

// =============================================================================
// HELPERS
// =============================================================================

fn source(uuid: &str, kind: &str) -> SourceConcept {
    SourceConcept::new(uuid, format!("{} label", uuid), kind, "TME", format!("tme-{}", uuid))
}

fn aggregate(pref: &str, kind: &str, sources: &[&str]) -> AggregateConcept {
    sources.iter().fold(
        AggregateConcept::new(pref, format!("{} label", pref), kind),
        |agg, id| agg.with_source(source(id, kind)),
    )
}

fn member_ids<S: GraphStore>(service: &ConceptService<S>, pref: &str) -> Vec<String> {
    service
        .read(pref, "tid_check")
        .expect("read")
        .map(|agg| {
            agg.source_representations
                .into_iter()
                .map(|s| s.uuid)
                .collect()
        })
        .unwrap_or_default()
}

fn added(record: &ChangeRecord) -> Vec<(String, String)> {
    record
        .events
        .iter()
        .filter_map(|e| match &e.event_details {
            EventDetails::ConcordanceAdded { old_id, new_id } => {
                Some((old_id.clone(), new_id.clone()))
            }
            _ => None,
        })
        .collect()
}

fn removed(record: &ChangeRecord) -> Vec<(String, String)> {
    record
        .events
        .iter()
        .filter_map(|e| match &e.event_details {
            EventDetails::ConcordanceRemoved { old_id, new_id } => {
                Some((old_id.clone(), new_id.clone()))
            }
            _ => None,
        })
        .collect()
}

fn pair(old: &str, new: &str) -> (String, String) {
    (old.to_string(), new.to_string())
}

// =============================================================================
// SCENARIOS
// =============================================================================

fn idempotent_replay<S: GraphStore>(service: &ConceptService<S>) {
    let payload = aggregate("p", "Organisation", &["p", "f1", "l1"]);

    service.write(&payload, "tid_1").expect("first write");
    let first = service.read("p", "tid_2").expect("read").expect("found");

    let record = service.write(&payload, "tid_3").expect("second write");
    let second = service.read("p", "tid_4").expect("read").expect("found");

    assert_eq!(record.events.len(), 1);
    assert_eq!(record.updates_for("p"), 1);
    assert_eq!(record.concordance_changes().count(), 0);
    assert_eq!(first, second);
}

fn first_write_announces_new_members<S: GraphStore>(service: &ConceptService<S>) {
    let record = service
        .write(&aggregate("p", "Brand", &["p", "b"]), "tid_1")
        .expect("write");

    assert_eq!(added(&record), vec![pair("b", "p")]);
    assert_eq!(record.updates_for("b"), 1);
    assert_eq!(record.updates_for("p"), 1);
    assert_eq!(record.updated_ids, vec!["p", "b"]);
    assert!(record.events.iter().all(|e| e.transaction_id == "tid_1"));
    assert!(matches!(
        record.events.last().map(|e| &e.event_details),
        Some(EventDetails::ConceptUpdated)
    ));
}

fn conflict_rejection<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("a1", "Person", &["a1", "a2"]), "tid_1")
        .expect("group A");

    let result = service.write(&aggregate("b", "Person", &["b", "a1"]), "tid_2");

    match result {
        Err(ConcordanceError::ConcordanceConflict {
            source_id,
            canonical_id,
        }) => {
            assert_eq!(source_id, "a1");
            assert_eq!(canonical_id, "a1");
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(member_ids(service, "a1"), vec!["a1", "a2"]);
    assert!(service.read("b", "tid_3").expect("read").is_none());
}

fn transfer_absorbs_singleton<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("x", "Topic", &["x"]), "tid_1")
        .expect("singleton");

    let record = service
        .write(&aggregate("p", "Topic", &["p", "x"]), "tid_2")
        .expect("transfer");

    assert_eq!(added(&record), vec![pair("x", "p")]);
    assert!(service.read("x", "tid_3").expect("read").is_none());
    assert_eq!(member_ids(service, "p"), vec!["p", "x"]);
    assert_eq!(service.count().expect("count"), 1);
}

fn unconcord_reanchors_source<S: GraphStore>(service: &ConceptService<S>) {
    let mut p2 = source("p2", "Brand");
    p2.fields.aliases = vec!["Second".to_string()];
    p2.relations.parent_uuids = vec!["parent".to_string()];
    let group = aggregate("p", "Brand", &["p1"]).with_source(p2.clone());
    service.write(&group, "tid_1").expect("group");

    let record = service
        .write(&aggregate("p", "Brand", &["p1"]), "tid_2")
        .expect("unconcord");

    assert_eq!(removed(&record), vec![pair("p", "p2")]);
    assert_eq!(record.updated_ids, vec!["p1", "p2"]);
    assert_eq!(member_ids(service, "p"), vec!["p1"]);

    let lone = service.read("p2", "tid_3").expect("read").expect("found");
    let expected = AggregateConcept {
        pref_uuid: "p2".to_string(),
        pref_label: p2.pref_label.clone(),
        kind: "Brand".to_string(),
        aggregate_hash: None,
        fields: p2.fields.clone(),
        relations: p2.relations.clone(),
        source_representations: vec![p2],
    };
    assert_eq!(lone, expected);
}

fn dropping_own_anchor_is_rejected<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("p", "Topic", &["p", "q"]), "tid_1")
        .expect("group");

    let result = service.write(&aggregate("p", "Topic", &["q"]), "tid_2");

    assert!(matches!(
        result,
        Err(ConcordanceError::ConcordanceConflict { .. })
    ));
    assert_eq!(member_ids(service, "p"), vec!["p", "q"]);
}

fn stale_member_moves<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("t", "Location", &["t", "s"]), "tid_1")
        .expect("group T");

    let record = service
        .write(&aggregate("p", "Location", &["p", "s"]), "tid_2")
        .expect("move");

    assert_eq!(removed(&record), vec![pair("t", "s")]);
    assert_eq!(added(&record), vec![pair("s", "p")]);
    assert_eq!(member_ids(service, "t"), vec!["t"]);
    assert_eq!(member_ids(service, "p"), vec!["p", "s"]);
}

fn emptied_foreign_group_is_deleted<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("t", "Genre", &["s1", "s2"]), "tid_1")
        .expect("group T");

    service
        .write(&aggregate("p", "Genre", &["s1", "s2"]), "tid_2")
        .expect("claim all");

    assert!(service.read("t", "tid_3").expect("read").is_none());
    assert_eq!(member_ids(service, "p"), vec!["s1", "s2"]);
    assert_eq!(service.count().expect("count"), 1);
}

fn singleton_non_anchor_is_integrity_violation<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("g", "Subject", &["a", "b"]), "tid_1")
        .expect("group G");
    service
        .write(&aggregate("p", "Subject", &["a"]), "tid_2")
        .expect("move a");

    let result = service.write(&aggregate("q", "Subject", &["b"]), "tid_3");

    match result {
        Err(ConcordanceError::DataIntegrityViolation {
            source_id,
            canonical_id,
        }) => {
            assert_eq!(source_id, "b");
            assert_eq!(canonical_id, "g");
        }
        other => panic!("expected integrity violation, got {:?}", other),
    }
    assert!(service.read("q", "tid_4").expect("read").is_none());
}

fn relation_target_stub_integrates_silently<S: GraphStore>(service: &ConceptService<S>) {
    let mut child = source("c", "Brand");
    child.relations.parent_uuids = vec!["z".to_string()];
    let payload = AggregateConcept::new("c", "Child", "Brand").with_source(child);
    service.write(&payload, "tid_1").expect("child");

    let record = service
        .write(&aggregate("zp", "Brand", &["z"]), "tid_2")
        .expect("parent");

    assert_eq!(record.events.len(), 1);
    assert_eq!(record.updates_for("zp"), 1);
}

fn kind_change_replaces_labels<S: GraphStore>(service: &ConceptService<S>) {
    service
        .write(&aggregate("p", "Brand", &["p"]), "tid_1")
        .expect("brand");
    service
        .write(&aggregate("p", "Topic", &["p"]), "tid_2")
        .expect("topic");

    let stored = service.read("p", "tid_3").expect("read").expect("found");
    assert_eq!(stored.kind, "Topic");
    assert_eq!(stored.source_representations[0].kind, "Topic");
}

fn validation_boundary<S: GraphStore>(service: &ConceptService<S>) {
    let mut no_label = aggregate("p", "Brand", &["p"]);
    no_label.pref_label.clear();
    match service.write(&no_label, "tid_1") {
        Err(ConcordanceError::InvalidRequest(msg)) => assert!(msg.ends_with(" p"), "{}", msg),
        other => panic!("expected invalid request, got {:?}", other),
    }

    let mut no_value = aggregate("p", "Brand", &["p", "s"]);
    no_value.source_representations[1].authority_value.clear();
    match service.write(&no_value, "tid_2") {
        Err(ConcordanceError::InvalidRequest(msg)) => {
            assert!(msg.contains("authorityValue"), "{}", msg);
            assert!(msg.ends_with(" s"), "{}", msg);
        }
        other => panic!("expected invalid request, got {:?}", other),
    }

    assert_eq!(service.count().expect("count"), 0);
}

fn kind_policy_rejections<S: GraphStore>(service: &ConceptService<S>) {
    let report = aggregate("r", "SpecialReport", &["r1", "r2"]);
    match service.write(&report, "tid_1") {
        Err(ConcordanceError::InvalidRequest(msg)) => {
            assert!(msg.contains("does not support concordance"), "{}", msg)
        }
        other => panic!("expected invalid request, got {:?}", other),
    }

    let mut membership = aggregate("m", "Membership", &["m1", "m2"]);
    for relations in std::iter::once(&mut membership.relations).chain(
        membership
            .source_representations
            .iter_mut()
            .map(|s| &mut s.relations),
    ) {
        relations.person_uuid = Some("person".to_string());
        relations.organisation_uuid = Some("org".to_string());
        relations.membership_roles = vec![MembershipRole::new("role")];
    }
    membership.source_representations[1]
        .relations
        .membership_roles
        .clear();
    match service.write(&membership, "tid_2") {
        Err(ConcordanceError::InvalidRequest(msg)) => assert!(msg.contains("m2"), "{}", msg),
        other => panic!("expected invalid request, got {:?}", other),
    }

    assert_eq!(service.count().expect("count"), 0);
}

fn membership_round_trips_roles<S: GraphStore>(service: &ConceptService<S>) {
    let role = MembershipRole {
        role_uuid: "board".to_string(),
        inception_date: Some("2019-04-01".to_string()),
        termination_date: None,
    };
    let mut membership = aggregate("m", "Membership", &["m"]);
    membership.fields.inception_date = Some("2019-04-01".to_string());
    membership.source_representations[0].fields.inception_date =
        Some("2019-04-01".to_string());
    for relations in [
        &mut membership.relations,
        &mut membership.source_representations[0].relations,
    ] {
        relations.person_uuid = Some("person".to_string());
        relations.organisation_uuid = Some("org".to_string());
        relations.membership_roles = vec![role.clone()];
    }

    let record = service.write(&membership, "tid_1").expect("write");
    let stored = service.read("m", "tid_2").expect("read").expect("found");

    let mut expected = membership;
    expected.aggregate_hash = Some(record.events[0].aggregate_hash.clone());
    assert_eq!(stored, expected);
}

// =============================================================================
// RUNNERS
// =============================================================================

macro_rules! on_both_stores {
    ($($name:ident),* $(,)?) => {
        mod in_memory {
            use super::*;
            $(
                #[test]
                fn $name() {
                    super::$name(&ConceptService::new(Graph::new()));
                }
            )*
        }

        mod redb {
            use super::*;
            $(
                #[test]
                fn $name() {
                    let temp = tempdir().expect("temp dir");
                    let store = RedbGraph::open(temp.path().join("concepts.redb")).expect("open db");
                    super::$name(&ConceptService::new(store));
                }
            )*
        }
    };
}

on_both_stores!(
    idempotent_replay,
    first_write_announces_new_members,
    conflict_rejection,
    transfer_absorbs_singleton,
    unconcord_reanchors_source,
    dropping_own_anchor_is_rejected,
    stale_member_moves,
    emptied_foreign_group_is_deleted,
    singleton_non_anchor_is_integrity_violation,
    relation_target_stub_integrates_silently,
    kind_change_replaces_labels,
    validation_boundary,
    kind_policy_rejections,
    membership_round_trips_roles,
);
