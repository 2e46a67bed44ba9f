use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// SCALAR FIELDS
// =============================================================================

/// Scalar and collection fields shared by aggregates and source records.
///
/// Every field is optional on the wire. Which of them is persisted for a
/// node is decided by its kind's [`crate::policy::KindPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptFields {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(
        rename = "descriptionXML",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description_xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strapline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_label: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deprecated: bool,

    // People and organisations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,

    // Organisations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proper_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub former_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trade_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lei_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_of_incorporation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_founded: Option<i32>,

    // Memberships
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,

    // Financial instruments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figi_code: Option<String>,
}

// =============================================================================
// RELATIONSHIP FIELDS
// =============================================================================

/// A role held within a membership, with the dates carried on the edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRole {
    #[serde(rename = "membershipRoleUUID", default)]
    pub role_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,
}

impl MembershipRole {
    /// Create a role reference without dates.
    #[must_use]
    pub fn new(role_uuid: impl Into<String>) -> Self {
        Self {
            role_uuid: role_uuid.into(),
            ..Self::default()
        }
    }
}

/// References from a concept to other concepts.
///
/// Edges are only ever created from source nodes. On read, an aggregate's
/// relations are derived from its sources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConceptRelations {
    #[serde(rename = "parentUUIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub parent_uuids: Vec<String>,
    #[serde(rename = "broaderUUIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub broader_uuids: Vec<String>,
    #[serde(rename = "relatedUUIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub related_uuids: Vec<String>,
    #[serde(
        rename = "supersededByUUIDs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub superseded_by_uuids: Vec<String>,
    #[serde(
        rename = "organisationUUID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub organisation_uuid: Option<String>,
    #[serde(rename = "personUUID", default, skip_serializing_if = "Option::is_none")]
    pub person_uuid: Option<String>,
    #[serde(
        rename = "membershipRoles",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub membership_roles: Vec<MembershipRole>,
    #[serde(rename = "issuedBy", default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(
        rename = "parentOrganisation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_organisation: Option<String>,
}

// =============================================================================
// SOURCE RECORD
// =============================================================================

/// One authority's report of a concept, keyed by its own uuid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConcept {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub pref_label: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub authority_value: String,
    /// Informational stamp set by the store on write; stripped from reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_epoch: Option<i64>,
    #[serde(flatten)]
    pub fields: ConceptFields,
    #[serde(flatten)]
    pub relations: ConceptRelations,
}

impl SourceConcept {
    /// Create a source record with its mandatory fields.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        pref_label: impl Into<String>,
        kind: impl Into<String>,
        authority: impl Into<String>,
        authority_value: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            pref_label: pref_label.into(),
            kind: kind.into(),
            authority: authority.into(),
            authority_value: authority_value.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// AGGREGATE
// =============================================================================

/// The canonical, merged view of a concordance group.
///
/// The aggregate is input: its presentation fields are supplied by the caller
/// for each write, never computed from its sources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConcept {
    #[serde(rename = "prefUUID", default)]
    pub pref_uuid: String,
    #[serde(default)]
    pub pref_label: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Fingerprint of the write that produced the stored state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_hash: Option<String>,
    #[serde(flatten)]
    pub fields: ConceptFields,
    #[serde(flatten)]
    pub relations: ConceptRelations,
    #[serde(default)]
    pub source_representations: Vec<SourceConcept>,
}

impl AggregateConcept {
    /// Create an aggregate without sources.
    #[must_use]
    pub fn new(
        pref_uuid: impl Into<String>,
        pref_label: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            pref_uuid: pref_uuid.into(),
            pref_label: pref_label.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Append a source record.
    #[must_use]
    pub fn with_source(mut self, source: SourceConcept) -> Self {
        self.source_representations.push(source);
        self
    }

    /// Source ids in payload order.
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.source_representations.iter().map(|s| s.uuid.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_sources_in_order() {
        let aggregate = AggregateConcept::new("p", "Label", "Brand")
            .with_source(SourceConcept::new("b", "B", "Brand", "TME", "b-tme"))
            .with_source(SourceConcept::new("a", "A", "Brand", "UPP", "a"));

        let ids: Vec<&str> = aggregate.source_ids().collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn membership_role_defaults_to_no_dates() {
        let role = MembershipRole::new("role-1");
        assert_eq!(role.role_uuid, "role-1");
        assert!(role.inception_date.is_none());
        assert!(role.termination_date.is_none());
    }
}
