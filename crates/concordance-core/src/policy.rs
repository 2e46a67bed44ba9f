//! # Kind Policy Registry
//!
//! One declarative descriptor per concept kind. Validation, the mutation
//! planner and reconstruction all consult the registry instead of carrying
//! per-kind code paths:
//!
//! - which scalar fields are persisted for a node of the kind
//! - which relationship kinds a source of the kind may carry
//! - whether the kind supports concordance (more than one source)
//! - extra validation rules

use crate::graph::{PropValue, Properties};
use crate::kind::ConceptKind;
use crate::primitives::{INCEPTION_DATE, TERMINATION_DATE};
use crate::types::{AggregateConcept, ConceptFields, ConceptRelations, MembershipRole};
use crate::validation::require_membership_links;
use crate::ConcordanceError;
use serde::{Deserialize, Serialize};

// =============================================================================
// SCALAR FIELDS
// =============================================================================

/// A persisted scalar or collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarField {
    Aliases,
    DescriptionXml,
    ImageUrl,
    Strapline,
    ScopeNote,
    ShortLabel,
    IsDeprecated,
    EmailAddress,
    FacebookPage,
    TwitterHandle,
    Salutation,
    BirthYear,
    ProperName,
    ShortName,
    HiddenLabel,
    FormerNames,
    TradeNames,
    LeiCode,
    CountryCode,
    CountryOfIncorporation,
    PostalCode,
    YearFounded,
    InceptionDate,
    TerminationDate,
    FigiCode,
}

fn text(value: &Option<String>) -> Option<PropValue> {
    value
        .as_ref()
        .filter(|v| !v.is_empty())
        .map(|v| PropValue::Text(v.clone()))
}

fn list(values: &[String]) -> Option<PropValue> {
    (!values.is_empty()).then(|| PropValue::TextList(values.to_vec()))
}

fn int(value: Option<i32>) -> Option<PropValue> {
    value.map(|v| PropValue::Int(i64::from(v)))
}

fn flag(value: bool) -> Option<PropValue> {
    value.then_some(PropValue::Bool(true))
}

impl ScalarField {
    pub const ALL: [ScalarField; 25] = [
        Self::Aliases,
        Self::DescriptionXml,
        Self::ImageUrl,
        Self::Strapline,
        Self::ScopeNote,
        Self::ShortLabel,
        Self::IsDeprecated,
        Self::EmailAddress,
        Self::FacebookPage,
        Self::TwitterHandle,
        Self::Salutation,
        Self::BirthYear,
        Self::ProperName,
        Self::ShortName,
        Self::HiddenLabel,
        Self::FormerNames,
        Self::TradeNames,
        Self::LeiCode,
        Self::CountryCode,
        Self::CountryOfIncorporation,
        Self::PostalCode,
        Self::YearFounded,
        Self::InceptionDate,
        Self::TerminationDate,
        Self::FigiCode,
    ];

    /// Property key, identical to the JSON field name.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Aliases => "aliases",
            Self::DescriptionXml => "descriptionXML",
            Self::ImageUrl => "imageUrl",
            Self::Strapline => "strapline",
            Self::ScopeNote => "scopeNote",
            Self::ShortLabel => "shortLabel",
            Self::IsDeprecated => "isDeprecated",
            Self::EmailAddress => "emailAddress",
            Self::FacebookPage => "facebookPage",
            Self::TwitterHandle => "twitterHandle",
            Self::Salutation => "salutation",
            Self::BirthYear => "birthYear",
            Self::ProperName => "properName",
            Self::ShortName => "shortName",
            Self::HiddenLabel => "hiddenLabel",
            Self::FormerNames => "formerNames",
            Self::TradeNames => "tradeNames",
            Self::LeiCode => "leiCode",
            Self::CountryCode => "countryCode",
            Self::CountryOfIncorporation => "countryOfIncorporation",
            Self::PostalCode => "postalCode",
            Self::YearFounded => "yearFounded",
            Self::InceptionDate => "inceptionDate",
            Self::TerminationDate => "terminationDate",
            Self::FigiCode => "figiCode",
        }
    }

    /// Look up a field by property key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Read the field as a property value. Empty values yield `None`.
    #[must_use]
    pub fn value(self, fields: &ConceptFields) -> Option<PropValue> {
        match self {
            Self::Aliases => list(&fields.aliases),
            Self::DescriptionXml => text(&fields.description_xml),
            Self::ImageUrl => text(&fields.image_url),
            Self::Strapline => text(&fields.strapline),
            Self::ScopeNote => text(&fields.scope_note),
            Self::ShortLabel => text(&fields.short_label),
            Self::IsDeprecated => flag(fields.is_deprecated),
            Self::EmailAddress => text(&fields.email_address),
            Self::FacebookPage => text(&fields.facebook_page),
            Self::TwitterHandle => text(&fields.twitter_handle),
            Self::Salutation => text(&fields.salutation),
            Self::BirthYear => int(fields.birth_year),
            Self::ProperName => text(&fields.proper_name),
            Self::ShortName => text(&fields.short_name),
            Self::HiddenLabel => text(&fields.hidden_label),
            Self::FormerNames => list(&fields.former_names),
            Self::TradeNames => list(&fields.trade_names),
            Self::LeiCode => text(&fields.lei_code),
            Self::CountryCode => text(&fields.country_code),
            Self::CountryOfIncorporation => text(&fields.country_of_incorporation),
            Self::PostalCode => text(&fields.postal_code),
            Self::YearFounded => int(fields.year_founded),
            Self::InceptionDate => text(&fields.inception_date),
            Self::TerminationDate => text(&fields.termination_date),
            Self::FigiCode => text(&fields.figi_code),
        }
    }

    /// Write a stored property back into the field set.
    ///
    /// A value of the wrong shape leaves the field untouched and returns false.
    pub fn assign(self, fields: &mut ConceptFields, value: &PropValue) -> bool {
        let slot = match self {
            Self::Aliases => Slot::List(&mut fields.aliases),
            Self::DescriptionXml => Slot::Text(&mut fields.description_xml),
            Self::ImageUrl => Slot::Text(&mut fields.image_url),
            Self::Strapline => Slot::Text(&mut fields.strapline),
            Self::ScopeNote => Slot::Text(&mut fields.scope_note),
            Self::ShortLabel => Slot::Text(&mut fields.short_label),
            Self::IsDeprecated => Slot::Flag(&mut fields.is_deprecated),
            Self::EmailAddress => Slot::Text(&mut fields.email_address),
            Self::FacebookPage => Slot::Text(&mut fields.facebook_page),
            Self::TwitterHandle => Slot::Text(&mut fields.twitter_handle),
            Self::Salutation => Slot::Text(&mut fields.salutation),
            Self::BirthYear => Slot::Int(&mut fields.birth_year),
            Self::ProperName => Slot::Text(&mut fields.proper_name),
            Self::ShortName => Slot::Text(&mut fields.short_name),
            Self::HiddenLabel => Slot::Text(&mut fields.hidden_label),
            Self::FormerNames => Slot::List(&mut fields.former_names),
            Self::TradeNames => Slot::List(&mut fields.trade_names),
            Self::LeiCode => Slot::Text(&mut fields.lei_code),
            Self::CountryCode => Slot::Text(&mut fields.country_code),
            Self::CountryOfIncorporation => Slot::Text(&mut fields.country_of_incorporation),
            Self::PostalCode => Slot::Text(&mut fields.postal_code),
            Self::YearFounded => Slot::Int(&mut fields.year_founded),
            Self::InceptionDate => Slot::Text(&mut fields.inception_date),
            Self::TerminationDate => Slot::Text(&mut fields.termination_date),
            Self::FigiCode => Slot::Text(&mut fields.figi_code),
        };
        slot.fill(value)
    }
}

/// Mutable view of one field, typed by shape.
enum Slot<'a> {
    Text(&'a mut Option<String>),
    List(&'a mut Vec<String>),
    Int(&'a mut Option<i32>),
    Flag(&'a mut bool),
}

impl Slot<'_> {
    fn fill(self, value: &PropValue) -> bool {
        match (self, value) {
            (Self::Text(slot), PropValue::Text(v)) => *slot = Some(v.clone()),
            (Self::List(slot), PropValue::TextList(v)) => *slot = v.clone(),
            (Self::Int(slot), PropValue::Int(v)) => match i32::try_from(*v) {
                Ok(v) => *slot = Some(v),
                Err(_) => return false,
            },
            (Self::Flag(slot), PropValue::Bool(v)) => *slot = *v,
            _ => return false,
        }
        true
    }
}

/// Fields persisted for every kind.
pub const COMMON_FIELDS: &[ScalarField] = &[
    ScalarField::Aliases,
    ScalarField::DescriptionXml,
    ScalarField::ImageUrl,
    ScalarField::Strapline,
    ScalarField::ScopeNote,
    ScalarField::ShortLabel,
    ScalarField::IsDeprecated,
];

// =============================================================================
// RELATIONSHIP KINDS
// =============================================================================

/// A relationship edge type from a source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    HasParent,
    HasBroader,
    IsRelatedTo,
    SupersededBy,
    HasOrganisation,
    HasMember,
    HasRole,
    IssuedBy,
    SubOrganisationOf,
}

/// One planned edge: target node id plus edge properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    pub target: String,
    pub props: Properties,
}

impl RelationEdge {
    fn plain(target: &str) -> Self {
        Self {
            target: target.to_string(),
            props: Properties::new(),
        }
    }
}

impl RelationKind {
    pub const ALL: [RelationKind; 9] = [
        Self::HasParent,
        Self::HasBroader,
        Self::IsRelatedTo,
        Self::SupersededBy,
        Self::HasOrganisation,
        Self::HasMember,
        Self::HasRole,
        Self::IssuedBy,
        Self::SubOrganisationOf,
    ];

    /// Stored edge type name.
    #[must_use]
    pub const fn edge_type(self) -> &'static str {
        match self {
            Self::HasParent => "HAS_PARENT",
            Self::HasBroader => "HAS_BROADER",
            Self::IsRelatedTo => "IS_RELATED_TO",
            Self::SupersededBy => "SUPERSEDED_BY",
            Self::HasOrganisation => "HAS_ORGANISATION",
            Self::HasMember => "HAS_MEMBER",
            Self::HasRole => "HAS_ROLE",
            Self::IssuedBy => "ISSUED_BY",
            Self::SubOrganisationOf => "SUB_ORGANISATION_OF",
        }
    }

    /// Edges of this kind described by a relation set. Blank targets are skipped.
    #[must_use]
    pub fn edges(self, relations: &ConceptRelations) -> Vec<RelationEdge> {
        let many = |ids: &[String]| -> Vec<RelationEdge> {
            ids.iter()
                .filter(|id| !id.is_empty())
                .map(|id| RelationEdge::plain(id))
                .collect()
        };
        let one = |id: &Option<String>| -> Vec<RelationEdge> {
            id.iter()
                .filter(|id| !id.is_empty())
                .map(|id| RelationEdge::plain(id))
                .collect()
        };

        match self {
            Self::HasParent => many(&relations.parent_uuids),
            Self::HasBroader => many(&relations.broader_uuids),
            Self::IsRelatedTo => many(&relations.related_uuids),
            Self::SupersededBy => many(&relations.superseded_by_uuids),
            Self::HasOrganisation => one(&relations.organisation_uuid),
            Self::HasMember => one(&relations.person_uuid),
            Self::IssuedBy => one(&relations.issued_by),
            Self::SubOrganisationOf => one(&relations.parent_organisation),
            Self::HasRole => relations
                .membership_roles
                .iter()
                .filter(|role| !role.role_uuid.is_empty())
                .map(|role| {
                    let mut props = Properties::new();
                    if let Some(date) = &role.inception_date {
                        props.insert(INCEPTION_DATE.to_string(), PropValue::Text(date.clone()));
                    }
                    if let Some(date) = &role.termination_date {
                        props.insert(
                            TERMINATION_DATE.to_string(),
                            PropValue::Text(date.clone()),
                        );
                    }
                    RelationEdge {
                        target: role.role_uuid.clone(),
                        props,
                    }
                })
                .collect(),
        }
    }

    /// Fold a stored edge back into a relation set.
    pub fn absorb(self, relations: &mut ConceptRelations, target: &str, props: &Properties) {
        let target = target.to_string();
        match self {
            Self::HasParent => relations.parent_uuids.push(target),
            Self::HasBroader => relations.broader_uuids.push(target),
            Self::IsRelatedTo => relations.related_uuids.push(target),
            Self::SupersededBy => relations.superseded_by_uuids.push(target),
            Self::HasOrganisation => relations.organisation_uuid = Some(target),
            Self::HasMember => relations.person_uuid = Some(target),
            Self::IssuedBy => relations.issued_by = Some(target),
            Self::SubOrganisationOf => relations.parent_organisation = Some(target),
            Self::HasRole => {
                let date = |key: &str| match props.get(key) {
                    Some(PropValue::Text(v)) => Some(v.clone()),
                    _ => None,
                };
                relations.membership_roles.push(MembershipRole {
                    role_uuid: target,
                    inception_date: date(INCEPTION_DATE),
                    termination_date: date(TERMINATION_DATE),
                });
            }
        }
    }
}

// =============================================================================
// KIND POLICY
// =============================================================================

/// Extra validation rule run after the generic checks.
pub type KindRule = fn(&AggregateConcept) -> Result<(), ConcordanceError>;

/// Declarative per-kind descriptor.
#[derive(Debug)]
pub struct KindPolicy {
    /// Fields persisted in addition to [`COMMON_FIELDS`].
    pub fields: &'static [ScalarField],
    /// Relationship kinds a source of this kind may carry.
    pub relations: &'static [RelationKind],
    /// False when an aggregate of this kind must have exactly one source.
    pub concordance_allowed: bool,
    pub rules: &'static [KindRule],
}

impl KindPolicy {
    /// Every persisted field for the kind, common fields first.
    pub fn persisted_fields(&self) -> impl Iterator<Item = ScalarField> + '_ {
        COMMON_FIELDS.iter().chain(self.fields).copied()
    }

    /// Project a field set onto the persisted properties of this kind.
    #[must_use]
    pub fn properties(&self, fields: &ConceptFields) -> Properties {
        self.persisted_fields()
            .filter_map(|f| f.value(fields).map(|v| (f.key().to_string(), v)))
            .collect()
    }

    #[must_use]
    pub fn allows(&self, relation: RelationKind) -> bool {
        self.relations.contains(&relation)
    }
}

const ORGANISATION_FIELDS: &[ScalarField] = &[
    ScalarField::ProperName,
    ScalarField::ShortName,
    ScalarField::HiddenLabel,
    ScalarField::FormerNames,
    ScalarField::TradeNames,
    ScalarField::LeiCode,
    ScalarField::CountryCode,
    ScalarField::CountryOfIncorporation,
    ScalarField::PostalCode,
    ScalarField::YearFounded,
    ScalarField::EmailAddress,
    ScalarField::FacebookPage,
    ScalarField::TwitterHandle,
];

static ABSTRACT: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[],
    concordance_allowed: true,
    rules: &[],
};

static CLASSIFICATION: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[RelationKind::HasBroader, RelationKind::SupersededBy],
    concordance_allowed: true,
    rules: &[],
};

static SPECIAL_REPORT: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[RelationKind::SupersededBy],
    concordance_allowed: false,
    rules: &[],
};

static BRAND: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[RelationKind::HasParent, RelationKind::SupersededBy],
    concordance_allowed: true,
    rules: &[],
};

static TOPIC: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[
        RelationKind::IsRelatedTo,
        RelationKind::HasBroader,
        RelationKind::SupersededBy,
    ],
    concordance_allowed: true,
    rules: &[],
};

static LOCATION: KindPolicy = KindPolicy {
    fields: &[ScalarField::CountryCode],
    relations: &[
        RelationKind::HasBroader,
        RelationKind::IsRelatedTo,
        RelationKind::SupersededBy,
    ],
    concordance_allowed: true,
    rules: &[],
};

static PERSON: KindPolicy = KindPolicy {
    fields: &[
        ScalarField::EmailAddress,
        ScalarField::FacebookPage,
        ScalarField::TwitterHandle,
        ScalarField::Salutation,
        ScalarField::BirthYear,
    ],
    relations: &[RelationKind::SupersededBy],
    concordance_allowed: true,
    rules: &[],
};

static ORGANISATION: KindPolicy = KindPolicy {
    fields: ORGANISATION_FIELDS,
    relations: &[RelationKind::SubOrganisationOf, RelationKind::SupersededBy],
    concordance_allowed: true,
    rules: &[],
};

static MEMBERSHIP: KindPolicy = KindPolicy {
    fields: &[ScalarField::InceptionDate, ScalarField::TerminationDate],
    relations: &[
        RelationKind::HasOrganisation,
        RelationKind::HasMember,
        RelationKind::HasRole,
    ],
    concordance_allowed: true,
    rules: &[require_membership_links as KindRule],
};

static MEMBERSHIP_ROLE: KindPolicy = KindPolicy {
    fields: &[],
    relations: &[RelationKind::SupersededBy],
    concordance_allowed: true,
    rules: &[],
};

static FINANCIAL_INSTRUMENT: KindPolicy = KindPolicy {
    fields: &[ScalarField::FigiCode],
    relations: &[RelationKind::IssuedBy],
    concordance_allowed: true,
    rules: &[],
};

/// The registry lookup.
#[must_use]
pub fn policy(kind: ConceptKind) -> &'static KindPolicy {
    match kind {
        ConceptKind::Thing | ConceptKind::Concept | ConceptKind::Classification => &ABSTRACT,
        ConceptKind::Section
        | ConceptKind::Subject
        | ConceptKind::Genre
        | ConceptKind::AlphavilleSeries => &CLASSIFICATION,
        ConceptKind::SpecialReport => &SPECIAL_REPORT,
        ConceptKind::Brand => &BRAND,
        ConceptKind::Topic => &TOPIC,
        ConceptKind::Location => &LOCATION,
        ConceptKind::Person => &PERSON,
        ConceptKind::Organisation
        | ConceptKind::Company
        | ConceptKind::PublicCompany
        | ConceptKind::PrivateCompany => &ORGANISATION,
        ConceptKind::Membership => &MEMBERSHIP,
        ConceptKind::MembershipRole | ConceptKind::BoardRole => &MEMBERSHIP_ROLE,
        ConceptKind::FinancialInstrument => &FINANCIAL_INSTRUMENT,
    }
}

// =============================================================================
// TESTS
// =============================================================================
