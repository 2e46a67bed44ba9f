//! # Authorities
//!
//! The source systems whose identifiers are indexed.
//!
//! A source record may name any authority; only the ones listed here get an
//! identifier node. Every source additionally gets a synthetic `UPP`
//! identifier carrying its own uuid.

use crate::graph::Identifier;

/// A recognized source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authority {
    Tme,
    Factset,
    Upp,
    Lei,
    Smartlogic,
    ManagedLocation,
    Iso31661,
    Geonames,
    Wikidata,
    DbPedia,
    Naics,
}

impl Authority {
    pub const ALL: [Authority; 11] = [
        Self::Tme,
        Self::Factset,
        Self::Upp,
        Self::Lei,
        Self::Smartlogic,
        Self::ManagedLocation,
        Self::Iso31661,
        Self::Geonames,
        Self::Wikidata,
        Self::DbPedia,
        Self::Naics,
    ];

    /// The internal authority, used for the synthetic uuid identifier.
    pub const SYNTHETIC: Authority = Self::Upp;

    /// Authority name as it appears in payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tme => "TME",
            Self::Factset => "FACTSET",
            Self::Upp => "UPP",
            Self::Lei => "LEI",
            Self::Smartlogic => "Smartlogic",
            Self::ManagedLocation => "ManagedLocation",
            Self::Iso31661 => "ISO-3166-1",
            Self::Geonames => "Geonames",
            Self::Wikidata => "Wikidata",
            Self::DbPedia => "DBPedia",
            Self::Naics => "NAICS",
        }
    }

    /// Label of the identifier node created for this authority.
    #[must_use]
    pub const fn identifier_label(self) -> &'static str {
        match self {
            Self::Tme => "TMEIdentifier",
            Self::Factset => "FactsetIdentifier",
            Self::Upp => "UPPIdentifier",
            Self::Lei => "LegalEntityIdentifier",
            Self::Smartlogic => "SmartlogicIdentifier",
            Self::ManagedLocation => "ManagedLocationIdentifier",
            Self::Iso31661 => "ISO31661Identifier",
            Self::Geonames => "GeonamesIdentifier",
            Self::Wikidata => "WikidataIdentifier",
            Self::DbPedia => "DBPediaIdentifier",
            Self::Naics => "NAICSIdentifier",
        }
    }

    /// Look up an authority by payload name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Identifier node for a value reported by this authority.
    #[must_use]
    pub fn identifier(self, value: &str) -> Identifier {
        Identifier {
            authority: self.name().to_string(),
            label: self.identifier_label().to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(Authority::parse("TME"), Some(Authority::Tme));
        assert_eq!(Authority::parse("Smartlogic"), Some(Authority::Smartlogic));
        assert_eq!(Authority::parse("tme"), None);
    }

    #[test]
    fn names_round_trip() {
        for authority in Authority::ALL {
            assert_eq!(Authority::parse(authority.name()), Some(authority));
        }
    }

    #[test]
    fn identifier_carries_label_and_value() {
        let id = Authority::Lei.identifier("5493001KJTIIGC8Y1R12");
        assert_eq!(id.label, "LegalEntityIdentifier");
        assert_eq!(id.authority, "LEI");
        assert_eq!(id.value, "5493001KJTIIGC8Y1R12");
    }
}
