//! # Concept Kinds
//!
//! The closed set of concept kinds and their "is-a" hierarchy.
//!
//! Nodes are stored with their full label chain (the kind plus every
//! ancestor, most specific first). On read the chain is resolved back to the
//! single most specific kind.
//!
//! ```text
//! Thing
//! └── Concept
//!     ├── Classification
//!     │   ├── Section, Subject, SpecialReport
//!     │   ├── Genre, Brand, AlphavilleSeries
//!     ├── Topic, Location, Person
//!     ├── Organisation
//!     │   └── Company
//!     │       ├── PublicCompany
//!     │       └── PrivateCompany
//!     ├── Membership
//!     ├── MembershipRole
//!     │   └── BoardRole
//!     └── FinancialInstrument
//! ```

use crate::ConcordanceError;
use std::fmt;
use std::str::FromStr;

/// A concept kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConceptKind {
    Thing,
    Concept,
    Classification,
    Section,
    Subject,
    SpecialReport,
    Genre,
    Brand,
    AlphavilleSeries,
    Topic,
    Location,
    Person,
    Organisation,
    Company,
    PublicCompany,
    PrivateCompany,
    Membership,
    MembershipRole,
    BoardRole,
    FinancialInstrument,
}

impl ConceptKind {
    /// Every kind, roots first.
    pub const ALL: [ConceptKind; 20] = [
        Self::Thing,
        Self::Concept,
        Self::Classification,
        Self::Section,
        Self::Subject,
        Self::SpecialReport,
        Self::Genre,
        Self::Brand,
        Self::AlphavilleSeries,
        Self::Topic,
        Self::Location,
        Self::Person,
        Self::Organisation,
        Self::Company,
        Self::PublicCompany,
        Self::PrivateCompany,
        Self::Membership,
        Self::MembershipRole,
        Self::BoardRole,
        Self::FinancialInstrument,
    ];

    /// The stored label for this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Thing => "Thing",
            Self::Concept => "Concept",
            Self::Classification => "Classification",
            Self::Section => "Section",
            Self::Subject => "Subject",
            Self::SpecialReport => "SpecialReport",
            Self::Genre => "Genre",
            Self::Brand => "Brand",
            Self::AlphavilleSeries => "AlphavilleSeries",
            Self::Topic => "Topic",
            Self::Location => "Location",
            Self::Person => "Person",
            Self::Organisation => "Organisation",
            Self::Company => "Company",
            Self::PublicCompany => "PublicCompany",
            Self::PrivateCompany => "PrivateCompany",
            Self::Membership => "Membership",
            Self::MembershipRole => "MembershipRole",
            Self::BoardRole => "BoardRole",
            Self::FinancialInstrument => "FinancialInstrument",
        }
    }

    /// The direct parent kind, `None` for the root.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Thing => None,
            Self::Concept => Some(Self::Thing),
            Self::Classification
            | Self::Topic
            | Self::Location
            | Self::Person
            | Self::Organisation
            | Self::Membership
            | Self::MembershipRole
            | Self::FinancialInstrument => Some(Self::Concept),
            Self::Section
            | Self::Subject
            | Self::SpecialReport
            | Self::Genre
            | Self::Brand
            | Self::AlphavilleSeries => Some(Self::Classification),
            Self::Company => Some(Self::Organisation),
            Self::PublicCompany | Self::PrivateCompany => Some(Self::Company),
            Self::BoardRole => Some(Self::MembershipRole),
        }
    }

    /// Abstract kinds exist only as ancestors and cannot be written.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Thing | Self::Concept | Self::Classification)
    }

    /// Number of ancestors between this kind and the root.
    #[must_use]
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// The kind followed by all its ancestors, most specific first.
    #[must_use]
    pub fn chain(self) -> Vec<Self> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Stored labels for the kind chain.
    #[must_use]
    pub fn label_chain(self) -> Vec<String> {
        self.chain().into_iter().map(|k| k.label().to_string()).collect()
    }

    /// True if `self` equals `ancestor` or descends from it.
    #[must_use]
    pub fn is_a(self, ancestor: Self) -> bool {
        self.chain().contains(&ancestor)
    }

    /// Parse a payload kind, rejecting unknown and abstract kinds.
    pub fn writable(kind: &str) -> Option<Self> {
        kind.parse::<Self>().ok().filter(|k| !k.is_abstract())
    }

    /// Resolve the most specific kind from a stored label set.
    ///
    /// Unknown labels are ignored. The result is the deepest recognized
    /// label, provided every other recognized label is one of its ancestors.
    pub fn most_specific<S: AsRef<str>>(id: &str, labels: &[S]) -> Result<Self, ConcordanceError> {
        let known: Vec<Self> = labels
            .iter()
            .filter_map(|l| l.as_ref().parse::<Self>().ok())
            .collect();

        let unrecognized = || ConcordanceError::UnrecognizedType {
            id: id.to_string(),
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
        };

        let deepest = known
            .iter()
            .copied()
            .max_by_key(|k| k.depth())
            .ok_or_else(unrecognized)?;

        if known.iter().all(|k| deepest.is_a(*k)) {
            Ok(deepest)
        } else {
            Err(unrecognized())
        }
    }
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConceptKind {
    type Err = ConcordanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.label() == s)
            .ok_or_else(|| ConcordanceError::InvalidRequest(format!("unknown type {}", s)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_chain_is_most_specific_first() {
        assert_eq!(
            ConceptKind::PublicCompany.label_chain(),
            vec!["PublicCompany", "Company", "Organisation", "Concept", "Thing"]
        );
        assert_eq!(ConceptKind::Thing.label_chain(), vec!["Thing"]);
    }

    #[test]
    fn every_kind_reaches_the_root() {
        for kind in ConceptKind::ALL {
            assert_eq!(kind.chain().last(), Some(&ConceptKind::Thing));
        }
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for kind in ConceptKind::ALL {
            assert_eq!(kind.label().parse::<ConceptKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn abstract_kinds_are_not_writable() {
        assert_eq!(ConceptKind::writable("Thing"), None);
        assert_eq!(ConceptKind::writable("Classification"), None);
        assert_eq!(ConceptKind::writable("Nonsense"), None);
        assert_eq!(ConceptKind::writable("Brand"), Some(ConceptKind::Brand));
    }

    #[test]
    fn most_specific_picks_deepest_label_in_any_order() {
        let labels = ["Thing", "Organisation", "PublicCompany", "Concept", "Company"];
        let kind = ConceptKind::most_specific("x", &labels).expect("resolve");
        assert_eq!(kind, ConceptKind::PublicCompany);
    }

    #[test]
    fn most_specific_ignores_unknown_labels() {
        let labels = ["Thing", "Concept", "Person", "LegacyLabel"];
        let kind = ConceptKind::most_specific("x", &labels).expect("resolve");
        assert_eq!(kind, ConceptKind::Person);
    }

    #[test]
    fn most_specific_rejects_unrelated_branches() {
        let labels = ["Person", "Brand"];
        let result = ConceptKind::most_specific("x", &labels);
        assert!(matches!(
            result,
            Err(ConcordanceError::UnrecognizedType { .. })
        ));
    }

    #[test]
    fn most_specific_rejects_empty_label_set() {
        let labels: [&str; 0] = [];
        let result = ConceptKind::most_specific("x", &labels);
        assert!(matches!(
            result,
            Err(ConcordanceError::UnrecognizedType { .. })
        ));
    }

    #[test]
    fn is_a_follows_the_chain() {
        assert!(ConceptKind::BoardRole.is_a(ConceptKind::MembershipRole));
        assert!(ConceptKind::Brand.is_a(ConceptKind::Classification));
        assert!(!ConceptKind::Brand.is_a(ConceptKind::Organisation));
    }
}
