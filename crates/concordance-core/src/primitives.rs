//! # Engine Primitives
//!
//! Hardcoded property keys and limits for the concordance engine.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Label property on canonical and source nodes.
pub const PREF_LABEL: &str = "prefLabel";

/// Fingerprint of the last accepted write, stored on the canonical node.
pub const AGGREGATE_HASH: &str = "aggregateHash";

/// Authority that reported a source record.
pub const AUTHORITY: &str = "authority";

/// Authority-local value of a source record.
pub const AUTHORITY_VALUE: &str = "authorityValue";

/// Write stamp on source nodes, in seconds since the Unix epoch.
///
/// Informational only: reads strip it.
pub const LAST_MODIFIED_EPOCH: &str = "lastModifiedEpoch";

/// Edge property carrying the start of a membership role.
pub const INCEPTION_DATE: &str = "inceptionDate";

/// Edge property carrying the end of a membership role.
pub const TERMINATION_DATE: &str = "terminationDate";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of source records in one aggregate.
///
/// Aggregates larger than this are rejected by validation.
pub const MAX_SOURCE_REPRESENTATIONS: usize = 1000;

/// Maximum length of an identifier (`prefUUID`, `uuid`, relation target).
pub const MAX_ID_LENGTH: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_keys_are_distinct() {
        let keys = [
            PREF_LABEL,
            AGGREGATE_HASH,
            AUTHORITY,
            AUTHORITY_VALUE,
            LAST_MODIFIED_EPOCH,
        ];
        let unique: std::collections::BTreeSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
