//! Fatal replay errors.
//!
//! Anything listed here aborts the whole batch: the replay is all-or-nothing and no
//! partial output is handed to persistence. Recoverable anomalies (short supply,
//! malformed rows) are reported through effects instead.

use crate::types::LotGroupKey;
use thiserror::Error;

/// Errors that abort a replay run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// An event references a group with no baseline
    #[error("Event references unknown lot group {0}")]
    UnknownLotGroup(LotGroupKey),

    /// A baseline references an accession code the accession resolver does not know
    #[error("Unknown accession code '{accession}' for lot group {key}")]
    UnknownAccession {
        /// Group of the offending baseline
        key: LotGroupKey,
        /// Accession code that failed to resolve
        accession: String,
    },

    /// A baseline location code could not be resolved
    #[error("Unresolvable location '{location}' for baseline {key}")]
    UnresolvedBaselineLocation {
        /// Group of the offending baseline
        key: LotGroupKey,
        /// Location code that failed to resolve
        location: String,
    },

    /// A baseline carries a negative quantity
    #[error("Baseline {key} has invalid quantity {quantity}")]
    InvalidBaselineQuantity {
        /// Group of the offending baseline
        key: LotGroupKey,
        /// Quantity found in the feed
        quantity: i64,
    },

    /// Two baselines share the same group key
    #[error("Duplicate baseline for lot group {0}")]
    DuplicateBaseline(LotGroupKey),
}
