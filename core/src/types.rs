//! Domain types shared by every stage of the replay.
//!
//! Identifiers are plain integer newtypes because they end up as primary and foreign
//! keys in the bulk-inserted rows. Lot groups are keyed by accession code plus the
//! sub-lot ordinal, which also drives display-code allocation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a storage location (resolved from a location code).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(u64);

impl LocationId {
    /// Creates a `LocationId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc#{}", self.0)
    }
}

/// Identifier of an accession row (resolved from an accession code).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessionId(u64);

impl AccessionId {
    /// Creates an `AccessionId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier of a materialized lot instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotId(u64);

impl LotId {
    /// Creates a `LotId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lot#{}", self.0)
    }
}

/// Unique identifier of a note record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(u64);

impl NoteId {
    /// Creates a `NoteId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// Identifies every lot descended from one accession + sub-lot baseline.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotGroupKey {
    /// Accession code as written in the source feeds
    pub accession: String,
    /// Sub-lot ordinal (propagation number) within the accession
    pub sub_lot: u32,
}

impl LotGroupKey {
    /// Creates a new group key
    #[must_use]
    pub fn new(accession: impl Into<String>, sub_lot: u32) -> Self {
        Self {
            accession: accession.into(),
            sub_lot,
        }
    }
}

impl fmt::Display for LotGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.accession, self.sub_lot)
    }
}

/// The originally received state of a lot group. Never mutated after load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotBaseline {
    /// Group this baseline seeds
    pub key: LotGroupKey,
    /// Accession the lots belong to
    pub accession_id: AccessionId,
    /// Quantity received
    pub quantity: u32,
    /// Initial location
    pub location_id: LocationId,
    /// Date the material was received
    pub received: NaiveDate,
}

/// A materialized lot record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotInstance {
    /// Unique lot id
    pub id: LotId,
    /// Group the lot descends from
    pub key: LotGroupKey,
    /// Accession the lot belongs to (cloned from the baseline)
    pub accession_id: AccessionId,
    /// Display code, unique within the group
    pub code: String,
    /// Current quantity
    pub quantity: u32,
    /// Current location
    pub location_id: LocationId,
}

impl LotInstance {
    /// Builds a new instance from its baseline, overriding quantity and location.
    #[must_use]
    pub fn from_baseline(
        baseline: &LotBaseline,
        id: LotId,
        code: String,
        quantity: u32,
        location_id: LocationId,
    ) -> Self {
        Self {
            id,
            key: baseline.key.clone(),
            accession_id: baseline.accession_id,
            code,
            quantity,
            location_id,
        }
    }

    /// Returns `true` once the lot has been drained by disposals
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity == 0
    }
}

/// Audit entry describing one event outcome on one lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Lot the change applies to
    pub lot_id: LotId,
    /// Date of the originating event
    pub date: NaiveDate,
    /// Location the quantity left
    pub from_location_id: Option<LocationId>,
    /// Location the quantity arrived at (transfers only)
    pub to_location_id: Option<LocationId>,
    /// Positive for transfers, negative for disposals
    pub quantity: i64,
    /// Disposal reason code
    pub reason: Option<String>,
    /// Set when the change carved this lot out of another one
    pub parent_lot_id: Option<LotId>,
    /// Note attached to the change
    pub note_id: Option<NoteId>,
}

impl ChangeRecord {
    /// Returns `true` if this record documents a split
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.parent_lot_id.is_some()
    }
}

/// Free-text annotation attached to a lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Unique note id
    pub id: NoteId,
    /// Lot the note belongs to
    pub lot_id: LotId,
    /// Date of the originating event
    pub date: NaiveDate,
    /// Note category (e.g. "Transfer")
    pub category: String,
    /// Note text
    pub text: String,
}
