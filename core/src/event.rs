//! Ledger events replayed against the lot pool.
//!
//! Two independently maintained logs feed the replay: location transfers and
//! disposals. Both are folded into [`LedgerEvent`] so a single ordered sequence can be
//! replayed.
//!
//! # Ordering
//!
//! Events order by date first. On the same day a disposal sorts before a transfer,
//! which is encoded in the declaration order of [`EventKind`]:
//!
//! ```
//! use specimen_ledger_core::event::EventKind;
//!
//! assert!(EventKind::Disposal < EventKind::Transfer);
//! ```

use crate::types::{LocationId, LotGroupKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of ledger event. Declaration order is the same-day precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Quantity permanently removed from a lot
    Disposal,
    /// Quantity moved between locations
    Transfer,
}

impl EventKind {
    /// Stable lowercase label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disposal => "disposal",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity moved from one location to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Group being moved
    pub key: LotGroupKey,
    /// Date of the move
    pub date: NaiveDate,
    /// Source location
    pub from: LocationId,
    /// Destination location
    pub to: LocationId,
    /// Exact quantity moved
    pub quantity: u32,
    /// Free-text remarks (may be empty)
    pub remarks: String,
}

/// A quantity permanently removed at a location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalEvent {
    /// Group being disposed of
    pub key: LotGroupKey,
    /// Date of the disposal
    pub date: NaiveDate,
    /// Location the quantity is removed from
    pub from: LocationId,
    /// Quantity removed
    pub quantity: u32,
    /// Reason code (death, sale, ...)
    pub reason: String,
    /// Free-text remarks (may be empty)
    pub remarks: String,
}

/// One entry of the merged ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A location transfer
    Transfer(TransferEvent),
    /// A disposal
    Disposal(DisposalEvent),
}

impl LedgerEvent {
    /// Group the event refers to
    #[must_use]
    pub const fn key(&self) -> &LotGroupKey {
        match self {
            Self::Transfer(event) => &event.key,
            Self::Disposal(event) => &event.key,
        }
    }

    /// Date the event happened
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Transfer(event) => event.date,
            Self::Disposal(event) => event.date,
        }
    }

    /// Event kind
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Transfer(_) => EventKind::Transfer,
            Self::Disposal(_) => EventKind::Disposal,
        }
    }

    /// Quantity stated by the event
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match self {
            Self::Transfer(event) => event.quantity,
            Self::Disposal(event) => event.quantity,
        }
    }

    /// Sort key of the replay order: date, then kind precedence.
    #[must_use]
    pub const fn ordering_key(&self) -> (NaiveDate, EventKind) {
        (self.date(), self.kind())
    }
}

impl From<TransferEvent> for LedgerEvent {
    fn from(event: TransferEvent) -> Self {
        Self::Transfer(event)
    }
}

impl From<DisposalEvent> for LedgerEvent {
    fn from(event: DisposalEvent) -> Self {
        Self::Disposal(event)
    }
}
