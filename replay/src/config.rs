//! Configuration for a replay run.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use specimen_ledger_core::{LotId, NoteId};
use std::env;

/// Replay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Id of the first lot materialized (continues the target table's sequence)
    pub first_lot_id: u64,
    /// Id of the first note created
    pub first_note_id: u64,
    /// Location code used for baselines recorded without a location
    pub unknown_location: String,
    /// Emit a progress line every this many events (0 disables)
    pub progress_interval: usize,
    /// Category of notes attached to transfers
    pub transfer_note_category: String,
    /// Category of notes attached to disposals
    pub disposal_note_category: String,
    /// Print skipped events and shortfalls after the run
    pub report_anomalies: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            first_lot_id: 1,
            first_note_id: 1,
            unknown_location: "UNK".to_string(),
            progress_interval: 200,
            transfer_note_category: "Transfer".to_string(),
            disposal_note_category: "Disposal".to_string(),
            report_anomalies: false,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            first_lot_id: env::var("LEDGER_FIRST_LOT_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.first_lot_id),
            first_note_id: env::var("LEDGER_FIRST_NOTE_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.first_note_id),
            unknown_location: env::var("LEDGER_UNKNOWN_LOCATION")
                .unwrap_or(defaults.unknown_location),
            progress_interval: env::var("LEDGER_PROGRESS_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.progress_interval),
            transfer_note_category: env::var("LEDGER_TRANSFER_NOTE_CATEGORY")
                .unwrap_or(defaults.transfer_note_category),
            disposal_note_category: env::var("LEDGER_DISPOSAL_NOTE_CATEGORY")
                .unwrap_or(defaults.disposal_note_category),
            report_anomalies: env::var("LEDGER_REPORT_ANOMALIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.report_anomalies),
        }
    }

    /// Id given to the first materialized lot
    #[must_use]
    pub const fn first_lot_id(&self) -> LotId {
        LotId::new(self.first_lot_id)
    }

    /// Id given to the first note row
    #[must_use]
    pub const fn first_note_id(&self) -> NoteId {
        NoteId::new(self.first_note_id)
    }
}
