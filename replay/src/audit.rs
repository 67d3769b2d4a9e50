//! Audit trail builder.
//!
//! Append-only log of change and note rows, indexed by lot id.

use specimen_ledger_core::{ChangeRecord, LotId, NoteRecord};
use std::collections::HashMap;

/// Change and note rows in emission order.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    changes: Vec<ChangeRecord>,
    notes: Vec<NoteRecord>,
    changes_by_lot: HashMap<LotId, Vec<usize>>,
    notes_by_lot: HashMap<LotId, Vec<usize>>,
}

impl AuditTrail {
    /// Creates an empty trail
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change row
    pub fn push_change(&mut self, change: ChangeRecord) {
        self.changes_by_lot
            .entry(change.lot_id)
            .or_default()
            .push(self.changes.len());
        self.changes.push(change);
    }

    /// Appends a note row
    pub fn push_note(&mut self, note: NoteRecord) {
        self.notes_by_lot
            .entry(note.lot_id)
            .or_default()
            .push(self.notes.len());
        self.notes.push(note);
    }

    /// Change rows in emission order
    #[must_use]
    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    /// Note rows in emission order
    #[must_use]
    pub fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    /// Change rows of one lot, in emission order
    pub fn changes_for(&self, lot: LotId) -> impl Iterator<Item = &ChangeRecord> {
        self.changes_by_lot
            .get(&lot)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.changes[index])
    }

    /// Note rows of one lot, in emission order
    pub fn notes_for(&self, lot: LotId) -> impl Iterator<Item = &NoteRecord> {
        self.notes_by_lot
            .get(&lot)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.notes[index])
    }

    /// Splits the trail into its change and note rows
    #[must_use]
    pub fn into_parts(self) -> (Vec<ChangeRecord>, Vec<NoteRecord>) {
        (self.changes, self.notes)
    }
}
