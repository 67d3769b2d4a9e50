//! Replay engine.
//!
//! Drives one batch run end to end: merge the feeds, fold every event through the
//! [`LedgerReducer`], apply the returned effects to the audit trail and the run report,
//! then finalize untouched groups. The run is all-or-nothing: a fatal error discards
//! everything built so far.

use crate::audit::AuditTrail;
use crate::config::ReplayConfig;
use crate::finalize::finalize;
use crate::merge::merge_events;
use crate::metrics;
use crate::reducer::{LedgerReducer, NoteCategories, ReplayEnvironment, ReplayState};
use crate::registry::BaselineRegistry;
use serde::{Deserialize, Serialize};
use specimen_ledger_core::{
    ChangeRecord, Clock, DateTime, DisposalEvent, Effect, LotGroupKey, LotId, LotInstance,
    Materialization, NoteRecord, Reducer, ReplayError, Shortfall, SkippedEvent, TransferEvent,
    Utc,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Everything a replay run consumes.
#[derive(Debug, Clone, Default)]
pub struct ReplayInput {
    /// Baselines of every lot group
    pub registry: BaselineRegistry,
    /// Transfer feed, in any order
    pub transfers: Vec<TransferEvent>,
    /// Disposal feed, in any order
    pub disposals: Vec<DisposalEvent>,
    /// Event rows set aside during ingest
    pub skipped: Vec<SkippedEvent>,
}

impl ReplayInput {
    /// Creates input with no ingest-skipped rows
    #[must_use]
    pub fn new(
        registry: BaselineRegistry,
        transfers: Vec<TransferEvent>,
        disposals: Vec<DisposalEvent>,
    ) -> Self {
        Self {
            registry,
            transfers,
            disposals,
            skipped: Vec::new(),
        }
    }

    /// Carries event rows rejected before the replay into the run report
    #[must_use]
    pub fn with_skipped(mut self, skipped: Vec<SkippedEvent>) -> Self {
        self.skipped = skipped;
        self
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Events seen, including rows skipped during ingest
    pub events_total: usize,
    /// Events that changed the pool
    pub events_applied: usize,
    /// Events skipped as malformed
    pub skipped: Vec<SkippedEvent>,
    /// Disposals that exceeded modelled quantity
    pub shortfalls: Vec<Shortfall>,
    /// Lots carved out by partial transfers
    pub splits: usize,
    /// Lots conjured for unmodelled history
    pub placeholders: usize,
    /// Lots created for groups no event touched
    pub finalized: usize,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    fn new(events_total: usize, skipped: Vec<SkippedEvent>) -> Self {
        Self {
            events_total,
            events_applied: 0,
            skipped,
            shortfalls: Vec::new(),
            splits: 0,
            placeholders: 0,
            finalized: 0,
            completed_at: DateTime::<Utc>::default(),
        }
    }

    /// Returns `true` if the run skipped events or left disposals short
    #[must_use]
    pub fn has_anomalies(&self) -> bool {
        !self.skipped.is_empty() || !self.shortfalls.is_empty()
    }

    /// Human-readable listing of skipped events and shortfalls
    #[must_use]
    pub const fn anomalies(&self) -> Anomalies<'_> {
        Anomalies(self)
    }
}

/// Display adapter listing the anomalies of a [`RunReport`].
#[derive(Debug, Clone, Copy)]
pub struct Anomalies<'a>(&'a RunReport);

impl fmt::Display for Anomalies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "Skipped events: {}", report.skipped.len())?;
        for skipped in &report.skipped {
            writeln!(
                f,
                "  {} {} {}: {}",
                skipped.date, skipped.kind, skipped.key, skipped.reason
            )?;
        }
        writeln!(f, "Shortfalls: {}", report.shortfalls.len())?;
        for shortfall in &report.shortfalls {
            writeln!(
                f,
                "  {} {} at {}: requested {}, unresolved {}",
                shortfall.date,
                shortfall.key,
                shortfall.location_id,
                shortfall.requested,
                shortfall.unresolved
            )?;
        }
        Ok(())
    }
}

/// Result of a successful run, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayOutput {
    /// Every lot, in creation order
    pub lots: Vec<LotInstance>,
    /// Change rows, in emission order
    pub changes: Vec<ChangeRecord>,
    /// Note rows, in emission order
    pub notes: Vec<NoteRecord>,
    /// Run summary and anomalies
    pub report: RunReport,
}

impl ReplayOutput {
    /// Lots of one group, in creation order
    pub fn group<'a>(&'a self, key: &'a LotGroupKey) -> impl Iterator<Item = &'a LotInstance> {
        self.lots.iter().filter(move |lot| &lot.key == key)
    }

    /// Total quantity held by one group
    #[must_use]
    pub fn group_quantity(&self, key: &LotGroupKey) -> u64 {
        self.group(key).map(|lot| u64::from(lot.quantity)).sum()
    }

    /// Looks a lot up by group and display code
    #[must_use]
    pub fn lot(&self, key: &LotGroupKey, code: &str) -> Option<&LotInstance> {
        self.lots
            .iter()
            .find(|lot| &lot.key == key && lot.code == code)
    }

    /// Change rows of one lot, in emission order
    pub fn changes_for(&self, lot: LotId) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(move |change| change.lot_id == lot)
    }
}

/// Batch replay driver.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    config: ReplayConfig,
    reducer: LedgerReducer,
}

impl ReplayEngine {
    /// Creates an engine with the given configuration
    #[must_use]
    pub const fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            reducer: LedgerReducer::new(),
        }
    }

    /// Configuration this engine runs with
    #[must_use]
    pub const fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replays the feeds and finalizes untouched groups.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::UnknownLotGroup` if any event refers to a group without a
    /// baseline. Nothing of the run is returned in that case.
    pub fn run(
        &self,
        input: ReplayInput,
        clock: Arc<dyn Clock>,
    ) -> Result<ReplayOutput, ReplayError> {
        let started = Instant::now();
        let ReplayInput {
            registry,
            transfers,
            disposals,
            skipped,
        } = input;

        for event in &skipped {
            metrics::record_event_skipped(event.kind);
        }

        let events = merge_events(transfers, disposals);
        let events_total = events.len() + skipped.len();
        tracing::info!(
            events = events.len(),
            baselines = registry.len(),
            "Replaying ledger"
        );

        let env = ReplayEnvironment::new(Arc::new(registry), clock).with_note_categories(
            NoteCategories {
                transfer: self.config.transfer_note_category.clone(),
                disposal: self.config.disposal_note_category.clone(),
            },
        );
        let mut state = ReplayState::new(self.config.first_lot_id(), self.config.first_note_id());
        let mut audit = AuditTrail::new();
        let mut report = RunReport::new(events_total, skipped);

        for (index, event) in events.into_iter().enumerate() {
            let kind = event.kind();
            let effects = self.reducer.reduce(&mut state, event, &env).inspect_err(|error| {
                tracing::error!(%error, event = index, "Replay aborted");
            })?;

            let mut applied = true;
            for effect in effects {
                applied &= !matches!(effect, Effect::Skipped(_));
                apply_effect(effect, &mut audit, &mut report);
            }
            if applied {
                report.events_applied += 1;
                metrics::record_event_applied(kind);
            } else {
                metrics::record_event_skipped(kind);
            }

            let done = index + 1;
            if self.config.progress_interval > 0 && done % self.config.progress_interval == 0 {
                tracing::debug!(done, lots = state.pool.len(), "Replay progress");
            }
        }

        for effect in finalize(&mut state.pool, &env.registry) {
            apply_effect(effect, &mut audit, &mut report);
        }

        report.completed_at = env.clock.now();
        let (changes, notes) = audit.into_parts();
        let lots = state.pool.into_lots();

        tracing::info!(
            lots = lots.len(),
            changes = changes.len(),
            notes = notes.len(),
            applied = report.events_applied,
            skipped = report.skipped.len(),
            shortfalls = report.shortfalls.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Replay complete"
        );

        Ok(ReplayOutput {
            lots,
            changes,
            notes,
            report,
        })
    }
}

fn apply_effect(effect: Effect, audit: &mut AuditTrail, report: &mut RunReport) {
    match effect {
        Effect::Materialized { reason, .. } => {
            metrics::record_lot_materialized(reason);
            match reason {
                Materialization::Split => report.splits += 1,
                Materialization::Placeholder => report.placeholders += 1,
                Materialization::Finalized => report.finalized += 1,
                Materialization::Opening => {},
            }
        },
        Effect::RecordNote(note) => audit.push_note(note),
        Effect::RecordChange(change) => audit.push_change(change),
        Effect::Shortfall(shortfall) => {
            metrics::record_shortfall(shortfall.unresolved);
            report.shortfalls.push(shortfall);
        },
        Effect::Skipped(skipped) => report.skipped.push(skipped),
    }
}
