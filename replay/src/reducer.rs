//! Replay state machine.
//!
//! `LedgerReducer` folds one ledger event at a time into the lot pool and describes the
//! resulting audit rows as effects. It never fails on missing lots or short supply:
//! missing lots are conjured as placeholders and short disposals are reported. The only
//! error is an event whose group has no baseline.

use crate::pool::LotPool;
use crate::registry::BaselineRegistry;
use chrono::NaiveDate;
use specimen_ledger_core::{
    ChangeRecord, Clock, DisposalEvent, Effect, Effects, LedgerEvent, LotBaseline, LotId,
    Materialization, NoteId, NoteRecord, Reducer, ReplayError, Shortfall, SkippedEvent,
    SmallVec, TransferEvent, smallvec,
};
use std::sync::Arc;

/// Categories given to notes created from event remarks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCategories {
    /// Category of notes attached to transfers
    pub transfer: String,
    /// Category of notes attached to disposals
    pub disposal: String,
}

impl Default for NoteCategories {
    fn default() -> Self {
        Self {
            transfer: "Transfer".to_string(),
            disposal: "Disposal".to_string(),
        }
    }
}

/// Environment dependencies for the replay reducer
#[derive(Clone)]
pub struct ReplayEnvironment {
    /// Baselines of every known lot group
    pub registry: Arc<BaselineRegistry>,
    /// Clock used to stamp the run report
    pub clock: Arc<dyn Clock>,
    /// Note categories
    pub notes: NoteCategories,
}

impl ReplayEnvironment {
    /// Creates a new `ReplayEnvironment`
    #[must_use]
    pub fn new(registry: Arc<BaselineRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            clock,
            notes: NoteCategories::default(),
        }
    }

    /// Overrides the note categories
    #[must_use]
    pub fn with_note_categories(mut self, notes: NoteCategories) -> Self {
        self.notes = notes;
        self
    }
}

/// State threaded through the replay fold
#[derive(Debug, Clone)]
pub struct ReplayState {
    /// Every lot materialized so far
    pub pool: LotPool,
    next_note_id: u64,
}

impl ReplayState {
    /// Creates an empty state with the first ids to hand out
    #[must_use]
    pub fn new(first_lot_id: LotId, first_note_id: NoteId) -> Self {
        Self {
            pool: LotPool::new(first_lot_id),
            next_note_id: first_note_id.value(),
        }
    }

    fn allocate_note_id(&mut self) -> NoteId {
        let id = NoteId::new(self.next_note_id);
        self.next_note_id += 1;
        id
    }
}

impl Default for ReplayState {
    fn default() -> Self {
        Self::new(LotId::new(1), NoteId::new(1))
    }
}

/// Reducer replaying transfers and disposals
#[derive(Clone, Debug, Default)]
pub struct LedgerReducer;

impl LedgerReducer {
    /// Creates a new `LedgerReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reason an event cannot be applied, if any
    fn validate(event: &LedgerEvent) -> Option<String> {
        if event.quantity() == 0 {
            return Some("quantity must be positive".to_string());
        }
        None
    }

    /// Materializes the baseline lot the first time a group is referenced
    fn open_group(state: &mut ReplayState, baseline: &LotBaseline, effects: &mut Effects) {
        if state.pool.is_touched(&baseline.key) {
            return;
        }
        let lot_id = state
            .pool
            .materialize(baseline, baseline.quantity, baseline.location_id);
        tracing::debug!(group = %baseline.key, lot = %lot_id, quantity = baseline.quantity, "Opened lot group");
        effects.push(Effect::Materialized {
            lot_id,
            key: baseline.key.clone(),
            reason: Materialization::Opening,
        });
    }

    /// Emits a note for non-blank remarks and returns its id
    fn record_note(
        state: &mut ReplayState,
        lot_id: LotId,
        date: NaiveDate,
        category: &str,
        remarks: &str,
        effects: &mut Effects,
    ) -> Option<NoteId> {
        let text = remarks.trim();
        if text.is_empty() {
            return None;
        }
        let id = state.allocate_note_id();
        effects.push(Effect::RecordNote(NoteRecord {
            id,
            lot_id,
            date,
            category: category.to_string(),
            text: text.to_string(),
        }));
        Some(id)
    }

    fn apply_transfer(
        state: &mut ReplayState,
        baseline: &LotBaseline,
        event: TransferEvent,
        env: &ReplayEnvironment,
        effects: &mut Effects,
    ) {
        let selected = state
            .pool
            .candidates(&event.key, event.from, event.quantity)
            .next()
            .map(|lot| (lot.id, lot.quantity));

        let (lot_id, parent_lot_id) = match selected {
            None => {
                let lot_id = state.pool.materialize(baseline, event.quantity, event.from);
                tracing::debug!(
                    group = %event.key,
                    from = %event.from,
                    quantity = event.quantity,
                    "No lot to transfer, conjured placeholder"
                );
                effects.push(Effect::Materialized {
                    lot_id,
                    key: event.key.clone(),
                    reason: Materialization::Placeholder,
                });
                (lot_id, None)
            },
            Some((parent, held)) if held > event.quantity => {
                if let Some(lot) = state.pool.get_mut(parent) {
                    lot.quantity = held - event.quantity;
                }
                let lot_id = state.pool.materialize(baseline, event.quantity, event.from);
                tracing::debug!(
                    group = %event.key,
                    parent = %parent,
                    lot = %lot_id,
                    quantity = event.quantity,
                    "Split lot for partial transfer"
                );
                effects.push(Effect::Materialized {
                    lot_id,
                    key: event.key.clone(),
                    reason: Materialization::Split,
                });
                (lot_id, Some(parent))
            },
            Some((lot_id, _)) => (lot_id, None),
        };

        if let Some(lot) = state.pool.get_mut(lot_id) {
            lot.quantity = event.quantity;
            lot.location_id = event.to;
        }

        let note_id = Self::record_note(
            state,
            lot_id,
            event.date,
            &env.notes.transfer,
            &event.remarks,
            effects,
        );
        effects.push(Effect::RecordChange(ChangeRecord {
            lot_id,
            date: event.date,
            from_location_id: Some(event.from),
            to_location_id: Some(event.to),
            quantity: i64::from(event.quantity),
            reason: None,
            parent_lot_id,
            note_id,
        }));
    }

    fn apply_disposal(
        state: &mut ReplayState,
        baseline: &LotBaseline,
        event: DisposalEvent,
        env: &ReplayEnvironment,
        effects: &mut Effects,
    ) {
        let mut candidates: SmallVec<[LotId; 4]> = state
            .pool
            .candidates_at_location(&event.key, event.from)
            .map(|lot| lot.id)
            .collect();

        if candidates.is_empty() {
            let lot_id = state.pool.materialize(baseline, 0, event.from);
            tracing::debug!(
                group = %event.key,
                from = %event.from,
                "No lot to dispose from, conjured empty placeholder"
            );
            effects.push(Effect::Materialized {
                lot_id,
                key: event.key.clone(),
                reason: Materialization::Placeholder,
            });
            candidates.push(lot_id);
        }

        let reason = (!event.reason.trim().is_empty()).then(|| event.reason.trim().to_string());
        let mut remaining = event.quantity;
        for lot_id in candidates {
            let Some(lot) = state.pool.get_mut(lot_id) else {
                continue;
            };
            let take = lot.quantity.min(remaining);
            lot.quantity -= take;
            remaining -= take;

            let note_id = Self::record_note(
                state,
                lot_id,
                event.date,
                &env.notes.disposal,
                &event.remarks,
                effects,
            );
            effects.push(Effect::RecordChange(ChangeRecord {
                lot_id,
                date: event.date,
                from_location_id: Some(event.from),
                to_location_id: None,
                quantity: -i64::from(take),
                reason: reason.clone(),
                parent_lot_id: None,
                note_id,
            }));

            if remaining == 0 {
                break;
            }
        }

        if remaining > 0 {
            tracing::warn!(
                group = %event.key,
                date = %event.date,
                from = %event.from,
                requested = event.quantity,
                unresolved = remaining,
                "Disposal exceeds modelled quantity"
            );
            effects.push(Effect::Shortfall(Shortfall {
                key: event.key,
                date: event.date,
                location_id: event.from,
                requested: event.quantity,
                unresolved: remaining,
            }));
        }
    }
}

impl Reducer for LedgerReducer {
    type State = ReplayState;
    type Action = LedgerEvent;
    type Environment = ReplayEnvironment;
    type Error = ReplayError;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects, ReplayError> {
        let baseline = env.registry.require(action.key())?;

        if let Some(reason) = Self::validate(&action) {
            tracing::warn!(
                kind = %action.kind(),
                group = %action.key(),
                date = %action.date(),
                %reason,
                "Skipping malformed event"
            );
            return Ok(smallvec![Effect::Skipped(SkippedEvent {
                kind: action.kind(),
                key: action.key().clone(),
                date: action.date(),
                reason,
            })]);
        }

        let mut effects = Effects::new();
        Self::open_group(state, baseline, &mut effects);

        match action {
            LedgerEvent::Transfer(event) => {
                Self::apply_transfer(state, baseline, event, env, &mut effects);
            },
            LedgerEvent::Disposal(event) => {
                Self::apply_disposal(state, baseline, event, env, &mut effects);
            },
        }

        Ok(effects)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use specimen_ledger_core::{LocationId, LotGroupKey};
    use specimen_ledger_testing::ReducerTest;
    use specimen_ledger_testing::helpers::{baseline, day, disposal, transfer};
    use specimen_ledger_testing::reducer_test::assertions;
    use specimen_ledger_testing::test_clock;

    fn env(baselines: Vec<LotBaseline>) -> ReplayEnvironment {
        let registry = BaselineRegistry::from_baselines(baselines).unwrap();
        ReplayEnvironment::new(Arc::new(registry), Arc::new(test_clock()))
    }

    fn lot(state: &ReplayState, code: &str) -> (u32, u64) {
        let found = state
            .pool
            .lots()
            .iter()
            .find(|lot| lot.code == code)
            .unwrap();
        (found.quantity, found.location_id.value())
    }

    #[test]
    fn partial_transfer_splits_first_candidate() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("B", 0, 10, 1)]))
            .given_state(ReplayState::default())
            .when_action(transfer("B", 0, day(1), 1, 2, 4).into())
            .then_state(|state| {
                assert_eq!(state.pool.len(), 2);
                assert_eq!(lot(state, "0000"), (6, 1));
                assert_eq!(lot(state, "0001"), (4, 2));
            })
            .then_effects(|effects| {
                assertions::assert_materialized(effects, Materialization::Opening, 1);
                assertions::assert_materialized(effects, Materialization::Split, 1);
                assertions::assert_change_count(effects, 1);
                let change = effects.iter().find_map(Effect::as_change).unwrap();
                assert_eq!(change.lot_id, LotId::new(2));
                assert_eq!(change.parent_lot_id, Some(LotId::new(1)));
                assert_eq!(change.quantity, 4);
                assert_eq!(change.from_location_id, Some(LocationId::new(1)));
                assert_eq!(change.to_location_id, Some(LocationId::new(2)));
            })
            .run();
    }

    #[test]
    fn whole_transfer_moves_lot_without_split() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("B", 0, 10, 1)]))
            .given_state(ReplayState::default())
            .when_action(transfer("B", 0, day(1), 1, 3, 10).into())
            .then_state(|state| {
                assert_eq!(state.pool.len(), 1);
                assert_eq!(lot(state, "0000"), (10, 3));
            })
            .then_effects(|effects| {
                assertions::assert_materialized(effects, Materialization::Split, 0);
                let change = effects.iter().find_map(Effect::as_change).unwrap();
                assert!(!change.is_split());
            })
            .run();
    }

    #[test]
    fn transfer_without_candidate_conjures_lot() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("E", 0, 2, 1)]))
            .given_state(ReplayState::default())
            .when_action(transfer("E", 0, day(1), 7, 8, 3).into())
            .then_state(|state| {
                assert_eq!(state.pool.len(), 2);
                assert_eq!(lot(state, "0000"), (2, 1));
                assert_eq!(lot(state, "0001"), (3, 8));
            })
            .then_effects(|effects| {
                assertions::assert_materialized(effects, Materialization::Placeholder, 1);
                let change = effects.iter().find_map(Effect::as_change).unwrap();
                assert_eq!(change.parent_lot_id, None);
            })
            .run();
    }

    #[test]
    fn transfer_picks_first_candidate_not_best_fit() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("F", 0, 10, 1)]))
            .given_state(ReplayState::default())
            // 0000 keeps 7 at L1, 0001 gets 3 and comes back to L1
            .when_action(transfer("F", 0, day(1), 1, 2, 3).into())
            .when_action(transfer("F", 0, day(2), 2, 1, 3).into())
            // exact fit exists (0001 holds 3) but 0000 comes first
            .when_action(transfer("F", 0, day(3), 1, 4, 3).into())
            .then_state(|state| {
                assert_eq!(lot(state, "0000"), (4, 1));
                assert_eq!(lot(state, "0001"), (3, 1));
                assert_eq!(lot(state, "0002"), (3, 4));
            })
            .run();
    }

    #[test]
    fn disposal_drains_across_lots_in_pool_order() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("G", 0, 5, 1)]))
            .given_state(ReplayState::default())
            .when_action(transfer("G", 0, day(1), 1, 2, 2).into())
            .when_action(transfer("G", 0, day(2), 2, 1, 2).into())
            .when_action(disposal("G", 0, day(3), 1, 4).into())
            .then_state(|state| {
                assert_eq!(lot(state, "0000"), (0, 1));
                assert_eq!(lot(state, "0001"), (1, 1));
            })
            .then_effects(|effects| {
                let drained: Vec<_> = effects
                    .iter()
                    .filter_map(Effect::as_change)
                    .filter(|c| c.quantity < 0)
                    .map(|c| (c.lot_id.value(), c.quantity))
                    .collect();
                assert_eq!(drained, vec![(1, -3), (2, -1)]);
            })
            .run();
    }

    #[test]
    fn short_disposal_reports_shortfall() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("H", 0, 2, 1)]))
            .given_state(ReplayState::default())
            .when_action(disposal("H", 0, day(1), 1, 5).into())
            .then_state(|state| {
                assert_eq!(lot(state, "0000"), (0, 1));
            })
            .then_effects(|effects| {
                assertions::assert_has_shortfall(effects);
                let shortfall = effects
                    .iter()
                    .find_map(|e| match e {
                        Effect::Shortfall(s) => Some(s.clone()),
                        _ => None,
                    })
                    .unwrap();
                assert_eq!(shortfall.requested, 5);
                assert_eq!(shortfall.unresolved, 3);
            })
            .run();
    }

    #[test]
    fn disposal_elsewhere_conjures_empty_placeholder() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("3", 0, 2, 1)]))
            .given_state(ReplayState::default())
            .when_action(disposal("3", 0, day(1), 9, 1).into())
            .then_state(|state| {
                assert_eq!(lot(state, "0000"), (2, 1));
                assert_eq!(lot(state, "0001"), (0, 9));
            })
            .then_effects(|effects| {
                assertions::assert_materialized(effects, Materialization::Placeholder, 1);
                assertions::assert_has_shortfall(effects);
                let change = effects.iter().find_map(Effect::as_change).unwrap();
                assert_eq!(change.quantity, 0);
                assert_eq!(change.reason.as_deref(), Some("DEAD"));
            })
            .run();
    }

    #[test]
    fn remarks_become_notes() {
        let mut event = transfer("N", 0, day(1), 1, 2, 1);
        event.remarks = "  moved to nursery ".to_string();

        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("N", 0, 1, 1)]))
            .given_state(ReplayState::new(LotId::new(1), NoteId::new(40)))
            .when_action(event.into())
            .then_effects(|effects| {
                let note = effects.iter().find_map(Effect::as_note).unwrap();
                assert_eq!(note.id, NoteId::new(40));
                assert_eq!(note.text, "moved to nursery");
                assert_eq!(note.category, "Transfer");
                let change = effects.iter().find_map(Effect::as_change).unwrap();
                assert_eq!(change.note_id, Some(NoteId::new(40)));
            })
            .run();
    }

    #[test]
    fn zero_quantity_event_is_skipped() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("Z", 0, 1, 1)]))
            .given_state(ReplayState::default())
            .when_action(disposal("Z", 0, day(1), 1, 0).into())
            .then_state(|state| {
                assert!(state.pool.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_skipped(effects);
                assertions::assert_change_count(effects, 0);
            })
            .run();
    }

    #[test]
    fn unknown_group_is_fatal() {
        ReducerTest::new(LedgerReducer::new())
            .with_env(env(vec![baseline("A", 0, 1, 1)]))
            .given_state(ReplayState::default())
            .when_action(transfer("missing", 0, day(1), 1, 2, 1).into())
            .then_error(|error| {
                assert_eq!(
                    *error,
                    ReplayError::UnknownLotGroup(LotGroupKey::new("missing", 0))
                );
            })
            .then_state(|state| {
                assert!(state.pool.is_empty());
            })
            .run();
    }
}
