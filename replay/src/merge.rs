//! Event merger.
//!
//! Concatenates the transfer and disposal streams and stable-sorts them by date, with
//! disposals ahead of transfers on the same day. Same-kind events on the same day keep
//! their input order.

use specimen_ledger_core::{DisposalEvent, LedgerEvent, TransferEvent};
use std::cmp::Ordering;

/// Total order used to replay the ledger.
#[must_use]
pub fn compare(a: &LedgerEvent, b: &LedgerEvent) -> Ordering {
    a.ordering_key().cmp(&b.ordering_key())
}

/// Merges both streams into one replay sequence.
///
/// Neither input needs to be sorted.
#[must_use]
pub fn merge_events(
    transfers: Vec<TransferEvent>,
    disposals: Vec<DisposalEvent>,
) -> Vec<LedgerEvent> {
    let mut events: Vec<LedgerEvent> = Vec::with_capacity(transfers.len() + disposals.len());
    events.extend(transfers.into_iter().map(LedgerEvent::from));
    events.extend(disposals.into_iter().map(LedgerEvent::from));

    // `sort_by` is stable
    events.sort_by(compare);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_ledger_core::EventKind;
    use specimen_ledger_testing::helpers::{day, disposal, transfer};

    #[test]
    fn orders_by_date() {
        let merged = merge_events(
            vec![
                transfer("A", 0, day(5), 1, 2, 1),
                transfer("A", 0, day(1), 1, 2, 1),
            ],
            vec![disposal("A", 0, day(3), 1, 1)],
        );
        let dates: Vec<_> = merged.iter().map(LedgerEvent::date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);
    }

    #[test]
    fn disposal_precedes_same_day_transfer() {
        let merged = merge_events(
            vec![transfer("D", 0, day(1), 1, 2, 2)],
            vec![disposal("D", 0, day(1), 1, 1)],
        );
        let kinds: Vec<_> = merged.iter().map(LedgerEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Disposal, EventKind::Transfer]);
    }

    #[test]
    fn same_kind_same_day_keeps_input_order() {
        let merged = merge_events(
            vec![
                transfer("A", 0, day(2), 1, 2, 1),
                transfer("A", 0, day(2), 2, 3, 1),
                transfer("A", 0, day(2), 3, 4, 1),
            ],
            Vec::new(),
        );
        let hops: Vec<_> = merged
            .iter()
            .map(|event| match event {
                LedgerEvent::Transfer(t) => (t.from.value(), t.to.value()),
                LedgerEvent::Disposal(_) => (0, 0),
            })
            .collect();
        assert_eq!(hops, vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn empty_streams() {
        assert!(merge_events(Vec::new(), Vec::new()).is_empty());
    }
}
