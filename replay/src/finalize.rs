//! Finalizer: materializes lot groups no event ever touched.

use crate::pool::LotPool;
use crate::registry::BaselineRegistry;
use specimen_ledger_core::{Effect, Materialization};

/// Creates one lot at baseline quantity and location for every untouched group.
///
/// Groups are visited in registry load order, so lot ids and codes are deterministic.
pub fn finalize(pool: &mut LotPool, registry: &BaselineRegistry) -> Vec<Effect> {
    let mut effects = Vec::new();
    for baseline in registry.iter() {
        if pool.is_touched(&baseline.key) {
            continue;
        }
        let lot_id = pool.materialize(baseline, baseline.quantity, baseline.location_id);
        effects.push(Effect::Materialized {
            lot_id,
            key: baseline.key.clone(),
            reason: Materialization::Finalized,
        });
    }
    tracing::debug!(finalized = effects.len(), "Finalized untouched lot groups");
    effects
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use specimen_ledger_core::{LocationId, LotGroupKey, LotId};
    use specimen_ledger_testing::helpers::baseline;

    #[test]
    fn untouched_groups_get_one_lot_each() {
        let registry = BaselineRegistry::from_baselines([
            baseline("36762", 0, 3, 5),
            baseline("4084", 0, 8, 1),
            baseline("11663", 1, 44, 2),
        ])
        .unwrap();
        let mut pool = LotPool::new(LotId::new(1));
        let touched = registry.get(&LotGroupKey::new("4084", 0)).unwrap().clone();
        pool.materialize(&touched, 8, LocationId::new(1));

        let effects = finalize(&mut pool, &registry);

        assert_eq!(effects.len(), 2);
        let created: Vec<_> = pool
            .lots()
            .iter()
            .skip(1)
            .map(|lot| (lot.key.accession.as_str(), lot.code.as_str(), lot.quantity, lot.location_id.value()))
            .collect();
        assert_eq!(created, vec![("36762", "0000", 3, 5), ("11663", "1000", 44, 2)]);
        assert!(effects.iter().all(|e| matches!(
            e,
            Effect::Materialized { reason: Materialization::Finalized, .. }
        )));
    }

    #[test]
    fn running_twice_adds_nothing() {
        let registry = BaselineRegistry::from_baselines([baseline("1", 0, 1, 1)]).unwrap();
        let mut pool = LotPool::new(LotId::new(1));
        assert_eq!(finalize(&mut pool, &registry).len(), 1);
        assert!(finalize(&mut pool, &registry).is_empty());
        assert_eq!(pool.len(), 1);
    }
}
