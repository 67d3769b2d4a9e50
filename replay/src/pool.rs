//! The lot pool: every lot instance materialized during a replay.
//!
//! Instances live in an arena in creation order; a group multimap holds arena indices
//! per lot group, so candidate queries walk a group's lots in pool-insertion order.
//! Candidate selection is always "first match in insertion order", never best fit.

use crate::codes::CodeGenerator;
use specimen_ledger_core::{LocationId, LotBaseline, LotGroupKey, LotId, LotInstance};
use std::collections::{HashMap, HashSet};

/// Mutable working set of lot instances.
#[derive(Debug, Clone)]
pub struct LotPool {
    lots: Vec<LotInstance>,
    by_group: HashMap<LotGroupKey, Vec<usize>>,
    by_id: HashMap<LotId, usize>,
    touched: HashSet<LotGroupKey>,
    codes: CodeGenerator,
    next_id: u64,
}

impl LotPool {
    /// Creates an empty pool whose first lot gets `first_id`
    #[must_use]
    pub fn new(first_id: LotId) -> Self {
        Self {
            lots: Vec::new(),
            by_group: HashMap::new(),
            by_id: HashMap::new(),
            touched: HashSet::new(),
            codes: CodeGenerator::new(),
            next_id: first_id.value(),
        }
    }

    /// Lots of `key` at `location` holding at least `min_quantity`, in insertion order.
    pub fn candidates<'a>(
        &'a self,
        key: &LotGroupKey,
        location: LocationId,
        min_quantity: u32,
    ) -> impl Iterator<Item = &'a LotInstance> + use<'a> {
        self.candidates_at_location(key, location)
            .filter(move |lot| lot.quantity >= min_quantity)
    }

    /// All lots of `key` at `location`, whatever their quantity, in insertion order.
    pub fn candidates_at_location<'a>(
        &'a self,
        key: &LotGroupKey,
        location: LocationId,
    ) -> impl Iterator<Item = &'a LotInstance> + use<'a> {
        self.group(key)
            .filter(move |lot| lot.location_id == location)
    }

    /// All lots of `key` in insertion order
    pub fn group<'a>(&'a self, key: &LotGroupKey) -> impl Iterator<Item = &'a LotInstance> + use<'a> {
        self.by_group
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.lots[index])
    }

    /// Creates a lot from `baseline` with the given quantity and location.
    ///
    /// The lot gets the next id and the next display code of its group, and the group
    /// is marked as touched.
    pub fn materialize(
        &mut self,
        baseline: &LotBaseline,
        quantity: u32,
        location: LocationId,
    ) -> LotId {
        let id = LotId::new(self.next_id);
        self.next_id += 1;

        let code = self.codes.next(&baseline.key);
        let lot = LotInstance::from_baseline(baseline, id, code, quantity, location);

        let index = self.lots.len();
        self.by_group
            .entry(baseline.key.clone())
            .or_default()
            .push(index);
        self.by_id.insert(id, index);
        self.touched.insert(baseline.key.clone());
        self.lots.push(lot);

        tracing::trace!(lot = %id, group = %baseline.key, quantity, %location, "Materialized lot");
        id
    }

    /// Returns a lot by id
    #[must_use]
    pub fn get(&self, id: LotId) -> Option<&LotInstance> {
        self.by_id.get(&id).map(|&index| &self.lots[index])
    }

    /// Returns a lot by id for mutation
    pub fn get_mut(&mut self, id: LotId) -> Option<&mut LotInstance> {
        self.by_id.get(&id).map(|&index| &mut self.lots[index])
    }

    /// Whether any lot has been materialized for `key`
    #[must_use]
    pub fn is_touched(&self, key: &LotGroupKey) -> bool {
        self.touched.contains(key)
    }

    /// Sum of the quantities of every lot in `key`
    #[must_use]
    pub fn group_quantity(&self, key: &LotGroupKey) -> u64 {
        self.group(key).map(|lot| u64::from(lot.quantity)).sum()
    }

    /// Lots in creation order
    #[must_use]
    pub fn lots(&self) -> &[LotInstance] {
        &self.lots
    }

    /// Number of lots
    #[must_use]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Returns `true` if no lot has been materialized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Hands the lots over, in creation order
    #[must_use]
    pub fn into_lots(self) -> Vec<LotInstance> {
        self.lots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_ledger_testing::helpers::baseline;

    fn ids<'a>(lots: impl Iterator<Item = &'a LotInstance>) -> Vec<u64> {
        lots.map(|lot| lot.id.value()).collect()
    }

    #[test]
    fn materialize_assigns_ids_and_codes() {
        let mut pool = LotPool::new(LotId::new(100));
        let base = baseline("11663", 1, 44, 1);

        let first = pool.materialize(&base, 44, LocationId::new(1));
        let second = pool.materialize(&base, 2, LocationId::new(5));

        assert_eq!(first, LotId::new(100));
        assert_eq!(second, LotId::new(101));
        assert_eq!(pool.get(first).map(|l| l.code.as_str()), Some("1000"));
        assert_eq!(pool.get(second).map(|l| l.code.as_str()), Some("1001"));
        assert!(pool.is_touched(&base.key));
        assert_eq!(pool.group_quantity(&base.key), 46);
    }

    #[test]
    fn candidates_respect_location_quantity_and_order() {
        let mut pool = LotPool::new(LotId::new(1));
        let base = baseline("4084", 0, 0, 1);
        let here = LocationId::new(1);
        let there = LocationId::new(2);

        let small = pool.materialize(&base, 1, here);
        let elsewhere = pool.materialize(&base, 9, there);
        let large = pool.materialize(&base, 5, here);
        let empty = pool.materialize(&base, 0, here);

        assert_eq!(
            ids(pool.candidates(&base.key, here, 2)),
            vec![large.value()]
        );
        assert_eq!(
            ids(pool.candidates(&base.key, here, 1)),
            vec![small.value(), large.value()]
        );
        assert_eq!(
            ids(pool.candidates_at_location(&base.key, here)),
            vec![small.value(), large.value(), empty.value()]
        );
        assert_eq!(
            ids(pool.candidates_at_location(&base.key, there)),
            vec![elsewhere.value()]
        );
    }

    #[test]
    fn untouched_group_has_no_candidates() {
        let pool = LotPool::new(LotId::new(1));
        let key = LotGroupKey::new("36762", 0);
        assert!(!pool.is_touched(&key));
        assert_eq!(pool.candidates_at_location(&key, LocationId::new(1)).count(), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut pool = LotPool::new(LotId::new(1));
        let base = baseline("3", 0, 4, 1);
        let id = pool.materialize(&base, 4, LocationId::new(1));

        if let Some(lot) = pool.get_mut(id) {
            lot.quantity = 1;
        }
        assert_eq!(pool.lots()[0].quantity, 1);
        assert_eq!(pool.into_lots().len(), 1);
    }
}
