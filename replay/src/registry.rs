//! Lot baseline registry.
//!
//! One immutable baseline per lot group, kept in load order so that anything iterating
//! the registry (the finalizer in particular) is deterministic.

use specimen_ledger_core::{LotBaseline, LotGroupKey, ReplayError};
use std::collections::HashMap;

/// Read-only source of truth for cloning new lot instances.
#[derive(Debug, Clone, Default)]
pub struct BaselineRegistry {
    baselines: Vec<LotBaseline>,
    index: HashMap<LotGroupKey, usize>,
}

impl BaselineRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from baselines in load order.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::DuplicateBaseline` if two baselines share a group key.
    pub fn from_baselines(
        baselines: impl IntoIterator<Item = LotBaseline>,
    ) -> Result<Self, ReplayError> {
        let mut registry = Self::new();
        for baseline in baselines {
            registry.insert(baseline)?;
        }
        Ok(registry)
    }

    /// Registers a baseline.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::DuplicateBaseline` if the group already has a baseline.
    pub fn insert(&mut self, baseline: LotBaseline) -> Result<(), ReplayError> {
        if self.index.contains_key(&baseline.key) {
            return Err(ReplayError::DuplicateBaseline(baseline.key));
        }
        self.index.insert(baseline.key.clone(), self.baselines.len());
        self.baselines.push(baseline);
        Ok(())
    }

    /// Returns the baseline for a group
    #[must_use]
    pub fn get(&self, key: &LotGroupKey) -> Option<&LotBaseline> {
        self.index.get(key).map(|&i| &self.baselines[i])
    }

    /// Returns the baseline for a group, failing on unknown groups.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::UnknownLotGroup` if no baseline exists for `key`.
    pub fn require(&self, key: &LotGroupKey) -> Result<&LotBaseline, ReplayError> {
        self.get(key)
            .ok_or_else(|| ReplayError::UnknownLotGroup(key.clone()))
    }

    /// Iterates baselines in load order
    pub fn iter(&self) -> impl Iterator<Item = &LotBaseline> {
        self.baselines.iter()
    }

    /// Number of baselines
    #[must_use]
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    /// Returns `true` if no baselines are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
