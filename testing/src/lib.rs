//! # Specimen Ledger Testing
//!
//! Testing utilities and helpers for the specimen ledger replay.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - Fixture builders for baselines and ledger events
//! - Property-based testing strategies
//! - The `ReducerTest` Given-When-Then harness
//!
//! ## Example
//!
//! ```ignore
//! use specimen_ledger_testing::helpers::{baseline, day, transfer};
//!
//! let registry = BaselineRegistry::from_baselines([baseline("B", 0, 10, 1)])?;
//! let output = ReplayEngine::default().run(
//!     ReplayInput::new(registry, vec![transfer("B", 0, day(1), 1, 2, 4)], vec![]),
//!     Arc::new(test_clock()),
//! )?;
//! assert_eq!(output.lots.len(), 2);
//! ```

use chrono::{DateTime, Utc};
use specimen_ledger_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use specimen_ledger_core::environment::{AccessionResolver, LocationResolver};
    use specimen_ledger_core::types::{AccessionId, LocationId};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making run reports reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use specimen_ledger_testing::mocks::FixedClock;
    /// use specimen_ledger_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Resolves location codes of the form `L<n>` to `LocationId(n)`.
    ///
    /// Anything else is unknown, which lets tests exercise the unresolved-code paths
    /// without building a lookup table.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NumberedLocations;

    impl LocationResolver for NumberedLocations {
        fn resolve_location(&self, code: &str) -> Option<LocationId> {
            code.strip_prefix('L')?.parse().ok().map(LocationId::new)
        }
    }

    /// Resolves every accession code made of digits to the same numeric id.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NumericAccessions;

    impl AccessionResolver for NumericAccessions {
        fn resolve_accession(&self, code: &str) -> Option<AccessionId> {
            code.parse().ok().map(AccessionId::new)
        }
    }
}

/// Fixture builders for baselines and ledger events
///
/// Locations are given as bare numbers and accession ids default to zero so scenario
/// tests stay readable.
pub mod helpers {
    use chrono::NaiveDate;
    use specimen_ledger_core::event::{DisposalEvent, TransferEvent};
    use specimen_ledger_core::types::{AccessionId, LocationId, LotBaseline, LotGroupKey};

    /// A day in the fixture year (2009-01-01 plus `offset` days)
    ///
    /// # Panics
    ///
    /// Panics if the offset leaves the representable date range.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2009, 1, 1)
            .and_then(|start| start.checked_add_days(chrono::Days::new(u64::from(offset))))
            .expect("fixture day should be representable")
    }

    /// Baseline for `accession/sub_lot` received on `day(0)`
    #[must_use]
    pub fn baseline(accession: &str, sub_lot: u32, quantity: u32, location: u64) -> LotBaseline {
        LotBaseline {
            key: LotGroupKey::new(accession, sub_lot),
            accession_id: AccessionId::new(0),
            quantity,
            location_id: LocationId::new(location),
            received: day(0),
        }
    }

    /// Transfer without remarks
    #[must_use]
    pub fn transfer(
        accession: &str,
        sub_lot: u32,
        date: NaiveDate,
        from: u64,
        to: u64,
        quantity: u32,
    ) -> TransferEvent {
        TransferEvent {
            key: LotGroupKey::new(accession, sub_lot),
            date,
            from: LocationId::new(from),
            to: LocationId::new(to),
            quantity,
            remarks: String::new(),
        }
    }

    /// Disposal with reason `DEAD` and no remarks
    #[must_use]
    pub fn disposal(
        accession: &str,
        sub_lot: u32,
        date: NaiveDate,
        from: u64,
        quantity: u32,
    ) -> DisposalEvent {
        DisposalEvent {
            key: LotGroupKey::new(accession, sub_lot),
            date,
            from: LocationId::new(from),
            quantity,
            reason: "DEAD".to_string(),
            remarks: String::new(),
        }
    }

    /// Installs a test-friendly tracing subscriber (idempotent)
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// Strategies generate small, dense scenarios: a handful of groups and locations so
/// that events collide on lots, dates and locations often enough to exercise splits,
/// placeholders and multi-lot drains.
pub mod properties {
    use super::helpers::{baseline, day, disposal, transfer};
    use proptest::prelude::*;
    use specimen_ledger_core::event::{DisposalEvent, TransferEvent};
    use specimen_ledger_core::types::{LotBaseline, LotGroupKey};

    /// Number of distinct locations used by generated scenarios
    pub const LOCATIONS: u64 = 4;

    /// A generated replay input
    #[derive(Debug, Clone)]
    pub struct Scenario {
        /// One baseline per group, accession codes `"0"`, `"1"`, ...
        pub baselines: Vec<LotBaseline>,
        /// Transfer stream
        pub transfers: Vec<TransferEvent>,
        /// Disposal stream
        pub disposals: Vec<DisposalEvent>,
    }

    fn group_baselines(groups: usize) -> impl Strategy<Value = Vec<LotBaseline>> {
        prop::collection::vec((0..3u32, 0..40u32, 1..=LOCATIONS), groups).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(index, (sub_lot, quantity, location))| {
                    baseline(&index.to_string(), sub_lot, quantity, location)
                })
                .collect()
        })
    }

    fn group_keys(baselines: &[LotBaseline]) -> Vec<LotGroupKey> {
        baselines.iter().map(|b| b.key.clone()).collect()
    }

    fn transfers_for(
        keys: Vec<LotGroupKey>,
        max: usize,
    ) -> impl Strategy<Value = Vec<TransferEvent>> {
        prop::collection::vec(
            (
                0..keys.len(),
                0..30u32,
                1..=LOCATIONS,
                1..=LOCATIONS,
                1..12u32,
            ),
            0..max,
        )
        .prop_map(move |specs| {
            specs
                .into_iter()
                .map(|(group, offset, from, to, quantity)| {
                    let key = &keys[group];
                    transfer(&key.accession, key.sub_lot, day(offset), from, to, quantity)
                })
                .collect()
        })
    }

    fn disposals_for(
        keys: Vec<LotGroupKey>,
        max: usize,
    ) -> impl Strategy<Value = Vec<DisposalEvent>> {
        prop::collection::vec((0..keys.len(), 0..30u32, 1..=LOCATIONS, 1..12u32), 0..max)
            .prop_map(move |specs| {
                specs
                    .into_iter()
                    .map(|(group, offset, from, quantity)| {
                        let key = &keys[group];
                        disposal(&key.accession, key.sub_lot, day(offset), from, quantity)
                    })
                    .collect()
            })
    }

    /// Scenario with transfers and disposals
    pub fn arb_scenario() -> impl Strategy<Value = Scenario> {
        (1..5usize)
            .prop_flat_map(group_baselines)
            .prop_flat_map(|baselines| {
                let transfers = transfers_for(group_keys(&baselines), 24);
                let disposals = disposals_for(group_keys(&baselines), 12);
                (Just(baselines), transfers, disposals)
            })
            .prop_map(|(baselines, transfers, disposals)| Scenario {
                baselines,
                transfers,
                disposals,
            })
    }

    /// Scenario with transfers only (quantity is conserved per group)
    pub fn arb_transfer_scenario() -> impl Strategy<Value = Scenario> {
        (1..5usize)
            .prop_flat_map(group_baselines)
            .prop_flat_map(|baselines| {
                let transfers = transfers_for(group_keys(&baselines), 24);
                (Just(baselines), transfers)
            })
            .prop_map(|(baselines, transfers)| Scenario {
                baselines,
                transfers,
                disposals: Vec::new(),
            })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
