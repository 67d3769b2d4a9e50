//! # Specimen Ledger Core
//!
//! Core traits and types for reconstructing historical lot inventory.
//!
//! Two independently maintained logs (location transfers and disposals) are replayed in
//! one chronological order against a pool of lots derived from accession baselines. This
//! crate holds the vocabulary every stage shares; the replay engine itself lives in
//! `specimen-ledger-replay`.
//!
//! ## Core Concepts
//!
//! - **State**: The mutable working set being reconstructed (the lot pool)
//! - **Action**: One ledger event (transfer or disposal)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`, fallible only on
//!   referential-integrity violations
//! - **Effect**: Audit output described as values (change rows, note rows, anomalies)
//! - **Environment**: Injected read-only dependencies (baselines, clock, resolvers)
//!
//! ## Example
//!
//! ```ignore
//! use specimen_ledger_core::*;
//!
//! impl Reducer for LedgerReducer {
//!     type State = ReplayState;
//!     type Action = LedgerEvent;
//!     type Environment = ReplayEnvironment;
//!     type Error = ReplayError;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ReplayState,
//!         action: LedgerEvent,
//!         env: &ReplayEnvironment,
//!     ) -> Result<Effects, ReplayError> {
//!         // Pool mutation goes here
//!         Ok(SmallVec::new())
//!     }
//! }
//! ```

pub mod error;
pub mod event;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub use error::ReplayError;
pub use event::{DisposalEvent, EventKind, LedgerEvent, TransferEvent};
pub use types::{
    AccessionId, ChangeRecord, LocationId, LotBaseline, LotGroupKey, LotId, LotInstance, NoteId,
    NoteRecord,
};

/// Reducer module - The core trait for replay logic
///
/// Reducers are deterministic functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all business logic and never perform I/O.
pub mod reducer {
    use super::effect::Effects;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer mutates
    /// - `Action`: The input this reducer folds
    /// - `Environment`: The injected dependencies this reducer reads
    /// - `Error`: Fatal conditions that abort the fold
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Errors that abort processing
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effect descriptions to be applied by the caller, in emission order
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action cannot be applied at all. The state
        /// must be left unchanged in that case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects, Self::Error>;
    }
}

/// Effect module - Descriptions of replay output
///
/// Effects are values, not execution. The reducer returns them and the engine applies
/// them to the audit trail and the run report in order.
pub mod effect {
    use crate::event::EventKind;
    use crate::types::{ChangeRecord, LocationId, LotGroupKey, LotId, NoteRecord};
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};
    use smallvec::SmallVec;

    /// Effects returned by a single reduction
    pub type Effects = SmallVec<[Effect; 4]>;

    /// Why a lot instance was created.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Materialization {
        /// Baseline lot opened on the first event touching its group
        Opening,
        /// Carved out of an existing lot by a partial transfer
        Split,
        /// Conjured because no modelled lot could satisfy an event
        Placeholder,
        /// Created after replay for a group no event touched
        Finalized,
    }

    impl Materialization {
        /// Stable lowercase label used in logs and metrics
        #[must_use]
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Opening => "opening",
                Self::Split => "split",
                Self::Placeholder => "placeholder",
                Self::Finalized => "finalized",
            }
        }
    }

    /// A disposal that could not be fully satisfied from modelled quantity.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Shortfall {
        /// Group of the disposal
        pub key: LotGroupKey,
        /// Date of the disposal
        pub date: NaiveDate,
        /// Location the disposal drained
        pub location_id: LocationId,
        /// Quantity the event asked for
        pub requested: u32,
        /// Quantity left unresolved after draining every candidate
        pub unresolved: u32,
    }

    /// An event that was skipped instead of applied.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SkippedEvent {
        /// Kind of the skipped event
        pub kind: EventKind,
        /// Group the event referred to
        pub key: LotGroupKey,
        /// Date of the event
        pub date: NaiveDate,
        /// Why it was skipped
        pub reason: String,
    }

    /// Effect type - describes output produced by a reduction
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect {
        /// A lot instance was added to the pool
        Materialized {
            /// New lot
            lot_id: LotId,
            /// Its group
            key: LotGroupKey,
            /// Why it was created
            reason: Materialization,
        },

        /// Append a note row
        RecordNote(NoteRecord),

        /// Append a change row
        RecordChange(ChangeRecord),

        /// Report an under-supplied disposal
        Shortfall(Shortfall),

        /// Report a skipped event
        Skipped(SkippedEvent),
    }

    impl Effect {
        /// Returns the change record carried by this effect, if any
        #[must_use]
        pub const fn as_change(&self) -> Option<&ChangeRecord> {
            match self {
                Self::RecordChange(change) => Some(change),
                _ => None,
            }
        }

        /// Returns the note record carried by this effect, if any
        #[must_use]
        pub const fn as_note(&self) -> Option<&NoteRecord> {
            match self {
                Self::RecordNote(note) => Some(note),
                _ => None,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// Everything the replay reads but does not own sits behind a trait so tests can
/// substitute fixed implementations.
pub mod environment {
    use crate::types::{AccessionId, LocationId};
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Resolves location codes found in the feeds to location ids.
    pub trait LocationResolver: Send + Sync {
        /// Returns the id for `code`, or `None` if the code is unknown
        fn resolve_location(&self, code: &str) -> Option<LocationId>;
    }

    /// Resolves accession codes found in the feeds to accession ids.
    pub trait AccessionResolver: Send + Sync {
        /// Returns the id for `code`, or `None` if the code is unknown
        fn resolve_accession(&self, code: &str) -> Option<AccessionId>;
    }
}

pub use effect::{Effect, Effects, Materialization, Shortfall, SkippedEvent};
pub use environment::{AccessionResolver, Clock, LocationResolver, SystemClock};
pub use reducer::Reducer;
