//! # Specimen Ledger Replay
//!
//! Reconstructs lot-level inventory history from two ledgers: location transfers and
//! disposals. The ledgers are merged into one chronological sequence and replayed against
//! a pool of lots seeded from accession baselines. Partial transfers split lots, missing
//! history is filled with placeholder lots, and every outcome is written to an audit
//! trail of change and note rows.
//!
//! ## Pipeline
//!
//! 1. [`ingest`] resolves raw feed rows into baselines and typed events
//! 2. [`merge`] orders both event streams
//! 3. [`reducer`] folds each event into the [`pool`]
//! 4. [`audit`] collects the emitted change and note rows
//! 5. [`finalize`] creates lots for groups no event touched
//!
//! [`engine::ReplayEngine`] runs the whole pipeline.
//!
//! ## Example
//!
//! ```
//! use specimen_ledger_core::{LocationId, LotBaseline, LotGroupKey, NaiveDate, AccessionId, SystemClock};
//! use specimen_ledger_replay::{BaselineRegistry, ReplayEngine, ReplayInput};
//! use std::sync::Arc;
//!
//! let received = NaiveDate::from_ymd_opt(2009, 1, 1).unwrap();
//! let registry = BaselineRegistry::from_baselines([LotBaseline {
//!     key: LotGroupKey::new("36762", 0),
//!     accession_id: AccessionId::new(1),
//!     quantity: 3,
//!     location_id: LocationId::new(5),
//!     received,
//! }])
//! .unwrap();
//!
//! let output = ReplayEngine::default()
//!     .run(ReplayInput::new(registry, vec![], vec![]), Arc::new(SystemClock))
//!     .unwrap();
//! assert_eq!(output.lots.len(), 1);
//! assert_eq!(output.lots[0].code, "0000");
//! ```

pub mod audit;
pub mod codes;
pub mod config;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod ingest;
pub mod merge;
pub mod metrics;
pub mod pool;
pub mod reducer;
pub mod registry;

pub use audit::AuditTrail;
pub use codes::CodeGenerator;
pub use config::ReplayConfig;
pub use engine::{Anomalies, ReplayEngine, ReplayInput, ReplayOutput, RunReport};
pub use error::IngestError;
pub use ingest::{AccessionDirectory, FeedBundle, LocationDirectory};
pub use merge::merge_events;
pub use pool::LotPool;
pub use reducer::{LedgerReducer, NoteCategories, ReplayEnvironment, ReplayState};
pub use registry::BaselineRegistry;
