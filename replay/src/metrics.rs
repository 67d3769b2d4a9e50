//! Replay metrics.
//!
//! Counters are recorded through the `metrics` facade; installing a recorder is left to
//! the embedding application.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ledger_events_total{kind,outcome}` - Events folded, by kind and outcome (applied, skipped)
//! - `ledger_lots_materialized_total{reason}` - Lots created, by reason
//! - `ledger_shortfall_units_total` - Disposal quantity that could not be drawn from any lot

use metrics::describe_counter;
use specimen_ledger_core::{EventKind, Materialization};

/// Register all replay metric descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_replay_metrics() {
    describe_counter!(
        "ledger_events_total",
        "Total number of ledger events folded, by kind and outcome (applied, skipped)"
    );
    describe_counter!(
        "ledger_lots_materialized_total",
        "Total number of lot instances created, by reason (opening, split, placeholder, finalized)"
    );
    describe_counter!(
        "ledger_shortfall_units_total",
        "Total disposal quantity left unresolved after draining every candidate lot"
    );

    tracing::info!("Replay metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record an applied event.
pub fn record_event_applied(kind: EventKind) {
    metrics::counter!("ledger_events_total", "kind" => kind.as_str(), "outcome" => "applied")
        .increment(1);
}

/// Record a skipped event.
pub fn record_event_skipped(kind: EventKind) {
    metrics::counter!("ledger_events_total", "kind" => kind.as_str(), "outcome" => "skipped")
        .increment(1);
}

/// Record a materialized lot.
pub fn record_lot_materialized(reason: Materialization) {
    metrics::counter!("ledger_lots_materialized_total", "reason" => reason.as_str()).increment(1);
}

/// Record a disposal shortfall.
///
/// # Arguments
///
/// * `unresolved` - Quantity that could not be drawn from any lot
pub fn record_shortfall(unresolved: u32) {
    metrics::counter!("ledger_shortfall_units_total").increment(u64::from(unresolved));
    tracing::debug!(unresolved, "Recorded shortfall metric");
}
