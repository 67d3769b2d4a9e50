//! Feed ingest.
//!
//! Adapts the raw tabular feeds (location and accession tables, baseline rows, transfer
//! and disposal rows) into typed replay input. Raw rows carry location *codes*, signed
//! quantities and a soft-delete flag; this module resolves codes to ids, drops deleted
//! rows and sets malformed event rows aside.

use crate::config::ReplayConfig;
use crate::engine::ReplayInput;
use crate::error::IngestError;
use crate::registry::BaselineRegistry;
use serde::{Deserialize, Serialize};
use specimen_ledger_core::{
    AccessionId, AccessionResolver, DisposalEvent, EventKind, LocationId, LocationResolver,
    LotBaseline, LotGroupKey, NaiveDate, ReplayError, SkippedEvent, TransferEvent,
};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

// ============================================================================
// Raw rows
// ============================================================================

/// A row of the location table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Location id
    pub id: u64,
    /// Location code used by the other feeds
    pub code: String,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

/// A row of the accession table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessionRow {
    /// Accession id
    pub id: u64,
    /// Accession code used by the other feeds
    pub code: String,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

/// A received lot group as recorded in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRow {
    /// Accession code
    pub accession: String,
    /// Sub-lot number, 0 when absent
    #[serde(default)]
    pub sub_lot: u32,
    /// Quantity received; negative values are rejected
    pub quantity: i64,
    /// Initial location code; missing means the unknown location
    #[serde(default)]
    pub location: Option<String>,
    /// Date the group was received
    pub received: NaiveDate,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

/// A location transfer as recorded in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRow {
    /// Accession code
    pub accession: String,
    /// Sub-lot number, 0 when absent
    #[serde(default)]
    pub sub_lot: u32,
    /// Transfer date
    pub date: NaiveDate,
    /// Source location code
    #[serde(default)]
    pub from: Option<String>,
    /// Destination location code
    #[serde(default)]
    pub to: Option<String>,
    /// Quantity moved
    pub quantity: i64,
    /// Free-text remarks
    #[serde(default)]
    pub remarks: Option<String>,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

/// A disposal as recorded in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalRow {
    /// Accession code
    pub accession: String,
    /// Sub-lot number, 0 when absent
    #[serde(default)]
    pub sub_lot: u32,
    /// Disposal date
    pub date: NaiveDate,
    /// Location code the plants were removed from
    #[serde(default)]
    pub from: Option<String>,
    /// Quantity removed
    pub quantity: i64,
    /// Disposal reason code
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text remarks
    #[serde(default)]
    pub remarks: Option<String>,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

/// Every feed a replay needs, as one JSON document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedBundle {
    /// Location table
    #[serde(default)]
    pub locations: Vec<LocationRow>,
    /// Accession table
    #[serde(default)]
    pub accessions: Vec<AccessionRow>,
    /// Lot group baselines
    #[serde(default)]
    pub baselines: Vec<BaselineRow>,
    /// Transfer ledger
    #[serde(default)]
    pub transfers: Vec<TransferRow>,
    /// Disposal ledger
    #[serde(default)]
    pub disposals: Vec<DisposalRow>,
}

// ============================================================================
// Resolvers
// ============================================================================

/// Location codes resolved from the location table.
#[derive(Clone, Debug, Default)]
pub struct LocationDirectory {
    by_code: HashMap<String, LocationId>,
}

impl LocationDirectory {
    /// Builds the directory, ignoring deleted rows
    #[must_use]
    pub fn from_rows(rows: &[LocationRow]) -> Self {
        let by_code = rows
            .iter()
            .filter(|row| !row.deleted)
            .map(|row| (row.code.trim().to_string(), LocationId::new(row.id)))
            .collect();
        Self { by_code }
    }

    /// Number of live locations
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Returns `true` if no live location was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl LocationResolver for LocationDirectory {
    fn resolve_location(&self, code: &str) -> Option<LocationId> {
        self.by_code.get(code.trim()).copied()
    }
}

/// Accession codes resolved from the accession table.
#[derive(Clone, Debug, Default)]
pub struct AccessionDirectory {
    by_code: HashMap<String, AccessionId>,
}

impl AccessionDirectory {
    /// Builds the directory, ignoring deleted rows
    #[must_use]
    pub fn from_rows(rows: &[AccessionRow]) -> Self {
        let by_code = rows
            .iter()
            .filter(|row| !row.deleted)
            .map(|row| (row.code.trim().to_string(), AccessionId::new(row.id)))
            .collect();
        Self { by_code }
    }
}

impl AccessionResolver for AccessionDirectory {
    fn resolve_accession(&self, code: &str) -> Option<AccessionId> {
        self.by_code.get(code.trim()).copied()
    }
}

// ============================================================================
// Adapters
// ============================================================================

fn group_key(accession: &str, sub_lot: u32) -> LotGroupKey {
    LotGroupKey::new(accession.trim(), sub_lot)
}

/// Resolves baseline rows into a registry, in feed order.
///
/// # Errors
///
/// Fails on an unknown accession, an unresolvable location (including the unknown
/// location itself), a negative quantity, or a duplicate group.
pub fn load_baselines(
    rows: Vec<BaselineRow>,
    locations: &impl LocationResolver,
    accessions: &impl AccessionResolver,
    unknown_location: &str,
) -> Result<BaselineRegistry, ReplayError> {
    let mut registry = BaselineRegistry::new();
    for row in rows.into_iter().filter(|row| !row.deleted) {
        let key = group_key(&row.accession, row.sub_lot);

        let accession_id = accessions.resolve_accession(&row.accession).ok_or_else(|| {
            ReplayError::UnknownAccession {
                key: key.clone(),
                accession: row.accession.clone(),
            }
        })?;

        let quantity =
            u32::try_from(row.quantity).map_err(|_| ReplayError::InvalidBaselineQuantity {
                key: key.clone(),
                quantity: row.quantity,
            })?;

        let location_code = row
            .location
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(unknown_location);
        let location_id = locations.resolve_location(location_code).ok_or_else(|| {
            ReplayError::UnresolvedBaselineLocation {
                key: key.clone(),
                location: location_code.to_string(),
            }
        })?;

        registry.insert(LotBaseline {
            key,
            accession_id,
            quantity,
            location_id,
            received: row.received,
        })?;
    }
    tracing::info!(baselines = registry.len(), "Loaded baselines");
    Ok(registry)
}

/// Validates an event row's quantity and location codes, or says why it is malformed
fn resolve_event_fields(
    quantity: i64,
    codes: &[(&str, Option<&str>)],
    locations: &impl LocationResolver,
) -> Result<(u32, Vec<LocationId>), String> {
    let quantity = match u32::try_from(quantity) {
        Ok(0) | Err(_) => return Err(format!("quantity must be positive, got {quantity}")),
        Ok(quantity) => quantity,
    };
    let mut resolved = Vec::with_capacity(codes.len());
    for (field, code) in codes {
        let code = code.map(str::trim).filter(|code| !code.is_empty());
        let Some(code) = code else {
            return Err(format!("missing {field} location"));
        };
        let Some(id) = locations.resolve_location(code) else {
            return Err(format!("unknown {field} location '{code}'"));
        };
        resolved.push(id);
    }
    Ok((quantity, resolved))
}

fn skip(kind: EventKind, key: LotGroupKey, date: NaiveDate, reason: String) -> SkippedEvent {
    tracing::warn!(%kind, group = %key, %date, %reason, "Skipping malformed event row");
    SkippedEvent {
        kind,
        key,
        date,
        reason,
    }
}

/// Resolves transfer rows, setting malformed rows aside.
pub fn resolve_transfers(
    rows: Vec<TransferRow>,
    locations: &impl LocationResolver,
) -> (Vec<TransferEvent>, Vec<SkippedEvent>) {
    let mut events = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for row in rows.into_iter().filter(|row| !row.deleted) {
        let key = group_key(&row.accession, row.sub_lot);
        let codes = [("from", row.from.as_deref()), ("to", row.to.as_deref())];
        match resolve_event_fields(row.quantity, &codes, locations) {
            Ok((quantity, resolved)) => events.push(TransferEvent {
                key,
                date: row.date,
                from: resolved[0],
                to: resolved[1],
                quantity,
                remarks: row.remarks.unwrap_or_default(),
            }),
            Err(reason) => skipped.push(skip(EventKind::Transfer, key, row.date, reason)),
        }
    }
    (events, skipped)
}

/// Resolves disposal rows, setting malformed rows aside.
pub fn resolve_disposals(
    rows: Vec<DisposalRow>,
    locations: &impl LocationResolver,
) -> (Vec<DisposalEvent>, Vec<SkippedEvent>) {
    let mut events = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for row in rows.into_iter().filter(|row| !row.deleted) {
        let key = group_key(&row.accession, row.sub_lot);
        let codes = [("from", row.from.as_deref())];
        match resolve_event_fields(row.quantity, &codes, locations) {
            Ok((quantity, resolved)) => events.push(DisposalEvent {
                key,
                date: row.date,
                from: resolved[0],
                quantity,
                reason: row.reason.unwrap_or_default(),
                remarks: row.remarks.unwrap_or_default(),
            }),
            Err(reason) => skipped.push(skip(EventKind::Disposal, key, row.date, reason)),
        }
    }
    (events, skipped)
}

impl FeedBundle {
    /// Reads a bundle from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Io` if the file cannot be opened and `IngestError::Json` if
    /// it does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Reads a bundle from any JSON source.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Json` if the input does not parse.
    pub fn from_reader(reader: impl Read) -> Result<Self, IngestError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Resolves the bundle into replay input.
    ///
    /// # Errors
    ///
    /// Returns a `ReplayError` if a baseline cannot be loaded.
    pub fn into_input(self, config: &ReplayConfig) -> Result<ReplayInput, ReplayError> {
        let locations = LocationDirectory::from_rows(&self.locations);
        let accessions = AccessionDirectory::from_rows(&self.accessions);
        tracing::debug!(locations = locations.len(), "Built location directory");

        let registry = load_baselines(
            self.baselines,
            &locations,
            &accessions,
            &config.unknown_location,
        )?;
        let (transfers, mut skipped) = resolve_transfers(self.transfers, &locations);
        let (disposals, skipped_disposals) = resolve_disposals(self.disposals, &locations);
        skipped.extend(skipped_disposals);

        tracing::info!(
            transfers = transfers.len(),
            disposals = disposals.len(),
            skipped = skipped.len(),
            "Resolved event feeds"
        );
        Ok(ReplayInput::new(registry, transfers, disposals).with_skipped(skipped))
    }
}
