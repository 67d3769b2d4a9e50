//! Errors raised while loading feeds and running a replay.

use specimen_ledger_core::ReplayError;
use thiserror::Error;

/// Errors surfaced by feed ingest and the batch binary.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Reading a feed file failed
    #[error("Failed to read feed {path}: {source}")]
    Io {
        /// File being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A feed was not valid JSON for its row types
    #[error("Failed to parse feed: {0}")]
    Json(#[from] serde_json::Error),

    /// Baselines or events violated referential integrity
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_ledger_core::LotGroupKey;

    #[test]
    fn replay_errors_pass_through() {
        let error = IngestError::from(ReplayError::UnknownLotGroup(LotGroupKey::new("5", 0)));
        assert_eq!(error.to_string(), "Event references unknown lot group 5/0");
    }

    #[test]
    fn io_error_names_path() {
        let error = IngestError::Io {
            path: "feeds/bundle.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(error.to_string().contains("feeds/bundle.json"));
    }
}
