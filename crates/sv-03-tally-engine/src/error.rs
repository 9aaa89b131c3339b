//! Error types for the Tally Engine subsystem

use shared_types::StoreError;
use sv_01_bloom_filter::FilterError;
use sv_02_report_ledger::LedgerError;
use thiserror::Error;

/// Errors that abort a tally or merge run.
///
/// Per-record problems never surface here; they are counted in the run
/// report and the record is cleared anyway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// Snapshot load/persist or queue access failed. Nothing was deleted
    /// unless the snapshot had already been persisted.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger scan or clear failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
