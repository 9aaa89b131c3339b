//! Error types for the Report Ledger subsystem

use shared_types::StoreError;
use thiserror::Error;

/// Errors that can occur on the ingestion path or while scanning the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Reporter exhausted its window; retry later.
    #[error("Rate limited: reporter {reporter_id} exhausted its window")]
    RateLimited { reporter_id: String },

    /// Transient store failure; retry with backoff.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed identifier {identifier:?}: {reason}")]
    MalformedIdentifier {
        identifier: String,
        reason: &'static str,
    },

    #[error("Invalid reporter identity: {0}")]
    InvalidReporter(&'static str),

    #[error("Uploads are not accepted at {at}")]
    OutsideUploadWindow { at: String },

    #[error("Invalid usage report: {0}")]
    InvalidUsageReport(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}
