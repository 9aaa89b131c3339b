//! Domain Layer
//!
//! Ledger records, key scheme, configuration and upload-window policy.
//! No I/O.

pub mod config;
pub mod entities;
pub mod window;

pub use config::{LedgerConfig, UsageConfig, DEFAULT_RECORD_TTL};
pub use entities::{BatchOutcome, IngestOutcome, LedgerEntry, LedgerPage, UsageReport};
pub use window::UploadWindow;
