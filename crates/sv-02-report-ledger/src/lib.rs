//! # Report Ledger Subsystem
//!
//! Per-target sets of distinct reporters, rate limited per reporter and
//! expired after a week without reports.
//!
//! ## Architecture
//!
//! - `domain/`: records, key scheme, upload windows
//! - `ports/`: ledger APIs (inbound); store and limiter (outbound)
//! - `service/`: `ReportLedger` and `UsageLedger`
//!
//! ## Invariants
//!
//! - A reporter counts at most once per target
//! - A refused report (rate limit, window, malformed input) writes nothing
//! - Every accepted report resets the record TTL to its full value

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{
    BatchOutcome, IngestOutcome, LedgerConfig, LedgerEntry, LedgerPage, UploadWindow,
    UsageConfig, UsageReport,
};
pub use error::LedgerError;
pub use ports::{ReportLedgerApi, UsageLedgerApi};
pub use service::{Clock, ReportLedger, UsageLedger};
