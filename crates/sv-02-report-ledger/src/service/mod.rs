//! Service Layer
//!
//! Ledger services wired to the key-value store and rate limiter ports.

pub mod report_ledger;
pub mod usage_ledger;

pub use report_ledger::{Clock, ReportLedger};
pub use usage_ledger::UsageLedger;
