//! Ports Layer
//!
//! - Driving Ports (inbound): ledger APIs
//! - Driven Ports (outbound): the key-value store and rate limiter from
//!   `shared-types`

pub mod inbound;

pub use inbound::{ReportLedgerApi, UsageLedgerApi};
pub use shared_types::{KeyValueStore, RateLimiter};
