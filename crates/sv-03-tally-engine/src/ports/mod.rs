//! Ports Layer
//!
//! - Driving Ports (inbound): `TallyApi`
//! - Driven Ports (outbound): the report ledger and the key-value store

pub mod inbound;

pub use inbound::TallyApi;
pub use shared_types::KeyValueStore;
pub use sv_02_report_ledger::ReportLedgerApi;
