//! # Integration Flows
//!
//! - `filter_properties`: filter guarantees over random identifiers
//! - `ingest_flows`: ledger ingestion, dedup and rate limiting
//! - `tally_flows`: end-to-end promotion, discard and failure handling
//! - `runtime_flows`: scheduler, lease and publication together

pub mod fixtures;
pub mod filter_properties;
pub mod ingest_flows;
pub mod runtime_flows;
pub mod tally_flows;
