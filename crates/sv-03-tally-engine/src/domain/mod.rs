//! Domain Layer
//!
//! Tally configuration, run reports and publication payloads. No I/O.

pub mod config;
pub mod publication;
pub mod report;

pub use config::{TallyConfig, DEFAULT_REPORT_THRESHOLD, DEFAULT_SNAPSHOT_KEY};
pub use publication::{PublicationConfig, PublicationPayload, INITIAL_MESSAGE, UPDATE_MESSAGE};
pub use report::{MergeReport, TallyReport};
