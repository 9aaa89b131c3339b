//! Inbound Ports (Driving Ports)
//!
//! API the scheduler uses to drive tally and merge runs.

use async_trait::async_trait;
use sv_01_bloom_filter::BloomFilterSnapshot;

use crate::domain::{MergeReport, TallyReport};
use crate::error::TallyError;

/// Tally engine API (Driving Port)
///
/// Callers must not run `run` or `merge_uploads` concurrently with either
/// of them on the same snapshot; both read, modify and write it back.
#[async_trait]
pub trait TallyApi: Send + Sync {
    /// Promote qualifying ledger records, persist the filter, clear the ledger.
    async fn run(&self) -> Result<TallyReport, TallyError>;

    /// Merge every queued upload into the filter and drain the queue.
    async fn merge_uploads(&self) -> Result<MergeReport, TallyError>;

    /// Currently persisted snapshot, if a readable one exists.
    async fn current_snapshot(&self) -> Result<Option<BloomFilterSnapshot>, TallyError>;
}
