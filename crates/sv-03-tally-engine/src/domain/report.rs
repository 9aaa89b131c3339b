//! Run reports

use serde::Serialize;
use sv_01_bloom_filter::SnapshotVersion;

/// Outcome of one successful tally run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TallyReport {
    /// Version the snapshot was persisted under
    pub version: Option<SnapshotVersion>,
    /// Ledger records observed
    pub scanned: u64,
    /// Targets newly added to the filter
    pub promoted: u64,
    /// At or over threshold but already in the filter
    pub already_present: u64,
    /// Under threshold, dropped without promotion
    pub discarded: u64,
    /// Records whose identifier could not be processed
    pub failed: u64,
    /// Ledger keys removed
    pub cleared: u64,
    /// Filter cardinality estimate after the run
    pub estimated_count: f64,
    /// Every bit set; `estimated_count` is meaningless
    pub saturated: bool,
    /// Stored snapshot was unreadable and replaced by an empty filter
    pub recovered_snapshot: bool,
}

/// Outcome of one upload-queue merge pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// `None` when the queue was empty and nothing was persisted
    pub version: Option<SnapshotVersion>,
    pub merged: u64,
    /// Unparsable or incompatible uploads, dropped
    pub rejected: u64,
    /// Queue entries deleted
    pub drained: u64,
    pub recovered_snapshot: bool,
}
