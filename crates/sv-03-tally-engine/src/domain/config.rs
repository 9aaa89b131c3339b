//! Tally configuration

use std::time::Duration;

use sv_01_bloom_filter::FilterConfig;

/// Reports needed before a target is promoted.
pub const DEFAULT_REPORT_THRESHOLD: u64 = 5;
/// Well-known key of the global filter snapshot.
pub const DEFAULT_SNAPSHOT_KEY: &str = "bloomfilter:global";

/// Tally engine configuration.
#[derive(Clone, Debug)]
pub struct TallyConfig {
    /// Minimum distinct reporters for promotion
    pub report_threshold: u64,
    /// Key holding the persisted snapshot
    pub snapshot_key: String,
    /// Targets cleared per ledger delete call
    pub delete_batch: usize,
    /// Prefix of queued upload snapshots
    pub upload_prefix: String,
    /// Retention of an unmerged upload
    pub upload_ttl: Duration,
    /// Keys requested per upload-queue scan page
    pub upload_scan_batch: usize,
    /// Shape of a fresh filter and `k` for loaded ones
    pub filter: FilterConfig,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            delete_batch: 500,
            upload_prefix: "upload:".to_string(),
            upload_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            upload_scan_batch: 100,
            filter: FilterConfig::default(),
        }
    }
}
