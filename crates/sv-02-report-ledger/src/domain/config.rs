//! Ledger configuration

use std::time::Duration;

use sv_01_bloom_filter::IdentifierEncoding;

use super::window::UploadWindow;

/// Seven days, the retention of an untallied record.
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Report ledger configuration.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Prefix of per-target reporter-set keys
    pub key_prefix: String,
    /// TTL applied, in full, on every report touching a record
    pub record_ttl: Duration,
    /// Keys requested per scan page
    pub scan_batch: usize,
    /// Accepted target encoding
    pub encoding: IdentifierEncoding,
    /// When reports are accepted
    pub upload_window: UploadWindow,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            key_prefix: "report:".to_string(),
            record_ttl: DEFAULT_RECORD_TTL,
            scan_batch: 100,
            encoding: IdentifierEncoding::Hex,
            upload_window: UploadWindow::Always,
        }
    }
}

impl LedgerConfig {
    /// Reporter-set key for a target.
    pub fn record_key(&self, target_id: &str) -> String {
        format!("{}{}", self.key_prefix, target_id)
    }

    /// Derived counter key written by older ingestion paths.
    pub fn counter_key(&self, target_id: &str) -> String {
        format!("{}{}:count", self.key_prefix, target_id)
    }

    /// Target id for a scanned key, `None` for keys that are not reporter sets.
    pub fn target_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        let target = key.strip_prefix(self.key_prefix.as_str())?;
        if target.is_empty() || target.contains(':') {
            return None;
        }
        Some(target)
    }
}

/// Usage-metrics ledger configuration.
#[derive(Clone, Debug)]
pub struct UsageConfig {
    pub key_prefix: String,
    pub record_ttl: Duration,
    pub upload_window: UploadWindow,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            key_prefix: "metrics:".to_string(),
            record_ttl: DEFAULT_RECORD_TTL,
            upload_window: UploadWindow::ExceptHour(23),
        }
    }
}
