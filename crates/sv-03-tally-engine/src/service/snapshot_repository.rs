//! Snapshot persistence under a single well-known key.

use std::sync::Arc;

use shared_types::KeyValueStore;
use sv_01_bloom_filter::{BloomFilter, BloomFilterSnapshot, FilterConfig, SnapshotVersion};
use tracing::{debug, warn};

use crate::error::TallyError;

/// Filter loaded at the start of a run.
#[derive(Debug)]
pub struct LoadedSnapshot {
    pub filter: BloomFilter,
    /// Version of the stored snapshot; `None` if none was usable
    pub version: Option<SnapshotVersion>,
    /// A stored snapshot existed but could not be read
    pub recovered: bool,
}

pub struct SnapshotRepository<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
    filter_config: FilterConfig,
}

impl<S: KeyValueStore> SnapshotRepository<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>, filter_config: FilterConfig) -> Self {
        Self {
            store,
            key: key.into(),
            filter_config,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored snapshot, or a fresh filter when absent or unreadable.
    ///
    /// Only store failures are errors; a corrupt snapshot is a logged loss.
    pub async fn load(&self) -> Result<LoadedSnapshot, TallyError> {
        let Some(bytes) = self.store.get(&self.key).await? else {
            debug!(key = %self.key, "No stored snapshot, starting empty filter");
            return self.fresh(false);
        };

        let restored = BloomFilterSnapshot::from_json(&bytes).and_then(|snapshot| {
            let version = snapshot.version;
            snapshot
                .into_filter(&self.filter_config)
                .map(|filter| (filter, version))
        });

        match restored {
            Ok((filter, version)) => Ok(LoadedSnapshot {
                filter,
                version: Some(version),
                recovered: false,
            }),
            Err(err) => {
                warn!(
                    key = %self.key,
                    error = %err,
                    "Stored snapshot unreadable, replacing with empty filter"
                );
                self.fresh(true)
            }
        }
    }

    /// Parsed stored snapshot; unreadable reads as `None`.
    pub async fn current(&self) -> Result<Option<BloomFilterSnapshot>, TallyError> {
        let Some(bytes) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        Ok(BloomFilterSnapshot::from_json(&bytes).ok())
    }

    /// Write `filter` under `version`, replacing any stored snapshot.
    pub async fn persist(
        &self,
        filter: &BloomFilter,
        version: SnapshotVersion,
    ) -> Result<BloomFilterSnapshot, TallyError> {
        let snapshot = BloomFilterSnapshot::from_filter(filter, version);
        let json = snapshot
            .to_json()
            .map_err(|e| TallyError::Serialization(e.to_string()))?;
        self.store.set(&self.key, json, None).await?;
        debug!(key = %self.key, %version, "Snapshot persisted");
        Ok(snapshot)
    }

    fn fresh(&self, recovered: bool) -> Result<LoadedSnapshot, TallyError> {
        Ok(LoadedSnapshot {
            filter: self.filter_config.empty_filter()?,
            version: None,
            recovered,
        })
    }
}
