//! Durable upload queue
//!
//! Snapshots submitted by clients or peer instances wait under
//! `upload:{uuid}` until a merge pass folds them into the global filter.
//! Entries expire on their own if no merge pass runs in time.

use std::sync::Arc;
use std::time::Duration;

use shared_types::{KeyValueStore, ScanCursor};
use sv_01_bloom_filter::{BloomFilterSnapshot, FilterError};
use tracing::debug;
use uuid::Uuid;

use crate::error::TallyError;

/// One queued entry as read back by a merge pass.
#[derive(Debug)]
pub struct QueuedUpload {
    pub key: String,
    /// Parse result; unparsable entries are still returned so they can be drained
    pub snapshot: Result<BloomFilterSnapshot, FilterError>,
}

/// One page of the queue.
#[derive(Debug, Default)]
pub struct UploadPage {
    pub uploads: Vec<QueuedUpload>,
    pub next: Option<ScanCursor>,
}

pub struct UploadQueue<S: KeyValueStore> {
    store: Arc<S>,
    prefix: String,
    ttl: Duration,
    scan_batch: usize,
}

impl<S: KeyValueStore> UploadQueue<S> {
    pub fn new(store: Arc<S>, prefix: impl Into<String>, ttl: Duration, scan_batch: usize) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
            scan_batch,
        }
    }

    /// Queue a snapshot. Returns its queue key.
    pub async fn enqueue(&self, snapshot: &BloomFilterSnapshot) -> Result<String, TallyError> {
        if snapshot.buckets.is_empty() {
            return Err(FilterError::InvalidParameter("upload has no buckets".to_string()).into());
        }
        let json = snapshot
            .to_json()
            .map_err(|e| TallyError::Serialization(e.to_string()))?;

        let key = format!("{}{}", self.prefix, Uuid::new_v4());
        self.store.set(&key, json, Some(self.ttl)).await?;
        debug!(key = %key, words = snapshot.buckets.len(), "Upload queued");
        Ok(key)
    }

    /// Validate and queue a raw JSON upload.
    pub async fn enqueue_json(&self, bytes: &[u8]) -> Result<String, TallyError> {
        let snapshot = BloomFilterSnapshot::from_json(bytes)?;
        self.enqueue(&snapshot).await
    }

    /// Read one page of queued uploads. Entries that expired between the
    /// scan and the read are skipped.
    pub async fn page(&self, cursor: &ScanCursor) -> Result<UploadPage, TallyError> {
        let page = self
            .store
            .scan(cursor, &self.prefix, self.scan_batch)
            .await?;

        let mut uploads = Vec::with_capacity(page.keys.len());
        for key in page.keys {
            let Some(bytes) = self.store.get(&key).await? else {
                continue;
            };
            uploads.push(QueuedUpload {
                snapshot: BloomFilterSnapshot::from_json(&bytes),
                key,
            });
        }

        Ok(UploadPage {
            uploads,
            next: page.next,
        })
    }

    /// Remove processed entries.
    pub async fn remove(&self, keys: &[String]) -> Result<u64, TallyError> {
        if keys.is_empty() {
            return Ok(0);
        }
        Ok(self.store.del(keys).await?)
    }
}
