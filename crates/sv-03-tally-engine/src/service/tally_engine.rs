//! Tally Engine Service
//!
//! ## Run sequence
//!
//! 1. Load the snapshot (absent or corrupt: fresh filter, logged as a loss)
//! 2. Scan the ledger; promote targets at or over the threshold that the
//!    filter does not already contain; mark every record for deletion
//! 3. Persist the filter under a version newer than the loaded one
//! 4. Clear marked records in batches
//!
//! Nothing is deleted before step 3 succeeds, so a failed run is safe to
//! retry from scratch. A run interrupted during step 4 leaves records that
//! the next run re-reads; promotion is idempotent because of the `check`
//! before `add`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::TryStreamExt;
use shared_types::{KeyValueStore, ScanCursor};
use sv_01_bloom_filter::{BloomFilter, BloomFilterSnapshot, SnapshotVersion};
use sv_02_report_ledger::{LedgerEntry, ReportLedgerApi};
use tracing::{debug, error, info, warn};

use super::snapshot_repository::{LoadedSnapshot, SnapshotRepository};
use super::upload_queue::UploadQueue;
use crate::domain::{MergeReport, TallyConfig, TallyReport};
use crate::error::TallyError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::TallyApi;

/// Promotion decision for one ledger record.
#[derive(Debug, PartialEq, Eq)]
enum Disposition {
    Promoted,
    AlreadyPresent,
    Discarded,
    Failed,
}

pub struct TallyEngine<L: ReportLedgerApi, S: KeyValueStore> {
    ledger: Arc<L>,
    snapshots: SnapshotRepository<S>,
    uploads: UploadQueue<S>,
    config: TallyConfig,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<L: ReportLedgerApi, S: KeyValueStore> TallyEngine<L, S> {
    pub fn new(ledger: Arc<L>, store: Arc<S>, config: TallyConfig) -> Self {
        Self {
            ledger,
            snapshots: SnapshotRepository::new(
                store.clone(),
                config.snapshot_key.clone(),
                config.filter.clone(),
            ),
            uploads: UploadQueue::new(
                store,
                config.upload_prefix.clone(),
                config.upload_ttl,
                config.upload_scan_batch,
            ),
            config,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Queue used by `merge_uploads`, for submitting snapshots.
    pub fn upload_queue(&self) -> &UploadQueue<S> {
        &self.uploads
    }

    async fn load(&self) -> Result<LoadedSnapshot, TallyError> {
        let loaded = self.snapshots.load().await?;
        if loaded.recovered {
            self.metrics.record_snapshot_loss();
        }
        Ok(loaded)
    }

    fn process(&self, filter: &mut BloomFilter, entry: &LedgerEntry) -> Disposition {
        if entry.count < self.config.report_threshold {
            return Disposition::Discarded;
        }

        let promoted = filter.check(&entry.target_id).and_then(|present| {
            if present {
                Ok(false)
            } else {
                filter.add(&entry.target_id).map(|_| true)
            }
        });

        match promoted {
            Ok(true) => {
                debug!(target_id = %entry.target_id, count = entry.count, "Promoted");
                Disposition::Promoted
            }
            Ok(false) => Disposition::AlreadyPresent,
            Err(err) => {
                warn!(
                    target_id = %entry.target_id,
                    error = %err,
                    "Ledger record could not be processed, clearing it"
                );
                Disposition::Failed
            }
        }
    }

    async fn tally(&self) -> Result<TallyReport, TallyError> {
        let LoadedSnapshot {
            mut filter,
            version: previous,
            recovered,
        } = self.load().await?;

        let mut report = TallyReport {
            recovered_snapshot: recovered,
            ..Default::default()
        };
        let mut marked = Vec::new();
        let mut seen = HashSet::new();

        {
            let mut entries = self.ledger.scan_all();
            while let Some(entry) = entries.try_next().await? {
                // store scans may repeat keys across pages
                if !seen.insert(entry.target_id.clone()) {
                    continue;
                }
                report.scanned += 1;
                match self.process(&mut filter, &entry) {
                    Disposition::Promoted => report.promoted += 1,
                    Disposition::AlreadyPresent => report.already_present += 1,
                    Disposition::Discarded => report.discarded += 1,
                    Disposition::Failed => report.failed += 1,
                }
                marked.push(entry.target_id);
            }
        }

        let version = SnapshotVersion::next_after(previous);
        self.snapshots.persist(&filter, version).await.map_err(|err| {
            error!(error = %err, "Snapshot persist failed, ledger left intact");
            err
        })?;
        report.version = Some(version);
        report.estimated_count = filter.estimate_count();
        report.saturated = filter.is_saturated();

        for chunk in marked.chunks(self.config.delete_batch.max(1)) {
            report.cleared += self.ledger.clear_many(chunk).await?;
        }

        Ok(report)
    }

    async fn merge(&self) -> Result<MergeReport, TallyError> {
        let LoadedSnapshot {
            mut filter,
            version: previous,
            recovered,
        } = self.load().await?;

        let mut report = MergeReport {
            recovered_snapshot: recovered,
            ..Default::default()
        };
        let mut processed = Vec::new();
        let mut cursor = Some(ScanCursor::start());

        while let Some(current) = cursor {
            let page = self.uploads.page(&current).await?;
            for upload in page.uploads {
                let merged = upload
                    .snapshot
                    .and_then(|snapshot| snapshot.into_filter(&self.config.filter))
                    .and_then(|other| filter.merge(&other));
                match merged {
                    Ok(()) => report.merged += 1,
                    Err(err) => {
                        warn!(key = %upload.key, error = %err, "Dropping incompatible upload");
                        report.rejected += 1;
                    }
                }
                processed.push(upload.key);
            }
            cursor = page.next;
        }

        if processed.is_empty() {
            return Ok(report);
        }

        let version = SnapshotVersion::next_after(previous);
        self.snapshots.persist(&filter, version).await?;
        report.version = Some(version);

        for chunk in processed.chunks(self.config.delete_batch.max(1)) {
            report.drained += self.uploads.remove(chunk).await?;
        }

        Ok(report)
    }
}

#[async_trait]
impl<L, S> TallyApi for TallyEngine<L, S>
where
    L: ReportLedgerApi + 'static,
    S: KeyValueStore + 'static,
{
    async fn run(&self) -> Result<TallyReport, TallyError> {
        let started = Instant::now();
        match self.tally().await {
            Ok(report) => {
                self.metrics.record_run(&report, started.elapsed());
                info!(
                    version = ?report.version.map(|v| v.to_string()),
                    scanned = report.scanned,
                    promoted = report.promoted,
                    discarded = report.discarded,
                    failed = report.failed,
                    cleared = report.cleared,
                    estimated_count = report.estimated_count,
                    saturated = report.saturated,
                    "Tally run complete"
                );
                if report.saturated {
                    warn!("Filter saturated, membership answers are all positive");
                }
                Ok(report)
            }
            Err(err) => {
                self.metrics.record_run_failed();
                error!(error = %err, "Tally run aborted");
                Err(err)
            }
        }
    }

    async fn merge_uploads(&self) -> Result<MergeReport, TallyError> {
        let report = self.merge().await.map_err(|err| {
            error!(error = %err, "Upload merge aborted");
            err
        })?;
        self.metrics.record_merge(&report);
        if report.merged + report.rejected > 0 {
            info!(
                merged = report.merged,
                rejected = report.rejected,
                drained = report.drained,
                "Upload merge complete"
            );
        }
        Ok(report)
    }

    async fn current_snapshot(&self) -> Result<Option<BloomFilterSnapshot>, TallyError> {
        self.snapshots.current().await
    }
}
