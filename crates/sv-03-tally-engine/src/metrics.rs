//! Metrics hooks for tally and merge runs
//!
//! Counters accumulate across runs for the life of the process.
//!
//! ## Usage
//!
//! ```ignore
//! use sv_03_tally_engine::metrics::TallyMetrics;
//!
//! let metrics = Arc::new(TallyMetrics::new());
//! let engine = TallyEngine::new(ledger, store, config).with_metrics(metrics.clone());
//! engine.run().await?;
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::{MergeReport, TallyReport};

/// Thread-safe counters for tally activity.
#[derive(Default)]
pub struct TallyMetrics {
    pub runs_completed: AtomicU64,
    pub runs_failed: AtomicU64,
    pub records_scanned: AtomicU64,
    pub promotions: AtomicU64,
    pub discards: AtomicU64,
    /// Records skipped because their identifier could not be processed
    pub record_failures: AtomicU64,
    /// Unreadable snapshots replaced by an empty filter
    pub snapshot_losses: AtomicU64,
    pub uploads_merged: AtomicU64,
    pub uploads_rejected: AtomicU64,
    /// Cumulative successful run time in nanoseconds
    pub run_time_ns: AtomicU64,
}

impl TallyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&self, report: &TallyReport, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.records_scanned.fetch_add(report.scanned, Ordering::Relaxed);
        self.promotions.fetch_add(report.promoted, Ordering::Relaxed);
        self.discards.fetch_add(report.discarded, Ordering::Relaxed);
        self.record_failures.fetch_add(report.failed, Ordering::Relaxed);
        self.run_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_loss(&self) {
        self.snapshot_losses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge(&self, report: &MergeReport) {
        self.uploads_merged.fetch_add(report.merged, Ordering::Relaxed);
        self.uploads_rejected
            .fetch_add(report.rejected, Ordering::Relaxed);
    }

    pub fn avg_run_time_ns(&self) -> u64 {
        let total = self.run_time_ns.load(Ordering::Relaxed);
        let runs = self.runs_completed.load(Ordering::Relaxed);
        if runs > 0 {
            total / runs
        } else {
            0
        }
    }

    pub fn snapshot(&self) -> TallyMetricsSnapshot {
        TallyMetricsSnapshot {
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            record_failures: self.record_failures.load(Ordering::Relaxed),
            snapshot_losses: self.snapshot_losses.load(Ordering::Relaxed),
            uploads_merged: self.uploads_merged.load(Ordering::Relaxed),
            uploads_rejected: self.uploads_rejected.load(Ordering::Relaxed),
            avg_run_ns: self.avg_run_time_ns(),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TallyMetricsSnapshot {
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub records_scanned: u64,
    pub promotions: u64,
    pub discards: u64,
    pub record_failures: u64,
    pub snapshot_losses: u64,
    pub uploads_merged: u64,
    pub uploads_rejected: u64,
    pub avg_run_ns: u64,
}

/// Sink for tally metrics
///
/// Implement this to forward counters to an external metrics system.
pub trait MetricsRecorder: Send + Sync {
    fn record_run(&self, report: &TallyReport, duration: Duration);
    fn record_run_failed(&self);
    fn record_snapshot_loss(&self);
    fn record_merge(&self, report: &MergeReport);
}

/// Recorder that drops everything
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_run(&self, _: &TallyReport, _: Duration) {}
    fn record_run_failed(&self) {}
    fn record_snapshot_loss(&self) {}
    fn record_merge(&self, _: &MergeReport) {}
}

impl MetricsRecorder for TallyMetrics {
    fn record_run(&self, report: &TallyReport, duration: Duration) {
        TallyMetrics::record_run(self, report, duration);
    }

    fn record_run_failed(&self) {
        TallyMetrics::record_run_failed(self);
    }

    fn record_snapshot_loss(&self) {
        TallyMetrics::record_snapshot_loss(self);
    }

    fn record_merge(&self, report: &MergeReport) {
        TallyMetrics::record_merge(self, report);
    }
}
