//! Inbound Ports (Driving Ports)
//!
//! API the ingestion boundary and the tally engine use to reach the ledger.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use shared_types::ScanCursor;

use crate::domain::{BatchOutcome, IngestOutcome, LedgerEntry, LedgerPage, UsageReport};
use crate::error::LedgerError;

/// Report ledger API (Driving Port)
#[async_trait]
pub trait ReportLedgerApi: Send + Sync {
    /// Record that `reporter_id` reported `target_id`.
    ///
    /// Fails with `RateLimited` without touching the ledger when the
    /// reporter's window is exhausted.
    async fn ingest(&self, reporter_id: &str, target_id: &str)
        -> Result<IngestOutcome, LedgerError>;

    /// Record several targets under a single rate-limit charge.
    ///
    /// Every target is validated before anything is written.
    async fn ingest_batch(
        &self,
        reporter_id: &str,
        target_ids: &[String],
    ) -> Result<Vec<BatchOutcome>, LedgerError>;

    /// One page of live records starting at `cursor`.
    async fn scan_page(&self, cursor: &ScanCursor) -> Result<LedgerPage, LedgerError>;

    /// Delete a target's reporter set and derived counters.
    async fn clear(&self, target_id: &str) -> Result<(), LedgerError>;

    /// Delete many targets in one store call. Returns keys removed.
    async fn clear_many(&self, target_ids: &[String]) -> Result<u64, LedgerError>;

    /// Lazily stream every live record from `cursor` onwards.
    ///
    /// Finite. Records created or deleted while the scan runs may or may
    /// not be observed.
    fn scan_from(&self, cursor: ScanCursor) -> BoxStream<'_, Result<LedgerEntry, LedgerError>> {
        stream::try_unfold(Some(cursor), move |cursor| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            let page = self.scan_page(&cursor).await?;
            let entries = stream::iter(page.entries.into_iter().map(Ok));
            Ok::<_, LedgerError>(Some((entries, page.next)))
        })
        .try_flatten()
        .boxed()
    }

    /// Lazily stream every live record.
    fn scan_all(&self) -> BoxStream<'_, Result<LedgerEntry, LedgerError>> {
        self.scan_from(ScanCursor::start())
    }
}

/// Usage-metrics ledger API (Driving Port)
#[async_trait]
pub trait UsageLedgerApi: Send + Sync {
    /// Add a reporter's usage counters to its running totals.
    async fn record(&self, reporter_id: &str, report: UsageReport) -> Result<(), LedgerError>;

    /// Current totals for a reporter (zeroes when none).
    async fn usage(&self, reporter_id: &str) -> Result<UsageReport, LedgerError>;
}
