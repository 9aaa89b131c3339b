//! Report Ledger Service
//!
//! Per-target reporter sets in the key-value store.
//!
//! ## Record layout
//!
//! - `report:{target}`: set of reporter ids, TTL reset on every report
//! - `report:{target}:count`: derived counter from older writers, only
//!   ever deleted here
//!
//! The canonical count is the set cardinality, so duplicate and racing
//! reports can never inflate it.
//!
//! "Check rate limit, then mutate" is two store round-trips with no
//! transaction between them; the limit is best-effort.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use shared_types::{KeyValueStore, RateLimiter, ScanCursor, StoreError};
use sv_01_bloom_filter::FilterError;
use tracing::{debug, warn};

use crate::domain::{BatchOutcome, IngestOutcome, LedgerConfig, LedgerEntry, LedgerPage};
use crate::error::LedgerError;
use crate::ports::ReportLedgerApi;

/// Wall-clock source for upload-window checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Report ledger backed by a key-value store.
pub struct ReportLedger<S: KeyValueStore, R: RateLimiter> {
    store: Arc<S>,
    limiter: Arc<R>,
    config: LedgerConfig,
    clock: Clock,
}

impl<S: KeyValueStore, R: RateLimiter> ReportLedger<S, R> {
    pub fn new(store: Arc<S>, limiter: Arc<R>) -> Self {
        Self::with_config(store, limiter, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<S>, limiter: Arc<R>, config: LedgerConfig) -> Self {
        Self {
            store,
            limiter,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall-clock used for upload-window checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn validate_reporter(reporter_id: &str) -> Result<(), LedgerError> {
        if reporter_id.trim().is_empty() {
            return Err(LedgerError::InvalidReporter("empty reporter id"));
        }
        Ok(())
    }

    fn validate_target(&self, target_id: &str) -> Result<(), LedgerError> {
        self.config
            .encoding
            .validate(target_id)
            .map_err(|err| match err {
                FilterError::MalformedIdentifier { identifier, reason } => {
                    LedgerError::MalformedIdentifier { identifier, reason }
                }
                _ => LedgerError::MalformedIdentifier {
                    identifier: target_id.chars().take(64).collect(),
                    reason: "identifier rejected",
                },
            })
    }

    /// Upload window, then rate limit. Nothing is written on refusal.
    async fn admit(&self, reporter_id: &str) -> Result<(), LedgerError> {
        let now = (self.clock)();
        if !self.config.upload_window.allows(now) {
            return Err(LedgerError::OutsideUploadWindow {
                at: now.to_rfc3339(),
            });
        }

        if !self.limiter.allow(reporter_id).await? {
            debug!(reporter_id, "Report refused by rate limiter");
            return Err(LedgerError::RateLimited {
                reporter_id: reporter_id.to_string(),
            });
        }
        Ok(())
    }

    /// Insert, refresh TTL, read cardinality. Inputs already validated.
    async fn record(&self, reporter_id: &str, target_id: &str) -> Result<IngestOutcome, LedgerError> {
        let key = self.config.record_key(target_id);

        let is_new = self.store.sadd(&key, reporter_id).await?;
        self.store.expire(&key, self.config.record_ttl).await?;
        let count = self.store.scard(&key).await?;

        debug!(
            target_id,
            count,
            duplicate = !is_new,
            "Report recorded"
        );

        Ok(IngestOutcome {
            accepted: true,
            duplicate: !is_new,
            count,
        })
    }

    /// Cardinality for a scanned key; corrupt records read as zero so the
    /// next tally clears them.
    async fn entry_count(&self, key: &str) -> Result<u64, LedgerError> {
        match self.store.scard(key).await {
            Ok(count) => Ok(count),
            Err(StoreError::WrongType { key, expected }) => {
                warn!(key = %key, expected, "Ledger key holds unexpected value type");
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl<S, R> ReportLedgerApi for ReportLedger<S, R>
where
    S: KeyValueStore + 'static,
    R: RateLimiter + 'static,
{
    async fn ingest(
        &self,
        reporter_id: &str,
        target_id: &str,
    ) -> Result<IngestOutcome, LedgerError> {
        Self::validate_reporter(reporter_id)?;
        self.validate_target(target_id)?;
        self.admit(reporter_id).await?;
        self.record(reporter_id, target_id).await
    }

    async fn ingest_batch(
        &self,
        reporter_id: &str,
        target_ids: &[String],
    ) -> Result<Vec<BatchOutcome>, LedgerError> {
        Self::validate_reporter(reporter_id)?;
        for target_id in target_ids {
            self.validate_target(target_id)?;
        }
        self.admit(reporter_id).await?;

        try_join_all(target_ids.iter().map(|target_id| async move {
            let outcome = self.record(reporter_id, target_id).await?;
            Ok::<_, LedgerError>(BatchOutcome {
                target_id: target_id.clone(),
                outcome,
            })
        }))
        .await
    }

    async fn scan_page(&self, cursor: &ScanCursor) -> Result<LedgerPage, LedgerError> {
        let page = self
            .store
            .scan(cursor, &self.config.key_prefix, self.config.scan_batch)
            .await?;

        let mut entries = Vec::with_capacity(page.keys.len());
        for key in &page.keys {
            let Some(target_id) = self.config.target_from_key(key) else {
                continue;
            };
            let count = self.entry_count(key).await?;
            entries.push(LedgerEntry {
                target_id: target_id.to_string(),
                count,
            });
        }

        Ok(LedgerPage {
            entries,
            next: page.next,
        })
    }

    async fn clear(&self, target_id: &str) -> Result<(), LedgerError> {
        self.clear_many(&[target_id.to_string()]).await.map(|_| ())
    }

    async fn clear_many(&self, target_ids: &[String]) -> Result<u64, LedgerError> {
        if target_ids.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = target_ids
            .iter()
            .flat_map(|t| [self.config.record_key(t), self.config.counter_key(t)])
            .collect();
        Ok(self.store.del(&keys).await?)
    }
}
