//! Usage Ledger Service
//!
//! Running per-reporter usage totals in a `metrics:{reporter}` hash. Each
//! upload is rate limited like a report, adds to the totals and resets the
//! hash TTL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{KeyValueStore, RateLimiter};
use tracing::debug;

use super::report_ledger::Clock;
use crate::domain::{UsageConfig, UsageReport};
use crate::error::LedgerError;
use crate::ports::UsageLedgerApi;

pub struct UsageLedger<S: KeyValueStore, R: RateLimiter> {
    store: Arc<S>,
    limiter: Arc<R>,
    config: UsageConfig,
    clock: Clock,
}

impl<S: KeyValueStore, R: RateLimiter> UsageLedger<S, R> {
    pub fn new(store: Arc<S>, limiter: Arc<R>, config: UsageConfig) -> Self {
        Self {
            store,
            limiter,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn key(&self, reporter_id: &str) -> String {
        format!("{}{}", self.config.key_prefix, reporter_id)
    }
}

#[async_trait]
impl<S, R> UsageLedgerApi for UsageLedger<S, R>
where
    S: KeyValueStore + 'static,
    R: RateLimiter + 'static,
{
    async fn record(&self, reporter_id: &str, report: UsageReport) -> Result<(), LedgerError> {
        if reporter_id.trim().is_empty() {
            return Err(LedgerError::InvalidReporter("empty reporter id"));
        }
        if let Some((field, value)) = report.fields().into_iter().find(|(_, v)| *v < 0) {
            return Err(LedgerError::InvalidUsageReport(format!(
                "{} is negative ({})",
                field, value
            )));
        }

        let now = (self.clock)();
        if !self.config.upload_window.allows(now) {
            return Err(LedgerError::OutsideUploadWindow {
                at: now.to_rfc3339(),
            });
        }
        if !self.limiter.allow(reporter_id).await? {
            return Err(LedgerError::RateLimited {
                reporter_id: reporter_id.to_string(),
            });
        }

        let key = self.key(reporter_id);
        for (field, value) in report.fields() {
            self.store.hincrby(&key, field, value).await?;
        }
        self.store.expire(&key, self.config.record_ttl).await?;

        debug!(reporter_id, ?report, "Usage recorded");
        Ok(())
    }

    async fn usage(&self, reporter_id: &str) -> Result<UsageReport, LedgerError> {
        let fields = self.store.hgetall(&self.key(reporter_id)).await?;
        Ok(UsageReport::from_fields(&fields))
    }
}
