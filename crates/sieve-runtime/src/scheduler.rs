//! # Tally Scheduler
//!
//! Runs one pass per interval: merge queued uploads, tally the ledger,
//! publish the result. Each pass holds the tally lease, so any number of
//! runtime instances can share a store and at most one pass runs at a time.
//! A tick that finds the lease held is skipped, not retried.

use std::sync::Arc;
use std::time::Duration;

use shared_types::KeyValueStore;
use sv_03_tally_engine::{MergeReport, PublicationConfig, TallyApi, TallyReport};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::RuntimeError;
use crate::lease::Lease;
use crate::publisher::{publish_current, PublicationSink, PublishOutcome};

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub lease_key: String,
    pub lease_ttl: Duration,
    pub publication: PublicationConfig,
}

/// Outcome of one tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Another instance holds the lease
    Skipped,
    Completed {
        merge: MergeReport,
        tally: TallyReport,
        /// `None` when no sink is configured
        published: Option<PublishOutcome>,
    },
}

pub struct TallyScheduler<T, S, P>
where
    T: TallyApi,
    S: KeyValueStore,
    P: PublicationSink,
{
    engine: Arc<T>,
    store: Arc<S>,
    sink: Option<Arc<P>>,
    config: SchedulerConfig,
}

impl<T, S, P> TallyScheduler<T, S, P>
where
    T: TallyApi,
    S: KeyValueStore,
    P: PublicationSink,
{
    pub fn new(engine: Arc<T>, store: Arc<S>, sink: Option<Arc<P>>, config: SchedulerConfig) -> Self {
        Self {
            engine,
            store,
            sink,
            config,
        }
    }

    /// Run one pass under the lease.
    pub async fn tick(&self) -> Result<TickOutcome, RuntimeError> {
        let Some(lease) =
            Lease::acquire(self.store.clone(), &self.config.lease_key, self.config.lease_ttl)
                .await?
        else {
            debug!("Tally pass skipped, lease held elsewhere");
            return Ok(TickOutcome::Skipped);
        };

        let outcome = self.pass().await;

        if let Err(err) = lease.release().await {
            warn!(error = %err, "Failed to release tally lease, it will expire");
        }
        outcome
    }

    async fn pass(&self) -> Result<TickOutcome, RuntimeError> {
        let merge = self.engine.merge_uploads().await?;
        let tally = self.engine.run().await?;

        let published = match &self.sink {
            Some(sink) => {
                publish_current(self.engine.as_ref(), sink.as_ref(), &self.config.publication)
                    .await?
            }
            None => None,
        };

        Ok(TickOutcome::Completed {
            merge,
            tally,
            published,
        })
    }

    /// Tick every interval until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.config.interval.as_secs(), "Tally scheduler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        error!(error = %err, "Tally pass failed, will retry next interval");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Tally scheduler stopped");
    }
}
