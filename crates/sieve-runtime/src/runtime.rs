//! # Runtime Wiring
//!
//! Builds every subsystem over one shared store and owns the scheduler task.
//! The store is injected: the binary passes a [`RedisStore`] shared with
//! other instances, tests pass an `InMemoryKvStore`.
//!
//! [`RedisStore`]: crate::adapters::RedisStore
//!
//! ## Startup Sequence
//!
//! 1. Create the rate limiter over the store
//! 2. Create the report and usage ledgers
//! 3. Create the tally engine with process-wide metrics
//! 4. Spawn the tally scheduler

use std::sync::Arc;

use shared_types::{FixedWindowRateLimiter, KeyValueStore};
use sv_02_report_ledger::{ReportLedger, UsageLedger};
use sv_03_tally_engine::{TallyEngine, TallyMetrics};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RuntimeConfig;
use crate::publisher::FilesystemSink;
use crate::scheduler::{SchedulerConfig, TallyScheduler};

pub type Limiter<S> = FixedWindowRateLimiter<S>;
pub type Ledger<S> = ReportLedger<S, Limiter<S>>;
pub type Usage<S> = UsageLedger<S, Limiter<S>>;
pub type Engine<S> = TallyEngine<Ledger<S>, S>;

pub struct SieveRuntime<S: KeyValueStore + 'static> {
    config: RuntimeConfig,
    store: Arc<S>,
    ledger: Arc<Ledger<S>>,
    usage: Arc<Usage<S>>,
    engine: Arc<Engine<S>>,
    metrics: Arc<TallyMetrics>,
    shutdown_tx: watch::Sender<bool>,
    scheduler: Option<JoinHandle<()>>,
}

impl<S: KeyValueStore + 'static> SieveRuntime<S> {
    pub fn new(config: RuntimeConfig, store: Arc<S>) -> Self {
        let limiter = Arc::new(FixedWindowRateLimiter::new(
            store.clone(),
            config.rate_limit.clone(),
        ));
        let ledger = Arc::new(ReportLedger::with_config(
            store.clone(),
            limiter.clone(),
            config.ledger.clone(),
        ));
        let usage = Arc::new(UsageLedger::new(
            store.clone(),
            limiter,
            config.usage.clone(),
        ));
        let metrics = Arc::new(TallyMetrics::new());
        let engine = Arc::new(
            TallyEngine::new(ledger.clone(), store.clone(), config.tally.clone())
                .with_metrics(metrics.clone()),
        );
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            store,
            ledger,
            usage,
            engine,
            metrics,
            shutdown_tx,
            scheduler: None,
        }
    }

    /// Spawn the scheduler.
    pub fn start(&mut self) {
        let sink = self
            .config
            .publish_dir
            .as_ref()
            .map(|dir| Arc::new(FilesystemSink::new(dir.clone())));
        if sink.is_none() {
            info!("No publish directory configured, snapshots stay in the store");
        }

        let scheduler = TallyScheduler::new(
            self.engine.clone(),
            self.store.clone(),
            sink,
            SchedulerConfig {
                interval: self.config.tally_interval,
                lease_key: self.config.lease_key.clone(),
                lease_ttl: self.config.lease_ttl,
                publication: self.config.publication.clone(),
            },
        );
        self.scheduler = Some(tokio::spawn(scheduler.run(self.shutdown_tx.subscribe())));
    }

    /// Stop the scheduler, letting an in-flight pass finish.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            error!("Scheduler already gone");
        }
        if let Some(handle) = self.scheduler.take() {
            if let Err(err) = handle.await {
                error!(error = %err, "Scheduler task panicked");
            }
        }
        info!(metrics = ?self.metrics.snapshot(), "Shutdown complete");
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn ledger(&self) -> Arc<Ledger<S>> {
        Arc::clone(&self.ledger)
    }

    pub fn usage_ledger(&self) -> Arc<Usage<S>> {
        Arc::clone(&self.usage)
    }

    pub fn engine(&self) -> Arc<Engine<S>> {
        Arc::clone(&self.engine)
    }

    pub fn metrics(&self) -> Arc<TallyMetrics> {
        Arc::clone(&self.metrics)
    }
}
