//! # Report Sieve Runtime
//!
//! Runs the tally scheduler until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration from `SIEVE_*` variables
//! 3. Connect to the shared Redis store (`SIEVE_STORE_URL`)
//! 4. Wire subsystems and start the scheduler
//! 5. Wait for Ctrl+C, then shut down gracefully

use std::sync::Arc;

use anyhow::{Context, Result};
use sieve_runtime::{RedisStore, RuntimeConfig, SieveRuntime};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing tracing subscriber")?;

    let config = RuntimeConfig::from_env().context("loading configuration")?;
    info!(
        filter_bits = config.filter.capacity_bits,
        hash_count = config.filter.hash_count,
        threshold = config.tally.report_threshold,
        interval_secs = config.tally_interval.as_secs(),
        "Starting report sieve runtime"
    );

    let url = config
        .store_url
        .clone()
        .context("SIEVE_STORE_URL must name the Redis store shared by all instances")?;
    let store = RedisStore::connect(&url, config.store_timeout)
        .await
        .with_context(|| format!("connecting to store at {}", url))?;

    let mut runtime = SieveRuntime::new(config, Arc::new(store));
    runtime.start();

    info!("Runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
