//! # Runtime Flows
//!
//! The assembled runtime: environment config, scheduled passes under the
//! lease, and publication to a directory sink shared by several instances.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::integration::fixtures::{Engine, Ledger};
    use shared_types::{FixedWindowRateLimiter, InMemoryKvStore, KeyValueStore, RateLimitConfig};
    use sieve_runtime::{
        FilesystemSink, Lease, PublishOutcome, RuntimeConfig, SchedulerConfig, SieveRuntime,
        TallyScheduler, TickOutcome,
    };
    use sv_01_bloom_filter::BloomFilterSnapshot;
    use sv_02_report_ledger::{ReportLedger, ReportLedgerApi};
    use sv_03_tally_engine::{PublicationConfig, TallyConfig, TallyEngine};

    type Scheduler = TallyScheduler<Engine, InMemoryKvStore, FilesystemSink>;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    /// One instance: its own ledger and engine over the shared store.
    fn instance(
        store: Arc<InMemoryKvStore>,
        sink: Arc<FilesystemSink>,
    ) -> (Arc<Ledger>, Scheduler) {
        let limiter = Arc::new(FixedWindowRateLimiter::new(
            store.clone(),
            RateLimitConfig::default(),
        ));
        let ledger = Arc::new(ReportLedger::new(store.clone(), limiter));
        let engine = Arc::new(TallyEngine::new(
            ledger.clone(),
            store.clone(),
            TallyConfig::default(),
        ));
        let scheduler = TallyScheduler::new(
            engine,
            store,
            Some(sink),
            SchedulerConfig {
                interval: Duration::from_secs(3600),
                lease_key: "lock:tally".to_string(),
                lease_ttl: Duration::from_secs(600),
                publication: PublicationConfig::default(),
            },
        );
        (ledger, scheduler)
    }

    fn published(dir: &std::path::Path, name: &str) -> BloomFilterSnapshot {
        let bytes = std::fs::read(dir.join(name)).unwrap();
        BloomFilterSnapshot::from_json(&bytes).unwrap()
    }

    #[test]
    fn test_config_from_environment() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("SIEVE_REPORT_THRESHOLD", "3"),
            ("SIEVE_RATE_LIMIT", "20"),
            ("SIEVE_PUBLISH_DIR", "/srv/sieve"),
            ("SIEVE_PUBLISH_PATH", "filters/{date}.json"),
        ]))
        .unwrap();

        assert_eq!(config.tally.report_threshold, 3);
        assert_eq!(config.rate_limit.limit, 20);
        assert_eq!(config.publish_dir.as_deref(), Some(std::path::Path::new("/srv/sieve")));
        assert_eq!(config.publication.path, "filters/{date}.json");
        assert_eq!(config.tally.filter.capacity_bits, 492_320);
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        assert!(RuntimeConfig::from_lookup(lookup(&[("SIEVE_TALLY_INTERVAL_SECS", "0")])).is_err());
    }

    #[tokio::test]
    async fn test_instances_share_store_and_publication() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryKvStore::new());
        let sink = Arc::new(FilesystemSink::new(dir.path()));
        let (ledger_a, scheduler_a) = instance(store.clone(), sink.clone());
        let (ledger_b, scheduler_b) = instance(store.clone(), sink);

        // reports arrive through both instances
        for i in 0..3 {
            ledger_a.ingest(&format!("a{}", i), "deadbeef").await.unwrap();
        }
        for i in 0..2 {
            ledger_b.ingest(&format!("b{}", i), "deadbeef").await.unwrap();
        }
        let first = scheduler_a.tick().await.unwrap();

        for i in 0..5 {
            ledger_b.ingest(&format!("b{}", i), "cafebabe").await.unwrap();
        }
        let second = scheduler_b.tick().await.unwrap();

        for outcome in [&first, &second] {
            assert!(matches!(
                outcome,
                TickOutcome::Completed {
                    published: Some(PublishOutcome::Published { .. }),
                    ..
                }
            ));
        }
        let filter = published(dir.path(), "bloomfilter.json")
            .into_filter(&TallyConfig::default().filter)
            .unwrap();
        assert!(filter.check("deadbeef").unwrap());
        assert!(filter.check("cafebabe").unwrap());
    }

    #[tokio::test]
    async fn test_held_lease_blocks_every_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryKvStore::new());
        let sink = Arc::new(FilesystemSink::new(dir.path()));
        let (ledger, scheduler_a) = instance(store.clone(), sink.clone());
        let (_, scheduler_b) = instance(store.clone(), sink);
        for i in 0..5 {
            ledger.ingest(&format!("r{}", i), "deadbeef").await.unwrap();
        }

        let held = Lease::acquire(store.clone(), "lock:tally", Duration::from_secs(600))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(scheduler_a.tick().await.unwrap(), TickOutcome::Skipped));
        assert!(matches!(scheduler_b.tick().await.unwrap(), TickOutcome::Skipped));
        assert_eq!(store.scard("report:deadbeef").await.unwrap(), 5);
        assert!(!dir.path().join("bloomfilter.json").exists());

        assert!(held.release().await.unwrap());
        assert!(matches!(
            scheduler_b.tick().await.unwrap(),
            TickOutcome::Completed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_runs_first_pass_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().to_string();
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("SIEVE_PUBLISH_DIR", dir_str.as_str()),
            ("SIEVE_REPORT_THRESHOLD", "2"),
        ]))
        .unwrap();
        let mut runtime = SieveRuntime::new(config, Arc::new(InMemoryKvStore::new()));
        let ledger = runtime.ledger();
        ledger.ingest("alice", "deadbeef").await.unwrap();
        ledger.ingest("bob", "deadbeef").await.unwrap();

        runtime.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        runtime.shutdown().await;

        let snapshot = published(dir.path(), "bloomfilter.json");
        let filter = snapshot
            .into_filter(&runtime.engine().config().filter)
            .unwrap();
        assert!(filter.check("deadbeef").unwrap());
        let metrics = runtime.metrics().snapshot();
        assert_eq!(metrics.runs_completed, 1);
        assert_eq!(metrics.promotions, 1);
    }
}
